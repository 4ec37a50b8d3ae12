//! Driven port for the AI chat-completion service.

use async_trait::async_trait;

use crate::domain::CompletionPrompt;

use super::define_port_error;

define_port_error! {
    /// Errors raised by completion adapters.
    pub enum AdvisoryAssistantError {
        /// The completion request failed or returned a non-2xx status.
        Request { message: String } => "completion request failed: {message}",
        /// No API key is configured.
        Unavailable { message: String } => "completion service unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvisoryAssistant: Send + Sync {
    /// Send `prompt` and return the first choice's content, if any.
    async fn complete(
        &self,
        prompt: &CompletionPrompt,
    ) -> Result<Option<String>, AdvisoryAssistantError>;
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAdvisoryAssistant;

#[async_trait]
impl AdvisoryAssistant for FixtureAdvisoryAssistant {
    async fn complete(
        &self,
        _prompt: &CompletionPrompt,
    ) -> Result<Option<String>, AdvisoryAssistantError> {
        Err(AdvisoryAssistantError::unavailable(
            "completion API key is not configured",
        ))
    }
}
