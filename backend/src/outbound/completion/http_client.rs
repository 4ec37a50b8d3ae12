//! Reqwest-backed chat-completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::CompletionPrompt;
use crate::domain::ports::{AdvisoryAssistant, AdvisoryAssistantError};

pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "mistralai/mistral-7b-instruct:free";

pub struct CompletionSettings {
    pub api_key: Zeroizing<String>,
    pub endpoint: Url,
    pub model: String,
}

pub struct CompletionHttpClient {
    client: Client,
    settings: CompletionSettings,
}

impl CompletionHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: CompletionSettings, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn chat_request<'a>(model: &'a str, prompt: &'a CompletionPrompt) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
    }
}

/// First choice's content, if the provider returned one.
fn first_content(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}

#[async_trait]
impl AdvisoryAssistant for CompletionHttpClient {
    async fn complete(
        &self,
        prompt: &CompletionPrompt,
    ) -> Result<Option<String>, AdvisoryAssistantError> {
        let response = self
            .client
            .post(self.settings.endpoint.clone())
            .bearer_auth(self.settings.api_key.as_str())
            .json(&chat_request(&self.settings.model, prompt))
            .send()
            .await
            .map_err(|error| AdvisoryAssistantError::request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(160).collect();
            return Err(AdvisoryAssistantError::request(format!(
                "status {}: {preview}",
                status.as_u16()
            )));
        }
        let decoded: ChatResponse = response.json().await.map_err(|error| {
            AdvisoryAssistantError::request(format!("invalid completion payload: {error}"))
        })?;
        Ok(first_content(decoded))
    }
}
