//! OpenAI-compatible chat-completion adapter implementing the
//! `AdvisoryAssistant` port (OpenRouter by default).

mod http_client;

pub use http_client::{
    CompletionHttpClient, CompletionSettings, DEFAULT_COMPLETION_ENDPOINT, DEFAULT_COMPLETION_MODEL,
};
