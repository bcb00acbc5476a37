//! Completion client port
//!
//! Defines the interface for asking a language model to turn a request into
//! query text. The output is untrusted: it may be empty, fenced, chatty or
//! simply wrong, and the use case treats it accordingly.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while requesting a completion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout")]
    Timeout,
}

impl CompletionError {
    /// Whether a caller-side retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::ConnectionError(_) | CompletionError::Timeout => true,
            CompletionError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            CompletionError::InvalidResponse(_) | CompletionError::Configuration(_) => false,
        }
    }
}

/// Text-in/text-out completion function.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Identifier for logs, e.g. `openai:gpt-4o-mini`
    fn name(&self) -> &str;

    /// Return the model's free-form answer to `user_text` under `system_prompt`
    async fn complete(&self, system_prompt: &str, user_text: &str)
    -> Result<String, CompletionError>;
}
