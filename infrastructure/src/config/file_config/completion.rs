//! Completion configuration from TOML (`[completion]` section)

use serde::{Deserialize, Serialize};

/// Raw completion provider configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCompletionConfig {
    /// Provider: "openai" (any OpenAI-compatible server) or "anthropic".
    pub provider: String,
    /// Model name sent with each request.
    pub model: String,
    /// Override for the provider's base URL (e.g. a local llama.cpp server).
    pub base_url: Option<String>,
    /// Environment variable holding the API key (default depends on provider).
    pub api_key_env: Option<String>,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Ask OpenAI-compatible servers for a JSON object response.
    pub force_json: bool,
}

impl Default for FileCompletionConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key_env: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 60,
            force_json: true,
        }
    }
}
