//! Completion client adapters
//!
//! HTTP implementations of [`CompletionClient`] for OpenAI-compatible chat
//! completion servers and the Anthropic messages API.

mod anthropic;
mod openai;

pub use anthropic::AnthropicCompletionClient;
pub use openai::OpenAiCompletionClient;

use crate::config::FileCompletionConfig;
use nlq_application::{CompletionClient, CompletionError};
use std::sync::Arc;
use std::time::Duration;

/// TCP connection timeout.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes of an error body kept in [`CompletionError::RequestFailed`].
const ERROR_BODY_LIMIT: usize = 512;

/// Supported completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionProvider {
    OpenAi,
    Anthropic,
}

impl CompletionProvider {
    pub const NAMES: [&'static str; 2] = ["openai", "anthropic"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAi => "openai",
            CompletionProvider::Anthropic => "anthropic",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAi => "https://api.openai.com/v1",
            CompletionProvider::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAi => "OPENAI_API_KEY",
            CompletionProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::str::FromStr for CompletionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(CompletionProvider::OpenAi),
            "anthropic" => Ok(CompletionProvider::Anthropic),
            other => Err(format!("unknown completion provider '{}'", other)),
        }
    }
}

/// Resolved settings shared by both HTTP clients.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub force_json: bool,
}

impl CompletionSettings {
    /// Resolve provider defaults and the API key from `[completion]`.
    pub fn from_config(
        provider: CompletionProvider,
        config: &FileCompletionConfig,
    ) -> CompletionSettings {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string();

        let api_key = config.api_key.clone().or_else(|| {
            let var = config
                .api_key_env
                .as_deref()
                .unwrap_or(provider.default_api_key_env());
            std::env::var(var).ok().filter(|k| !k.is_empty())
        });

        CompletionSettings {
            base_url,
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            force_json: config.force_json,
        }
    }
}

/// Build the client selected by `[completion] provider`.
pub fn build_completion_client(
    config: &FileCompletionConfig,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let provider: CompletionProvider = config
        .provider
        .parse()
        .map_err(CompletionError::Configuration)?;
    let settings = CompletionSettings::from_config(provider, config);

    let client: Arc<dyn CompletionClient> = match provider {
        CompletionProvider::OpenAi => Arc::new(OpenAiCompletionClient::new(settings)?),
        CompletionProvider::Anthropic => Arc::new(AnthropicCompletionClient::new(settings)?),
    };
    Ok(client)
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .map_err(|e| CompletionError::Configuration(format!("HTTP client: {}", e)))
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::ConnectionError(e.to_string())
    }
}

/// Turn a non-2xx response into [`CompletionError::RequestFailed`].
async fn status_error(response: reqwest::Response) -> CompletionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CompletionError::RequestFailed {
        status,
        message: nlq_domain::util::truncate_str(body.trim(), ERROR_BODY_LIMIT).to_string(),
    }
}
