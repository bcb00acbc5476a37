//! Anthropic messages API client.

use super::{CompletionSettings, build_http, status_error, transport_error};
use async_trait::async_trait;
use nlq_application::{CompletionClient, CompletionError};
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicCompletionClient {
    http: reqwest::Client,
    settings: CompletionSettings,
    api_key: String,
    name: String,
}

impl AnthropicCompletionClient {
    /// Fails with `Configuration` when no API key could be resolved.
    pub fn new(settings: CompletionSettings) -> Result<Self, CompletionError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            CompletionError::Configuration(
                "Anthropic API key not found (set ANTHROPIC_API_KEY or completion.api_key)"
                    .to_string(),
            )
        })?;
        let http = build_http(settings.timeout)?;
        Ok(Self {
            http,
            api_key,
            name: format!("anthropic:{}", settings.model),
            settings,
        })
    }

    fn request_body<'a>(&'a self, system_prompt: &'a str, user_text: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: user_text,
            }],
        }
    }
}

/// Concatenate the text blocks of a messages response.
fn parse_response(body: &str) -> Result<String, CompletionError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("messages body: {}", e)))?;
    Ok(response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join(""))
}

#[async_trait]
impl CompletionClient for AnthropicCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.settings.base_url);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(system_prompt, user_text))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::test_server::serve_once;
    use std::time::Duration;

    fn settings(base_url: &str, api_key: Option<&str>) -> CompletionSettings {
        CompletionSettings {
            base_url: base_url.to_string(),
            model: "claude-3-5-haiku-latest".into(),
            api_key: api_key.map(String::from),
            temperature: 0.0,
            max_tokens: 512,
            timeout: Duration::from_secs(5),
            force_json: true,
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            AnthropicCompletionClient::new(settings("http://x", None)),
            Err(CompletionError::Configuration(_))
        ));
    }

    #[test]
    fn test_request_body_puts_system_prompt_at_top_level() {
        let client = AnthropicCompletionClient::new(settings("http://x", Some("k"))).unwrap();
        let body = serde_json::to_value(client.request_body("catalog...", "low stock")).unwrap();
        assert_eq!(body["system"], "catalog...");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["content"], "low stock");
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"{\"collection\":"},{"type":"text","text":"\"user\"}"}]}"#;
        assert_eq!(parse_response(body).unwrap(), r#"{"collection":"user"}"#);
        assert_eq!(parse_response(r#"{"content":[]}"#).unwrap(), "");
    }

    #[tokio::test]
    async fn test_complete_sends_headers() {
        let (base_url, request) =
            serve_once(200, r#"{"content":[{"type":"text","text":"{}"}]}"#).await;
        let client = AnthropicCompletionClient::new(settings(&base_url, Some("ak"))).unwrap();

        assert_eq!(client.complete("sys", "q").await.unwrap(), "{}");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /v1/messages"));
        assert!(request.contains("x-api-key: ak"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
    }
}
