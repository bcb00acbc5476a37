//! OpenAI-compatible chat completions client.
//!
//! Works against api.openai.com and local servers exposing the same
//! `/chat/completions` endpoint (llama.cpp, Ollama, vLLM).

use super::{CompletionSettings, build_http, status_error, transport_error};
use async_trait::async_trait;
use nlq_application::{CompletionClient, CompletionError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    settings: CompletionSettings,
    name: String,
}

impl OpenAiCompletionClient {
    pub fn new(settings: CompletionSettings) -> Result<Self, CompletionError> {
        let http = build_http(settings.timeout)?;
        Ok(Self {
            http,
            name: format!("openai:{}", settings.model),
            settings,
        })
    }

    fn request_body<'a>(&'a self, system_prompt: &'a str, user_text: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
            response_format: self.settings.force_json.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        }
    }
}

/// Extract the first choice's text. A missing or null message is empty text.
fn parse_response(body: &str) -> Result<String, CompletionError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("chat completion body: {}", e)))?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.settings.base_url);
        debug!("POST {}", url);

        let mut request = self
            .http
            .post(&url)
            .json(&self.request_body(system_prompt, user_text));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_response(&body)
    }
}
