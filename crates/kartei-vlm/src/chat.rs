//! Chat-completions provider
//!
//! Talks to OpenAI-compatible `chat/completions` endpoints (OpenRouter,
//! OpenWebUI) with a single user message holding the instruction text and
//! the card image as a base64 data URL.
//!
//! # Examples
//!
//! ```no_run
//! use kartei_vlm::{ChatCompletionsProvider, ProviderConfig};
//!
//! let provider = ChatCompletionsProvider::new(ProviderConfig::default(), "sk-...").unwrap();
//! // provider.complete(prompt, &image).await
//! ```

use crate::{ImageInput, VisionProvider, VlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default chat-completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default vision model
pub const DEFAULT_MODEL: &str = "qwen/qwen3-vl-8b-instruct";

/// Default timeout for one request (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection and sampling settings for the inference API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Full URL of the chat-completions endpoint
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!("endpoint '{}' is not an http(s) URL", self.endpoint));
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        Ok(())
    }
}

/// Provider for chat-completion style vision APIs
pub struct ChatCompletionsProvider {
    config: ProviderConfig,
    api_key: String,
    client: reqwest::Client,
}

/// Request body for the chat-completions API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Response from the chat-completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsProvider {
    /// Create a provider; the API key is sent as a bearer token
    pub fn new(config: ProviderConfig, api_key: impl Into<String>) -> Result<Self, VlmError> {
        config.validate().map_err(VlmError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    /// Provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, prompt: &'a str, image: &ImageInput) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl VisionProvider for ChatCompletionsProvider {
    async fn complete(&self, prompt: &str, image: &ImageInput) -> Result<String, VlmError> {
        let body = self.request_body(prompt, image);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VlmError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VlmError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!(status = status.as_u16(), bytes = text.len(), "VLM response received");

        if !status.is_success() {
            return Err(VlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        message_content(&text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Server-provided error message (`error.message`), or the raw body
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Extract `choices[0].message.content` from a success body
pub fn message_content(body: &str) -> Result<String, VlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| VlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| VlmError::MissingPayload("no 'choices' content in API response".to_string()))
}
