//! Kartei VLM Provider Layer
//!
//! Vision-language model access for card extraction.
//!
//! # Architecture
//!
//! This crate defines the `VisionProvider` trait: one request carrying
//! instruction text plus an embedded image, answered with the model's raw
//! text content. Response interpretation (fence stripping, schema checks)
//! belongs to `kartei-extractor`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted replies for testing
//! - `ChatCompletionsProvider`: Chat-completion style HTTP API (OpenRouter, OpenWebUI)
//!
//! # Retry
//!
//! `RetryPolicy` is a generic attempt loop with linear backoff usable around
//! any fallible async operation.
//!
//! # Examples
//!
//! ```
//! use kartei_vlm::{ImageInput, MockProvider, VisionProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new(r#"{"Titel": "Lied"}"#);
//! let image = ImageInput::from_bytes(b"\xff\xd8", "image/jpeg");
//! let content = provider.complete("prompt", &image).await.unwrap();
//! assert_eq!(content, r#"{"Titel": "Lied"}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod image;
pub mod retry;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use chat::{ChatCompletionsProvider, ProviderConfig};
pub use image::ImageInput;
pub use retry::{RetryOutcome, RetryPolicy};

/// Errors that can occur during one VLM request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VlmError {
    /// Network or connection failure, including timeouts
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided message, or the raw body
        message: String,
    },

    /// Response arrived but carried no message content
    #[error("Missing payload: {0}")]
    MissingPayload(String),

    /// Response body was not the expected JSON envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Card image could not be read
    #[error("Image error: {0}")]
    Image(String),

    /// Provider could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A vision-language model answering an instruction about one image
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Send the prompt and image, returning the raw message content
    async fn complete(&self, prompt: &str, image: &ImageInput) -> Result<String, VlmError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str {
        "vlm"
    }
}

#[async_trait]
impl<P: VisionProvider + ?Sized> VisionProvider for Arc<P> {
    async fn complete(&self, prompt: &str, image: &ImageInput) -> Result<String, VlmError> {
        (**self).complete(prompt, image).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock provider for deterministic testing
///
/// Replies are consumed from a script in call order; once the script is
/// exhausted every call returns the fallback reply. Clones share the
/// script and the call counter.
///
/// # Examples
///
/// ```
/// use kartei_vlm::{ImageInput, MockProvider, VisionProvider, VlmError};
///
/// # async fn example() {
/// let provider = MockProvider::new("{}");
/// provider.push_error(VlmError::Transport("connection reset".into()));
///
/// let image = ImageInput::from_bytes(b"img", "image/jpeg");
/// assert!(provider.complete("p", &image).await.is_err());
/// assert_eq!(provider.complete("p", &image).await.unwrap(), "{}");
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    fallback: Result<String, VlmError>,
    script: Arc<Mutex<VecDeque<Result<String, VlmError>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a provider answering every call with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_fallback(Ok(response.into()))
    }

    /// Create a provider that fails every call with `error`
    pub fn failing(error: VlmError) -> Self {
        Self::with_fallback(Err(error))
    }

    fn with_fallback(fallback: Result<String, VlmError>) -> Self {
        Self {
            fallback,
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue a successful reply
    pub fn push_response(&self, response: impl Into<String>) {
        self.script_lock().push_back(Ok(response.into()));
    }

    /// Queue a failed reply
    pub fn push_error(&self, error: VlmError) {
        self.script_lock().push_back(Err(error));
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the call counter
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }

    fn script_lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, VlmError>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl VisionProvider for MockProvider {
    async fn complete(&self, _prompt: &str, _image: &ImageInput) -> Result<String, VlmError> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        match self.script_lock().pop_front() {
            Some(reply) => reply,
            None => self.fallback.clone(),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
