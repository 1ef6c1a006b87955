//! Error types for the Extractor

use kartei_vlm::VlmError;
use thiserror::Error;

/// Errors that can occur during one extraction attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    /// VLM request failed (transport, HTTP status, missing payload)
    #[error(transparent)]
    Vlm(#[from] VlmError),

    /// Response content is not a JSON object matching the schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Parse(format!("JSON parse error: {}", e))
    }
}
