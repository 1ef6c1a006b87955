//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid record schema in the configuration
    #[error("Schema error: {0}")]
    Schema(#[from] kartei_domain::SchemaError),

    /// Provider setup error
    #[error("Provider error: {0}")]
    Vlm(#[from] kartei_vlm::VlmError),

    /// Extractor setup error
    #[error("Extractor error: {0}")]
    Extractor(#[from] kartei_extractor::ExtractorError),

    /// Retry run error
    #[error("Retry error: {0}")]
    Pipeline(#[from] kartei_pipeline::PipelineError),

    /// Merge or combine error
    #[error("Merge error: {0}")]
    Reconcile(#[from] kartei_reconciler::ReconcileError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
