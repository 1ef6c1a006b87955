//! Error types for retry pipeline operations

use kartei_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a retry run
///
/// Per-card failures are never errors; they end up in failed records.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The failure log is missing or unreadable
    #[error("Failed to read failure log {path}: {source}")]
    FailureLog {
        /// Log path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing a fragment failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
