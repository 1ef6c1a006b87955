//! Error types for merge operations

use kartei_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a merge or combine
///
/// An unparseable fragment is not among them: it is reported and skipped.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The master dataset does not exist
    #[error("Master dataset not found: {0}")]
    MasterNotFound(PathBuf),

    /// Nothing to merge into the master
    #[error("No fragments matching '*{suffix}.csv' in {dir}")]
    NoFragments {
        /// Directory searched
        dir: PathBuf,
        /// Fragment name suffix
        suffix: String,
    },

    /// No table could be loaded for combining
    #[error("No loadable CSV files in {0}")]
    NoInputs(PathBuf),

    /// Table without any column, so no key can be chosen
    #[error("Table has no columns")]
    NoColumns,

    /// Reading or writing a table failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Filesystem error outside table I/O (listing, backup, sizes)
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReconcileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReconcileError::Io {
            path: path.into(),
            source,
        }
    }
}
