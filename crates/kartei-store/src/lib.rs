//! Kartei Storage Layer
//!
//! File-based persistence for extraction results.
//!
//! # Architecture
//!
//! - `Table`: an in-memory CSV table read and written as UTF-8 with a BOM,
//!   the format every dataset and fragment uses
//! - `JsonArtifactSink`: one pretty-printed JSON file per successful card,
//!   implementing the `ResultSink` trait from `kartei-domain`
//! - `BatchWriter`: serializes a batch's successful records to a retry
//!   fragment with the fixed leading column order
//!
//! All writes go through a temporary sibling file followed by a rename, so a
//! rerun replaces earlier output whole and an interrupted write never leaves
//! a truncated file behind.
//!
//! # Examples
//!
//! ```no_run
//! use kartei_store::Table;
//!
//! let table = Table::read_csv("output_batches/metadata_vlm_complete.csv").unwrap();
//! println!("{} rows, {} columns", table.len(), table.headers().len());
//! ```

#![warn(missing_docs)]

mod artifact;
mod fragment;
mod table;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use artifact::JsonArtifactSink;
pub use fragment::BatchWriter;
pub use table::{Table, UTF8_BOM};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data that cannot be stored as requested
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write `bytes` to `path` via a temporary sibling and a rename
///
/// Parent directories are created as needed.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidData(format!("not a file path: {}", path.display())))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
