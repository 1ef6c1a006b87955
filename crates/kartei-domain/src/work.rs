//! Work selection types: failure log references and resolved work items

use crate::record::CardKey;
use std::path::PathBuf;

/// One reference to a previously failed card, parsed from the failure log
///
/// Read-only input; the timestamp is kept verbatim as written in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLogEntry {
    /// Timestamp text between the leading brackets
    pub timestamp: String,

    /// Batch the card belongs to
    pub batch_id: String,

    /// Image filename
    pub filename: String,
}

impl FailureLogEntry {
    /// Card identity referenced by this entry
    pub fn key(&self) -> CardKey {
        CardKey::new(self.batch_id.clone(), self.filename.clone())
    }
}

/// A card whose image was found on disk, ready to be extracted
///
/// Transient; exists only during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Card identity
    pub key: CardKey,

    /// Resolved path of the card image
    pub path: PathBuf,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(key: CardKey, path: impl Into<PathBuf>) -> Self {
        Self {
            key,
            path: path.into(),
        }
    }
}
