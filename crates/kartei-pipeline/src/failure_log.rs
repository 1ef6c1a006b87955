//! Failure log parsing
//!
//! The first extraction run appends one line per failed card:
//!
//! ```text
//! [2024-01-01 10:00:00] Batch: batch_003 | Datei: card_042.jpg
//! ```
//!
//! Anything else in the log (error details, blank lines) is ignored.

use crate::PipelineError;
use kartei_domain::FailureLogEntry;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Failed card references grouped by batch, both levels sorted
pub type FailureIndex = BTreeMap<String, BTreeSet<String>>;

/// Extracts failed card references from failure log text
#[derive(Debug, Clone)]
pub struct FailureLogParser {
    pattern: Regex,
}

impl FailureLogParser {
    /// Create a parser accepting file names with one of `extensions`
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, PipelineError> {
        if extensions.is_empty() {
            return Err(PipelineError::Config(
                "at least one image extension is required".to_string(),
            ));
        }
        let alternatives: Vec<String> = extensions
            .iter()
            .map(|ext| regex::escape(ext.as_ref()))
            .collect();
        let pattern = format!(
            r"\[(.*?)\]\s+Batch:\s+(\w+)\s+\|\s+Datei:\s+(.+\.(?:{}))",
            alternatives.join("|")
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| PipelineError::Config(format!("invalid failure log pattern: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Every matching line, in log order (duplicates kept)
    pub fn entries(&self, content: &str) -> Vec<FailureLogEntry> {
        self.pattern
            .captures_iter(content)
            .map(|caps| FailureLogEntry {
                timestamp: caps[1].to_string(),
                batch_id: caps[2].to_string(),
                filename: caps[3].trim().to_string(),
            })
            .collect()
    }

    /// Distinct references grouped by batch
    pub fn parse(&self, content: &str) -> FailureIndex {
        let mut index = FailureIndex::new();
        for entry in self.entries(content) {
            index.entry(entry.batch_id).or_default().insert(entry.filename);
        }
        debug!(batches = index.len(), "Failure log parsed");
        index
    }

    /// Read and parse a log file; a missing or unreadable log is fatal
    pub fn read(&self, path: impl AsRef<Path>) -> Result<FailureIndex, PipelineError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PipelineError::FailureLog {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let index = self.parse(&content);
        info!(
            path = %path.display(),
            references = reference_count(&index),
            batches = index.len(),
            "Failed cards found"
        );
        Ok(index)
    }
}

/// Total number of references in an index
pub fn reference_count(index: &FailureIndex) -> usize {
    index.values().map(BTreeSet::len).sum()
}
