//! Per-card JSON artifacts

use crate::{write_atomic, StoreError};
use kartei_domain::{CardKey, CardRecord, ResultSink, BATCH_COLUMN, FILENAME_COLUMN};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one JSON file per successful card under `<root>/<batch>/<stem>.json`
///
/// The object holds the extracted fields in schema order followed by the
/// filename and batch identity. Rerunning a card overwrites its file whole.
#[derive(Debug, Clone)]
pub struct JsonArtifactSink {
    root: PathBuf,
    written: usize,
}

impl JsonArtifactSink {
    /// Create a sink writing below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: 0,
        }
    }

    /// Root directory of all artifacts
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for a card
    pub fn path_for(&self, key: &CardKey) -> PathBuf {
        self.root
            .join(&key.batch_id)
            .join(format!("{}.json", key.stem()))
    }

    /// Number of artifacts written by this sink
    pub fn written(&self) -> usize {
        self.written
    }
}

impl ResultSink for JsonArtifactSink {
    type Error = StoreError;

    fn accept(&mut self, record: &CardRecord) -> Result<(), StoreError> {
        let Some(fields) = record.fields() else {
            return Ok(());
        };

        let mut object = Map::new();
        for (name, value) in fields.iter() {
            object.insert(name.to_string(), Value::String(value.to_string()));
        }
        object.insert(
            FILENAME_COLUMN.to_string(),
            Value::String(record.key.filename.clone()),
        );
        object.insert(
            BATCH_COLUMN.to_string(),
            Value::String(record.key.batch_id.clone()),
        );

        let path = self.path_for(&record.key);
        let json = serde_json::to_string_pretty(&Value::Object(object))?;
        write_atomic(&path, json.as_bytes())?;

        self.written += 1;
        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }
}
