//! Retry fragments: one CSV table per batch

use crate::{StoreError, Table};
use kartei_domain::{Batch, FieldSchema, BATCH_COLUMN, FILENAME_COLUMN};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Serializes the successful records of a batch to `<dir>/<batch><suffix>.csv`
///
/// Columns follow [`FieldSchema::column_order`]. Failed records are left
/// out, and a batch without successes produces no file at all.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    dir: PathBuf,
    suffix: String,
    schema: Arc<FieldSchema>,
}

impl BatchWriter {
    /// Create a writer placing fragments in `dir`
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>, schema: Arc<FieldSchema>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            schema,
        }
    }

    /// Directory fragments are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fragment path for a batch
    pub fn fragment_path(&self, batch_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.csv", batch_id, self.suffix))
    }

    /// Tabular form of the batch's successful records
    pub fn to_table(&self, batch: &Batch) -> Table {
        let columns = self.schema.column_order();
        let mut table = Table::new(columns.iter().copied());

        for record in batch.successful() {
            let Some(fields) = record.fields() else {
                continue;
            };
            let row = columns
                .iter()
                .map(|column| match *column {
                    FILENAME_COLUMN => record.key.filename.clone(),
                    BATCH_COLUMN => record.key.batch_id.clone(),
                    name => fields.get(name).unwrap_or_default().to_string(),
                })
                .collect();
            table.push_row(row);
        }
        table
    }

    /// Write the fragment; returns `None` when the batch had no successes
    pub fn write(&self, batch: &Batch) -> Result<Option<PathBuf>, StoreError> {
        let table = self.to_table(batch);
        if table.is_empty() {
            info!(batch = batch.id(), "No successful cards, no fragment written");
            return Ok(None);
        }

        let path = self.fragment_path(batch.id());
        table.write_csv(&path)?;
        info!(
            batch = batch.id(),
            rows = table.len(),
            path = %path.display(),
            "Fragment written"
        );
        Ok(Some(path))
    }
}
