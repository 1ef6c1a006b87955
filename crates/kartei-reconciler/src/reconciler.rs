//! Merge retry fragments into the master dataset

use crate::merge::{merge_tables, remaining_duplicates};
use crate::report::{column_fills, LoadedFile, MergeReport, SkippedFile};
use crate::{ReconcileConfig, ReconcileError};
use chrono::Local;
use kartei_domain::FieldSchema;
use kartei_store::Table;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Folds retry fragments into the master dataset
///
/// Master rows come first, then fragments in lexicographic file order; the
/// last row per key wins, so retried cards replace their stale originals.
/// The master is never modified: the result goes to a separate output file
/// and the master is copied to a backup once, before the first output is
/// written.
///
/// # Examples
///
/// ```no_run
/// use kartei_reconciler::{ReconcileConfig, Reconciler};
///
/// let reconciler = Reconciler::new(ReconcileConfig::default()).unwrap();
/// let report = reconciler.run().unwrap();
/// println!("{}", report.summary());
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
    expected_columns: Vec<String>,
}

impl Reconciler {
    /// Create a reconciler expecting the default schema's leading columns
    pub fn new(config: ReconcileConfig) -> Result<Self, ReconcileError> {
        config.validate().map_err(ReconcileError::Config)?;
        Ok(Self {
            config,
            expected_columns: leading_columns(&FieldSchema::default()),
        })
    }

    /// Expect the identity and priority columns of `schema` in the output
    pub fn with_schema(mut self, schema: &FieldSchema) -> Self {
        self.expected_columns = leading_columns(schema);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Fragment files in merge order
    pub fn discover_fragments(&self) -> Result<Vec<PathBuf>, ReconcileError> {
        let dir = &self.config.csv_dir;
        let entries = fs::read_dir(dir).map_err(|e| ReconcileError::io(dir, e))?;

        let mut fragments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReconcileError::io(dir, e))?;
            let path = entry.path();
            let is_fragment = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.config.is_fragment_name(name));
            if is_fragment && path.is_file() {
                fragments.push(path);
            }
        }
        fragments.sort();
        Ok(fragments)
    }

    /// Merge, back up and write; returns the full report
    pub fn run(&self) -> Result<MergeReport, ReconcileError> {
        let master_path = self.config.master_path();
        if !master_path.is_file() {
            return Err(ReconcileError::MasterNotFound(master_path));
        }

        let fragment_paths = self.discover_fragments()?;
        if fragment_paths.is_empty() {
            return Err(ReconcileError::NoFragments {
                dir: self.config.csv_dir.clone(),
                suffix: self.config.fragment_suffix.clone(),
            });
        }
        info!(fragments = fragment_paths.len(), "Fragments found");

        let master = Table::read_csv(&master_path)?;
        info!(rows = master.len(), "Master loaded");

        let mut tables = Vec::new();
        let mut loaded = Vec::new();
        let mut skipped = Vec::new();
        for path in fragment_paths {
            match Table::read_csv(&path) {
                Ok(table) => {
                    info!(fragment = %path.display(), rows = table.len(), "Fragment loaded");
                    loaded.push(LoadedFile {
                        path,
                        rows: table.len(),
                    });
                    tables.push(table);
                }
                Err(e) => {
                    error!(fragment = %path.display(), "Skipping unreadable fragment: {}", e);
                    skipped.push(SkippedFile {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        let merged = merge_tables(&master, &tables, &self.config.key_column)?;
        info!(
            combined = merged.combined_rows,
            removed = merged.rows_removed(),
            "Deduplicated on '{}'",
            merged.key_column
        );

        let backup_path = self.config.backup_path();
        let backup_created = backup_once(&master_path, &backup_path)?;

        let output_path = self.config.output_path();
        merged.table.write_csv(&output_path)?;
        info!(path = %output_path.display(), rows = merged.table.len(), "Merged dataset written");

        let missing_columns = self
            .expected_columns
            .iter()
            .filter(|column| merged.table.column_index(column).is_none())
            .cloned()
            .collect();

        Ok(MergeReport {
            created_at: Local::now(),
            master_size: file_size(&master_path)?,
            output_size: file_size(&output_path)?,
            master_path,
            output_path,
            backup_path,
            backup_created,
            fragments: loaded,
            skipped,
            master_rows: master.len(),
            combined_rows: merged.combined_rows,
            duplicate_keys: merged.duplicate_keys,
            final_rows: merged.table.len(),
            columns: column_fills(&merged.table, &[]),
            remaining_duplicates: remaining_duplicates(&merged.table, &merged.key_column),
            key_column: merged.key_column,
            key_fallback: merged.key_fallback,
            missing_columns,
        })
    }
}

fn leading_columns(schema: &FieldSchema) -> Vec<String> {
    schema
        .column_order()
        .into_iter()
        .take(4)
        .map(str::to_string)
        .collect()
}

/// Copy the master to the backup unless a backup already exists
fn backup_once(master: &Path, backup: &Path) -> Result<bool, ReconcileError> {
    if backup.exists() {
        info!(path = %backup.display(), "Backup already present");
        return Ok(false);
    }
    fs::copy(master, backup).map_err(|e| ReconcileError::io(backup, e))?;
    info!(path = %backup.display(), "Backup created");
    Ok(true)
}

fn file_size(path: &Path) -> Result<u64, ReconcileError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ReconcileError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> ReconcileConfig {
        ReconcileConfig {
            csv_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_discovery_order_and_filter() {
        let dir = TempDir::new().unwrap();
        for name in [
            "batch_010_RETRY.csv",
            "batch_002_RETRY.csv",
            "batch_002.csv",
            "metadata_vlm_complete.csv",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "Datei\n").unwrap();
        }

        let reconciler = Reconciler::new(config(&dir)).unwrap();
        let names: Vec<String> = reconciler
            .discover_fragments()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["batch_002_RETRY.csv", "batch_010_RETRY.csv"]);
    }

    #[test]
    fn test_missing_master() {
        let dir = TempDir::new().unwrap();
        let result = Reconciler::new(config(&dir)).unwrap().run();
        assert!(matches!(result, Err(ReconcileError::MasterNotFound(_))));
    }

    #[test]
    fn test_no_fragments_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("metadata_vlm_complete.csv"), "Datei\na.jpg\n").unwrap();

        let result = Reconciler::new(config(&dir)).unwrap().run();

        assert!(matches!(result, Err(ReconcileError::NoFragments { .. })));
        assert!(!dir.path().join("metadata_vlm_complete_UPDATED.csv").exists());
        assert!(!dir.path().join("metadata_vlm_complete_BACKUP.csv").exists());
    }

    #[test]
    fn test_leading_columns_follow_schema() {
        let schema = FieldSchema::new(["Titel", "Verlag", "Material"], ["Verlag", "Titel"]).unwrap();
        assert_eq!(leading_columns(&schema), vec!["Datei", "Batch", "Verlag", "Titel"]);
    }
}
