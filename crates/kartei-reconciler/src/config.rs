//! Reconciler configuration

use kartei_domain::FILENAME_COLUMN;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File layout of a merge
///
/// The master, the merged output, the backup and all fragments live in one
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Directory holding master and fragments
    pub csv_dir: PathBuf,

    /// Master dataset file name
    pub master_file: String,

    /// Merged output file name
    pub output_file: String,

    /// One-time backup of the master
    pub backup_file: String,

    /// Fragments are the files named `*<fragment_suffix>.csv`
    pub fragment_suffix: String,

    /// Preferred deduplication key column
    pub key_column: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("output_batches/csv/retry"),
            master_file: "metadata_vlm_complete.csv".to_string(),
            output_file: "metadata_vlm_complete_UPDATED.csv".to_string(),
            backup_file: "metadata_vlm_complete_BACKUP.csv".to_string(),
            fragment_suffix: "_RETRY".to_string(),
            key_column: FILENAME_COLUMN.to_string(),
        }
    }
}

impl ReconcileConfig {
    /// Full path of the master dataset
    pub fn master_path(&self) -> PathBuf {
        self.csv_dir.join(&self.master_file)
    }

    /// Full path of the merged output
    pub fn output_path(&self) -> PathBuf {
        self.csv_dir.join(&self.output_file)
    }

    /// Full path of the backup
    pub fn backup_path(&self) -> PathBuf {
        self.csv_dir.join(&self.backup_file)
    }

    /// Whether a file name denotes a fragment
    pub fn is_fragment_name(&self, name: &str) -> bool {
        name.strip_suffix(".csv")
            .and_then(|stem| stem.strip_suffix(self.fragment_suffix.as_str()))
            .is_some_and(|batch| !batch.is_empty())
            && name != self.master_file
            && name != self.output_file
            && name != self.backup_file
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let names = [
            ("master_file", &self.master_file),
            ("output_file", &self.output_file),
            ("backup_file", &self.backup_file),
        ];
        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(format!("{} must not be empty", field));
            }
            if name.contains(['/', '\\']) {
                return Err(format!("{} must be a plain file name, got '{}'", field, name));
            }
        }
        if self.master_file == self.output_file || self.master_file == self.backup_file {
            return Err("master_file must differ from output_file and backup_file".to_string());
        }
        if self.output_file == self.backup_file {
            return Err("output_file and backup_file must differ".to_string());
        }
        if self.fragment_suffix.is_empty() {
            return Err("fragment_suffix must not be empty".to_string());
        }
        if self.key_column.trim().is_empty() {
            return Err("key_column must not be empty".to_string());
        }
        Ok(())
    }
}
