//! Merge and combine reports

use chrono::{DateTime, Local};
use kartei_store::Table;
use std::path::PathBuf;

/// Non-blank share of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFill {
    /// Column name
    pub name: String,
    /// Non-blank cells
    pub filled: usize,
    /// Rows in the table
    pub rows: usize,
}

impl ColumnFill {
    /// Fill rate in percent
    pub fn percent(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.filled as f64 / self.rows as f64 * 100.0
        }
    }
}

/// Fill numbers for every column of a table, skipping `exclude`
pub fn column_fills(table: &Table, exclude: &[&str]) -> Vec<ColumnFill> {
    table
        .headers()
        .iter()
        .filter(|name| !exclude.contains(&name.as_str()))
        .map(|name| ColumnFill {
            name: name.clone(),
            filled: table.filled_count(name).unwrap_or(0),
            rows: table.len(),
        })
        .collect()
}

/// A table that was loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// File path
    pub path: PathBuf,
    /// Data rows
    pub rows: usize,
}

/// A table that could not be parsed and was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File path
    pub path: PathBuf,
    /// Parse or read error
    pub message: String,
}

/// Everything a merge did
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// When the merge ran
    pub created_at: DateTime<Local>,

    /// Master dataset read
    pub master_path: PathBuf,
    /// Merged dataset written
    pub output_path: PathBuf,
    /// Backup location
    pub backup_path: PathBuf,
    /// The backup was made by this run (false: it already existed)
    pub backup_created: bool,

    /// Fragments merged, in merge order
    pub fragments: Vec<LoadedFile>,
    /// Fragments that could not be parsed
    pub skipped: Vec<SkippedFile>,

    /// Rows in the master
    pub master_rows: usize,
    /// Rows concatenated before deduplication
    pub combined_rows: usize,
    /// Distinct keys occurring more than once
    pub duplicate_keys: usize,
    /// Rows in the merged output
    pub final_rows: usize,

    /// Column used as key
    pub key_column: String,
    /// The preferred key column was missing
    pub key_fallback: bool,

    /// Fill numbers per output column
    pub columns: Vec<ColumnFill>,

    /// Master size in bytes
    pub master_size: u64,
    /// Output size in bytes
    pub output_size: u64,

    /// Duplicate keys still present in the output (0 unless something is wrong)
    pub remaining_duplicates: usize,
    /// Expected columns missing from the output
    pub missing_columns: Vec<String>,
}

impl MergeReport {
    /// Rows contributed by fragments
    pub fn fragment_rows(&self) -> usize {
        self.fragments.iter().map(|f| f.rows).sum()
    }

    /// Rows dropped as duplicates
    pub fn rows_removed(&self) -> usize {
        self.combined_rows - self.final_rows
    }

    /// Output rows minus master rows
    pub fn net_gain(&self) -> i64 {
        self.final_rows as i64 - self.master_rows as i64
    }

    /// Net gain relative to the master, in percent
    pub fn net_gain_percent(&self) -> Option<f64> {
        if self.master_rows == 0 {
            None
        } else {
            Some(self.net_gain() as f64 / self.master_rows as f64 * 100.0)
        }
    }

    /// Output size minus master size, in bytes
    pub fn size_delta(&self) -> i64 {
        self.output_size as i64 - self.master_size as i64
    }

    /// No duplicates left and every expected column present
    pub fn is_clean(&self) -> bool {
        self.remaining_duplicates == 0 && self.missing_columns.is_empty()
    }

    /// Generate a plain-text summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Merge Summary".to_string(),
            "=============".to_string(),
            format!("Master:        {:>8}", self.master_rows),
            format!("Fragments:     {:>8} ({} files)", self.fragment_rows(), self.fragments.len()),
            format!("Combined:      {:>8}", self.combined_rows),
            format!("Duplicates:    {:>8} ({} keys)", self.rows_removed(), self.duplicate_keys),
            format!("Final:         {:>8}", self.final_rows),
        ];
        match self.net_gain_percent() {
            Some(percent) => lines.push(format!("Net gain:      {:>8} ({:+.1}%)", self.net_gain(), percent)),
            None => lines.push(format!("Net gain:      {:>8}", self.net_gain())),
        }
        lines.push(String::new());

        if self.key_fallback {
            lines.push(format!("Key column fallback: '{}'", self.key_column));
        }
        if !self.skipped.is_empty() {
            lines.push(format!("Skipped fragments: {}", self.skipped.len()));
            for skipped in &self.skipped {
                lines.push(format!("  {}: {}", skipped.path.display(), skipped.message));
            }
        }

        lines.push(format!(
            "Size: {:.2} MB -> {:.2} MB ({:+.2} MB)",
            megabytes(self.master_size),
            megabytes(self.output_size),
            self.size_delta() as f64 / (1024.0 * 1024.0)
        ));
        lines.push(format!(
            "Backup: {} ({})",
            self.backup_path.display(),
            if self.backup_created { "created" } else { "already present" }
        ));
        lines.push(format!("Created: {}", self.created_at.format("%Y-%m-%d %H:%M:%S")));

        lines.join("\n")
    }
}

/// Everything a combine did
#[derive(Debug, Clone)]
pub struct CombineReport {
    /// Combined table written
    pub output_path: PathBuf,
    /// Tables combined, in order
    pub files: Vec<LoadedFile>,
    /// Tables that could not be parsed
    pub skipped: Vec<SkippedFile>,
    /// Rows written
    pub total_rows: usize,
    /// Distinct values of the batch column, if present
    pub batches: Option<usize>,
    /// Fill numbers of every non-identity column
    pub columns: Vec<ColumnFill>,
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
