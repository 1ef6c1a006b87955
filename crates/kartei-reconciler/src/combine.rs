//! Concatenate every batch table of a directory into one dataset

use crate::report::{column_fills, CombineReport, LoadedFile, SkippedFile};
use crate::ReconcileError;
use kartei_domain::{BATCH_COLUMN, FILENAME_COLUMN};
use kartei_store::Table;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Combine all `*.csv` files in `csv_dir` into `output`
///
/// Files are read in lexicographic order; unparseable ones are skipped and
/// reported. Rows are sorted by batch and filename when a batch column
/// exists. No deduplication happens here. `output` is never read as an
/// input, even when it lives in `csv_dir`. Subdirectories such as the
/// `retry/` fragment directory are not descended into.
pub fn combine_batches(csv_dir: &Path, output: &Path) -> Result<CombineReport, ReconcileError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(csv_dir).map_err(|e| ReconcileError::io(csv_dir, e))? {
        let path = entry.map_err(|e| ReconcileError::io(csv_dir, e))?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        if is_csv && path.is_file() && !same_file(&path, output) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut tables = Vec::new();
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        match Table::read_csv(&path) {
            Ok(table) => {
                info!(file = %path.display(), rows = table.len(), "Table loaded");
                files.push(LoadedFile {
                    path,
                    rows: table.len(),
                });
                tables.push(table);
            }
            Err(e) => {
                error!(file = %path.display(), "Skipping unreadable table: {}", e);
                skipped.push(SkippedFile {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    if tables.is_empty() {
        return Err(ReconcileError::NoInputs(csv_dir.to_path_buf()));
    }

    let mut combined = Table::concat(&tables);
    let batches = combined.column_index(BATCH_COLUMN).map(|index| {
        combined.sort_by_columns(&[BATCH_COLUMN, FILENAME_COLUMN]);
        combined
            .rows()
            .iter()
            .map(|row| row[index].as_str())
            .collect::<HashSet<_>>()
            .len()
    });

    combined.write_csv(output)?;
    info!(path = %output.display(), rows = combined.len(), "Combined dataset written");

    Ok(CombineReport {
        output_path: output.to_path_buf(),
        files,
        skipped,
        total_rows: combined.len(),
        batches,
        columns: column_fills(&combined, &[FILENAME_COLUMN, BATCH_COLUMN]),
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => absolute(a) == absolute(b),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
