//! Kartei Reconciler
//!
//! Folds retry fragments back into the master dataset and combines batch
//! tables into a single file.
//!
//! # Overview
//!
//! - **Merge**: master rows first, then every `*_RETRY.csv` fragment in
//!   lexicographic order; the last row per key wins
//! - **Safety**: the master is never written; it is copied to a backup
//!   once, and the result goes to a separate output file
//! - **Combine**: concatenate all batch tables of a directory, sorted by
//!   batch and filename, without deduplication
//! - **Reports**: row accounting, fill rates per column, file sizes and
//!   consistency checks
//!
//! # Usage
//!
//! ```no_run
//! use kartei_reconciler::{combine_batches, ReconcileConfig, Reconciler};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), kartei_reconciler::ReconcileError> {
//! let report = Reconciler::new(ReconcileConfig::default())?.run()?;
//! println!("{}", report.summary());
//!
//! let combined = combine_batches(
//!     Path::new("output_batches/csv"),
//!     Path::new("output_batches/metadata_combined.csv"),
//! )?;
//! println!("{} rows", combined.total_rows);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [reconcile]
//! csv_dir = "output_batches/csv/retry"
//! master_file = "metadata_vlm_complete.csv"
//! output_file = "metadata_vlm_complete_UPDATED.csv"
//! backup_file = "metadata_vlm_complete_BACKUP.csv"
//! fragment_suffix = "_RETRY"
//! key_column = "Datei"
//! ```

#![warn(missing_docs)]

mod combine;
mod config;
mod error;
mod merge;
mod reconciler;
mod report;

pub use combine::combine_batches;
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use merge::{deduplicate, merge_tables, remaining_duplicates, Deduplicated};
pub use reconciler::Reconciler;
pub use report::{column_fills, ColumnFill, CombineReport, LoadedFile, MergeReport, SkippedFile};
