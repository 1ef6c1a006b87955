//! Kartei Retry Pipeline
//!
//! Re-extracts the cards a previous run logged as failed.
//!
//! # Overview
//!
//! The pipeline is responsible for:
//! - **Work selection**: parsing the failure log and resolving each
//!   `(batch, filename)` reference to an existing image
//! - **Bounded concurrency**: one task per card, at most `max_workers` in
//!   flight, one batch at a time
//! - **Aggregation**: a single collecting loop owns all counters, writes
//!   per-card artifacts and builds the batch
//! - **Progress**: periodic status lines with throughput and ETA
//! - **Fragments**: one `<batch>_RETRY.csv` per batch with successes
//!
//! # Architecture
//!
//! ```text
//! vlm_errors.log → FailureLogParser → WorkItemResolver → ExtractionPool → BatchWriter
//!                                                              ↓
//!                                                       JsonArtifactSink
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use kartei_domain::FieldSchema;
//! use kartei_extractor::{CardExtractor, ExtractorConfig};
//! use kartei_pipeline::{shutdown_on_ctrl_c, PipelineConfig, RetryRunner};
//! use kartei_vlm::{ChatCompletionsProvider, ProviderConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ChatCompletionsProvider::new(ProviderConfig::default(), "sk-...")?;
//!     let extractor = CardExtractor::new(
//!         provider,
//!         Arc::new(FieldSchema::default()),
//!         &ExtractorConfig::default(),
//!     )?;
//!     let runner = RetryRunner::new(extractor, PipelineConfig::default())?;
//!
//!     // Runs until done or Ctrl+C
//!     let summary = runner.run(shutdown_on_ctrl_c()).await?;
//!     println!("{} of {} cards recovered", summary.succeeded(), summary.submitted());
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [pipeline]
//! input_dir = "jpeg_output"
//! output_root = "output_batches"
//! max_workers = 5
//! progress_interval_secs = 5
//! progress_every = 10
//! image_extensions = ["jpg"]
//! fragment_suffix = "_RETRY"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod failure_log;
mod pool;
mod progress;
mod resolver;
mod runner;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use failure_log::{reference_count, FailureIndex, FailureLogParser};
pub use pool::{BatchRun, ExtractionPool};
pub use progress::{format_hms, BatchSummary, ProgressSnapshot, ProgressTracker};
pub use resolver::{BatchPlan, MissingReference, WorkItemResolver, WorkPlan};
pub use runner::{shutdown_on_ctrl_c, BatchOutcome, RetryRunner, RunSummary};
