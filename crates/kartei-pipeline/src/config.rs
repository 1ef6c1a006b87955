//! Configuration for retry runs
//!
//! Paths, worker count and progress cadence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the retry pipeline
///
/// # Examples
///
/// ```
/// use kartei_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.max_workers, 5);
/// assert!(config.log_path().ends_with("vlm_errors.log"));
/// assert!(config.csv_dir().ends_with("csv"));
/// assert!(config.fragment_dir().ends_with("csv/retry"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root of the card images; batch `b` lives in `<input_dir>/b`
    pub input_dir: PathBuf,

    /// Root of all output (`json/`, `csv/`, failure log)
    pub output_root: PathBuf,

    /// Failure log; defaults to `<output_root>/vlm_errors.log`
    pub log_file: Option<PathBuf>,

    /// Concurrent extractions per batch
    pub max_workers: usize,

    /// Seconds between progress lines
    pub progress_interval_secs: u64,

    /// Also report after every this many processed cards
    pub progress_every: usize,

    /// Image extensions recognized in failure log lines (without dot)
    pub image_extensions: Vec<String>,

    /// Appended to the batch name to form the fragment file name
    pub fragment_suffix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("jpeg_output"),
            output_root: PathBuf::from("output_batches"),
            log_file: None,
            max_workers: 5,
            progress_interval_secs: 5,
            progress_every: 10,
            image_extensions: vec!["jpg".to_string()],
            fragment_suffix: "_RETRY".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Failure log location
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.output_root.join("vlm_errors.log"))
    }

    /// Directory of per-card JSON artifacts
    pub fn json_dir(&self) -> PathBuf {
        self.output_root.join("json")
    }

    /// Directory of the batch CSV tables
    pub fn csv_dir(&self) -> PathBuf {
        self.output_root.join("csv")
    }

    /// Directory of retry fragments, kept apart from the batch tables so
    /// that combining `csv/` never picks up fragments or merge output
    pub fn fragment_dir(&self) -> PathBuf {
        self.csv_dir().join("retry")
    }

    /// Progress interval as a Duration
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".to_string());
        }
        if self.progress_every == 0 {
            return Err("progress_every must be greater than 0".to_string());
        }
        if self.image_extensions.is_empty() {
            return Err("image_extensions must not be empty".to_string());
        }
        if let Some(ext) = self
            .image_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.'))
        {
            return Err(format!("invalid image extension '{}', give it without a dot", ext));
        }
        if self.fragment_suffix.trim().is_empty() {
            return Err("fragment_suffix must not be empty".to_string());
        }
        Ok(())
    }
}
