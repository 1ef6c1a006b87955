//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kartei - recover and reconcile archive card extractions.
#[derive(Debug, Parser)]
#[command(name = "kartei")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Re-extract the cards listed in the failure log
    Retry(RetryArgs),

    /// Merge retry fragments into the master dataset
    Merge(MergeArgs),

    /// Combine all batch tables of a directory into one file
    Combine(CombineArgs),
}

/// Arguments for the retry command.
#[derive(Debug, Parser)]
pub struct RetryArgs {
    /// API key for the inference endpoint
    #[arg(long, env = "KARTEI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Failure log to read (default: <output_root>/vlm_errors.log)
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Directory holding one subdirectory of images per batch
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Root directory for JSON artifacts and CSV fragments
    #[arg(short, long)]
    pub output_root: Option<PathBuf>,

    /// Maximum concurrent requests
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Retry preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Show what would be retried without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the merge command.
#[derive(Debug, Parser)]
pub struct MergeArgs {
    /// Directory holding master and fragments (default: <output_root>/csv/retry)
    #[arg(short = 'd', long)]
    pub csv_dir: Option<PathBuf>,

    /// Master dataset file name
    #[arg(short, long)]
    pub master: Option<String>,

    /// Merged output file name
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the combine command.
#[derive(Debug, Parser)]
pub struct CombineArgs {
    /// Directory holding the batch tables (default: <output_root>/csv)
    #[arg(short = 'd', long)]
    pub csv_dir: Option<PathBuf>,

    /// Combined output file (default: <output_root>/metadata_combined.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Retry preset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Two attempts per card, for quick checks
    Fast,
    /// Five attempts with longer waits, for unstable connections
    Patient,
}

impl From<PresetArg> for kartei_extractor::ExtractorConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Fast => kartei_extractor::ExtractorConfig::fast(),
            PresetArg::Patient => kartei_extractor::ExtractorConfig::patient(),
        }
    }
}
