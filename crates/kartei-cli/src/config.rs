//! Configuration management for the CLI.
//!
//! One TOML file carries every component's settings:
//!
//! ```toml
//! [provider]
//! model = "qwen/qwen3-vl-8b-instruct"
//!
//! [extractor]
//! max_retries = 3
//!
//! [pipeline]
//! max_workers = 5
//!
//! [reconcile]
//! csv_dir = "output_batches/csv/retry"
//!
//! [schema]
//! fields = ["Komponist", "Signatur", "Titel"]
//! priority = ["Signatur", "Komponist"]
//! ```
//!
//! The API key never lives here; it comes from `--api-key` or
//! `KARTEI_API_KEY`.

use crate::error::{CliError, Result};
use kartei_domain::{FieldSchema, FieldSpec};
use kartei_extractor::ExtractorConfig;
use kartei_pipeline::PipelineConfig;
use kartei_reconciler::ReconcileConfig;
use kartei_vlm::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "kartei.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Inference endpoint settings
    pub provider: ProviderConfig,

    /// Retry budget and prompt settings
    pub extractor: ExtractorConfig,

    /// Retry run layout and concurrency
    pub pipeline: PipelineConfig,

    /// Merge file layout
    pub reconcile: ReconcileConfig,

    /// Custom record schema; the archive default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaConfig>,
}

/// Record schema section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Field names in output order
    pub fields: Vec<String>,

    /// The two fields leading the tabular output
    pub priority: [String; 2],

    /// Optional prompt hint per field
    #[serde(default)]
    pub hints: BTreeMap<String, String>,
}

impl AppConfig {
    /// Get the per-user configuration file path.
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kartei").join("config.toml"))
    }

    /// Find the file to load: explicit path, then `kartei.toml`, then the
    /// per-user file. An explicit path must exist.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Ok(Some(local));
        }
        Ok(Self::user_path().filter(|path| path.is_file()))
    }

    /// Load configuration; built-in defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match Self::locate(explicit)? {
            Some(path) => {
                let contents = fs::read_to_string(&path)?;
                Ok((Self::from_toml(&contents)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let sections = [
            ("provider", self.provider.validate()),
            ("extractor", self.extractor.validate()),
            ("pipeline", self.pipeline.validate()),
            ("reconcile", self.reconcile.validate()),
        ];
        for (name, result) in sections {
            result.map_err(|e| CliError::Config(format!("[{}] {}", name, e)))?;
        }
        self.schema()?;
        Ok(())
    }

    /// Record schema in effect.
    pub fn schema(&self) -> Result<FieldSchema> {
        let Some(section) = &self.schema else {
            return Ok(FieldSchema::default());
        };

        if let Some(unknown) = section.hints.keys().find(|name| !section.fields.contains(name)) {
            return Err(CliError::Config(format!(
                "[schema] hint for unknown field '{}'",
                unknown
            )));
        }

        let specs = section
            .fields
            .iter()
            .map(|name| FieldSpec {
                name: name.clone(),
                hint: section.hints.get(name).cloned(),
            })
            .collect();
        let [first, second] = &section.priority;
        Ok(FieldSchema::from_specs(specs, [first.as_str(), second.as_str()])?)
    }
}
