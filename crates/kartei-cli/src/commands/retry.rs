//! Retry command implementation.

use super::Completion;
use crate::cli::RetryArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kartei_extractor::{CardExtractor, ExtractorConfig};
use kartei_pipeline::{shutdown_on_ctrl_c, FailureLogParser, RetryRunner, WorkItemResolver, WorkPlan};
use kartei_vlm::ChatCompletionsProvider;
use std::sync::Arc;
use tracing::info;

/// Execute the retry command.
pub async fn execute_retry(
    args: RetryArgs,
    mut config: AppConfig,
    formatter: &Formatter,
) -> Result<Completion> {
    apply_overrides(&args, &mut config);
    config.validate()?;
    let schema = Arc::new(config.schema()?);

    if args.dry_run {
        let plan = plan_only(&config)?;
        println!("{}", formatter.work_plan(&plan));
        return Ok(Completion::Done);
    }

    let api_key = require_api_key(args.api_key.as_deref())?;

    info!(
        model = %config.provider.model,
        workers = config.pipeline.max_workers,
        attempts = config.extractor.max_retries,
        "Starting retry run"
    );

    let provider = ChatCompletionsProvider::new(config.provider.clone(), api_key)?;
    let extractor = CardExtractor::new(provider, schema, &config.extractor)?;
    let runner = RetryRunner::new(extractor, config.pipeline.clone())?;

    let summary = runner.run(shutdown_on_ctrl_c()).await?;
    println!("{}", formatter.run_summary(&summary));

    Ok(if summary.interrupted {
        Completion::Interrupted
    } else {
        Completion::Done
    })
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(args: &RetryArgs, config: &mut AppConfig) {
    if let Some(preset) = args.preset {
        let preset = ExtractorConfig::from(preset);
        config.extractor.max_retries = preset.max_retries;
        config.extractor.retry_delay_secs = preset.retry_delay_secs;
        config.extractor.max_retry_delay_secs = preset.max_retry_delay_secs;
    }
    if let Some(path) = &args.log_file {
        config.pipeline.log_file = Some(path.clone());
    }
    if let Some(dir) = &args.input_dir {
        config.pipeline.input_dir = dir.clone();
    }
    if let Some(root) = &args.output_root {
        config.pipeline.output_root = root.clone();
    }
    if let Some(workers) = args.workers {
        config.pipeline.max_workers = workers;
    }
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
}

/// The credential is required and must not be blank.
fn require_api_key(key: Option<&str>) -> Result<&str> {
    match key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(CliError::Config(
            "API key missing: pass --api-key or set KARTEI_API_KEY".to_string(),
        )),
    }
}

fn plan_only(config: &AppConfig) -> Result<WorkPlan> {
    let pipeline = &config.pipeline;
    let index = FailureLogParser::new(&pipeline.image_extensions)?.read(pipeline.log_path())?;
    Ok(WorkItemResolver::new(&pipeline.input_dir).resolve(&index))
}
