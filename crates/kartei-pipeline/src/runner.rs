//! Batch-sequential retry driver

use crate::failure_log::FailureLogParser;
use crate::pool::ExtractionPool;
use crate::progress::{format_hms, BatchSummary};
use crate::resolver::{MissingReference, WorkItemResolver, WorkPlan};
use crate::{PipelineConfig, PipelineError};
use kartei_extractor::CardExtractor;
use kartei_store::{BatchWriter, JsonArtifactSink};
use kartei_vlm::VisionProvider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

/// Outcome of one batch within a run
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Timing and counters
    pub summary: BatchSummary,

    /// Fragment written for the batch, if any card succeeded
    pub fragment: Option<PathBuf>,
}

impl BatchOutcome {
    /// Batch name
    pub fn batch_id(&self) -> &str {
        &self.summary.batch_id
    }
}

/// Outcome of a whole retry run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Processed batches in order
    pub batches: Vec<BatchOutcome>,

    /// References skipped because their image was missing
    pub missing: Vec<MissingReference>,

    /// Wall time of the run
    pub duration: Duration,

    /// The run was stopped by a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    /// Cards submitted across batches
    pub fn submitted(&self) -> usize {
        self.batches.iter().map(|b| b.summary.total).sum()
    }

    /// Successful cards across batches
    pub fn succeeded(&self) -> usize {
        self.batches.iter().map(|b| b.summary.succeeded).sum()
    }

    /// Failed cards across batches
    pub fn failed(&self) -> usize {
        self.batches.iter().map(|b| b.summary.failed).sum()
    }
}

/// Retries the cards listed in the failure log, one batch at a time
///
/// Batch N+1 starts only after batch N's pool and fragment write have
/// completed.
pub struct RetryRunner<P>
where
    P: VisionProvider + 'static,
{
    config: PipelineConfig,
    pool: ExtractionPool<P>,
    writer: BatchWriter,
}

impl<P> RetryRunner<P>
where
    P: VisionProvider + 'static,
{
    /// Create a runner around a configured extractor
    pub fn new(extractor: CardExtractor<P>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let schema = Arc::new(extractor.schema().clone());
        let writer = BatchWriter::new(config.fragment_dir(), config.fragment_suffix.clone(), schema);
        let pool = ExtractionPool::new(Arc::new(extractor), &config);

        Ok(Self {
            config,
            pool,
            writer,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read the failure log and resolve it against the image directory
    pub fn plan(&self) -> Result<WorkPlan, PipelineError> {
        let parser = FailureLogParser::new(&self.config.image_extensions)?;
        let index = parser.read(self.config.log_path())?;
        Ok(WorkItemResolver::new(&self.config.input_dir).resolve(&index))
    }

    /// Process a plan until done or until `shutdown` turns `true`
    ///
    /// A batch cut short by shutdown still gets a fragment for the cards
    /// that finished; later batches are not started.
    pub async fn execute(
        &self,
        plan: WorkPlan,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let mut summary = RunSummary {
            missing: plan.missing,
            ..Default::default()
        };
        let mut sink = JsonArtifactSink::new(self.config.json_dir());
        let total_batches = plan.batches.len();

        for (index, batch_plan) in plan.batches.into_iter().enumerate() {
            if *shutdown.borrow() {
                summary.interrupted = true;
                break;
            }

            info!(
                "Batch {}/{}: {} ({} cards)",
                index + 1,
                total_batches,
                batch_plan.batch_id,
                batch_plan.items.len()
            );

            let run = self
                .pool
                .run_batch(&batch_plan.batch_id, batch_plan.items, &mut sink, &mut shutdown)
                .await;
            let fragment = self.writer.write(&run.batch)?;

            summary.batches.push(BatchOutcome {
                summary: run.summary,
                fragment,
            });

            if run.interrupted {
                summary.interrupted = true;
                break;
            }
        }

        summary.duration = started.elapsed();
        if summary.interrupted {
            warn!(
                batches = summary.batches.len(),
                succeeded = summary.succeeded(),
                "Retry run interrupted after {}",
                format_hms(summary.duration)
            );
        } else {
            info!(
                submitted = summary.submitted(),
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                "Retry run finished in {}",
                format_hms(summary.duration)
            );
        }
        Ok(summary)
    }

    /// Plan and execute in one go
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<RunSummary, PipelineError> {
        let plan = self.plan()?;
        if plan.is_empty() {
            info!("No failed cards to retry");
        }
        self.execute(plan, shutdown).await
    }
}

/// Shutdown flag that turns `true` on Ctrl+C
///
/// Must be called from within a tokio runtime.
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping retry run");
                let _ = tx.send(true);
            }
            Err(e) => warn!("Cannot listen for Ctrl+C: {}", e),
        }
    });
    rx
}
