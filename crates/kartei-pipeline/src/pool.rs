//! Bounded-concurrency extraction of one batch

use crate::progress::{BatchSummary, ProgressTracker};
use crate::PipelineConfig;
use kartei_domain::{Batch, CardKey, CardRecord, ResultSink, WorkItem};
use kartei_extractor::CardExtractor;
use kartei_vlm::VisionProvider;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{error, info};

/// Records and numbers of one batch run
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Records in completion order
    pub batch: Batch,

    /// Timing and success numbers; after an interrupt `total` counts only
    /// the cards that finished
    pub summary: BatchSummary,

    /// The run was stopped before every card finished
    pub interrupted: bool,
}

/// Runs the cards of one batch with at most `max_workers` in flight
///
/// Every card is its own task. Outcomes are collected in completion order
/// by a single loop, which alone updates counters, reports progress, hands
/// records to the sink and appends them to the batch.
pub struct ExtractionPool<P>
where
    P: VisionProvider + 'static,
{
    extractor: Arc<CardExtractor<P>>,
    max_workers: usize,
    progress_interval: Duration,
    progress_every: usize,
}

impl<P> ExtractionPool<P>
where
    P: VisionProvider + 'static,
{
    /// Create a pool sharing one extractor between its tasks
    pub fn new(extractor: Arc<CardExtractor<P>>, config: &PipelineConfig) -> Self {
        Self {
            extractor,
            max_workers: config.max_workers.max(1),
            progress_interval: config.progress_interval(),
            progress_every: config.progress_every,
        }
    }

    /// Shared extractor
    pub fn extractor(&self) -> &CardExtractor<P> {
        &self.extractor
    }

    /// Process every item of a batch
    ///
    /// When `shutdown` turns `true`, queued cards are never started and
    /// in-flight tasks are aborted; records that already finished are still
    /// collected. A sink failure is logged and does not stop the batch. A
    /// task that panics becomes a failed record for its card.
    pub async fn run_batch<S>(
        &self,
        batch_id: &str,
        items: Vec<WorkItem>,
        sink: &mut S,
        shutdown: &mut watch::Receiver<bool>,
    ) -> BatchRun
    where
        S: ResultSink,
        S::Error: Display,
    {
        let total = items.len();
        info!(batch = batch_id, cards = total, workers = self.max_workers, "Processing batch");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut keys = HashMap::with_capacity(total);
        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let extractor = Arc::clone(&self.extractor);
            let key = item.key.clone();
            let handle = tasks.spawn(async move {
                // A closed semaphore means the run is shutting down
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some(extractor.extract(&item).await)
            });
            keys.insert(handle.id(), key);
        }

        let mut batch = Batch::new(batch_id);
        let mut tracker = ProgressTracker::new(
            batch_id,
            total,
            self.progress_interval,
            self.progress_every,
            Instant::now(),
        );
        let mut interrupted = false;

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(joined) => self.collect(joined, &keys, &mut batch, &mut tracker, sink),
                    None => break,
                },
                Ok(_) = shutdown.wait_for(|stop| *stop), if !interrupted => {
                    info!(batch = batch_id, "Shutdown requested, abandoning in-flight cards");
                    interrupted = true;
                    semaphore.close();
                    tasks.abort_all();
                }
            }
        }

        let summary = if interrupted {
            tracker.finish_interrupted(Instant::now())
        } else {
            tracker.finish(Instant::now())
        };
        info!(
            batch = batch_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch finished. {}",
            summary
        );

        BatchRun {
            batch,
            summary,
            interrupted,
        }
    }

    fn collect<S>(
        &self,
        joined: Result<Option<CardRecord>, JoinError>,
        keys: &HashMap<task::Id, CardKey>,
        batch: &mut Batch,
        tracker: &mut ProgressTracker,
        sink: &mut S,
    ) where
        S: ResultSink,
        S::Error: Display,
    {
        let record = match joined {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                let Some(key) = keys.get(&e.id()) else {
                    error!("Worker task failed: {}", e);
                    return;
                };
                error!(card = %key, "Worker task failed: {}", e);
                CardRecord::failed(key.clone(), format!("Worker task failed: {}", e), 0, Duration::ZERO)
            }
        };

        if let Err(e) = sink.accept(&record) {
            error!(card = %record.key, "Failed to persist card artifact: {}", e);
        }

        if let Some(snapshot) = tracker.record(record.success(), Instant::now()) {
            info!(batch = batch.id(), "{}", snapshot);
        }
        batch.push(record);
    }
}
