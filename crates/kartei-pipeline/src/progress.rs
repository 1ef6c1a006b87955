//! Progress accounting for one batch
//!
//! Owned by the pool's collecting loop; worker tasks never touch it.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters at one point of a batch run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Cards finished so far
    pub processed: usize,
    /// Cards in the batch
    pub total: usize,
    /// Successful cards so far
    pub succeeded: usize,
    /// Failed cards so far
    pub failed: usize,
    /// Time since the batch started
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Throughput in cards per minute; 0 before any time has passed
    pub fn rate_per_minute(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs * 60.0
        } else {
            0.0
        }
    }

    /// Remaining time extrapolated from the average so far
    pub fn eta(&self) -> Duration {
        if self.processed == 0 {
            return Duration::ZERO;
        }
        let remaining = self.total.saturating_sub(self.processed);
        self.elapsed.div_f64(self.processed as f64).mul_f64(remaining as f64)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] | ✓ {} | ✗ {} | {:.1}/min | ETA: {}",
            self.processed,
            self.total,
            self.succeeded,
            self.failed,
            self.rate_per_minute(),
            format_hms(self.eta())
        )
    }
}

/// Final numbers of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Batch name
    pub batch_id: String,
    /// Cards submitted
    pub total: usize,
    /// Successful cards
    pub succeeded: usize,
    /// Failed cards
    pub failed: usize,
    /// Wall time of the batch
    pub duration: Duration,
}

impl BatchSummary {
    /// Average wall time per submitted card
    pub fn average_per_item(&self) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        self.duration.div_f64(self.total as f64)
    }

    /// Share of successful cards in percent
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: duration {} | {:.2}s per card | {}/{} succeeded ({:.1}%)",
            self.batch_id,
            format_hms(self.duration),
            self.average_per_item().as_secs_f64(),
            self.succeeded,
            self.total,
            self.success_rate()
        )
    }
}

/// Counts outcomes and decides when a progress line is due
///
/// A line is due when the report interval has passed since the last one,
/// or when the processed count reaches a multiple of `every`.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    batch_id: String,
    total: usize,
    processed: usize,
    succeeded: usize,
    failed: usize,
    started: Instant,
    last_report: Instant,
    interval: Duration,
    every: usize,
}

impl ProgressTracker {
    /// Start tracking a batch of `total` cards at `now`
    pub fn new(
        batch_id: impl Into<String>,
        total: usize,
        interval: Duration,
        every: usize,
        now: Instant,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            started: now,
            last_report: now,
            interval,
            every: every.max(1),
        }
    }

    /// Count one finished card; returns a snapshot when a report is due
    pub fn record(&mut self, success: bool, now: Instant) -> Option<ProgressSnapshot> {
        self.processed += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        let interval_due = now.saturating_duration_since(self.last_report) >= self.interval;
        let count_due = self.processed % self.every == 0;
        if interval_due || count_due {
            self.last_report = now;
            Some(self.snapshot(now))
        } else {
            None
        }
    }

    /// Current counters
    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed,
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed: now.saturating_duration_since(self.started),
        }
    }

    /// Close the batch
    pub fn finish(&self, now: Instant) -> BatchSummary {
        BatchSummary {
            batch_id: self.batch_id.clone(),
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            duration: now.saturating_duration_since(self.started),
        }
    }

    /// Close a batch cut short by shutdown; only finished cards count as
    /// submitted
    pub fn finish_interrupted(&self, now: Instant) -> BatchSummary {
        BatchSummary {
            total: self.processed,
            ..self.finish(now)
        }
    }
}

/// Render a duration as `H:MM:SS`
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(start: Instant) -> ProgressTracker {
        ProgressTracker::new("batch_001", 20, Duration::from_secs(5), 10, start)
    }

    #[test]
    fn test_report_on_count_multiple() {
        let start = Instant::now();
        let mut tracker = tracker(start);

        for i in 1..10 {
            assert!(tracker.record(true, start + Duration::from_millis(i)).is_none());
        }
        let snapshot = tracker.record(false, start + Duration::from_millis(10)).unwrap();
        assert_eq!(snapshot.processed, 10);
        assert_eq!(snapshot.succeeded, 9);
        assert_eq!(snapshot.failed, 1);
    }

    #[test]
    fn test_report_on_interval() {
        let start = Instant::now();
        let mut tracker = tracker(start);

        assert!(tracker.record(true, start + Duration::from_secs(1)).is_none());
        assert!(tracker.record(true, start + Duration::from_secs(6)).is_some());
        // Interval restarts at the last report
        assert!(tracker.record(true, start + Duration::from_secs(8)).is_none());
        assert!(tracker.record(true, start + Duration::from_secs(11)).is_some());
    }

    #[test]
    fn test_interrupted_summary_counts_finished_cards() {
        let start = Instant::now();
        let mut tracker = tracker(start);
        tracker.record(true, start);
        tracker.record(true, start);
        tracker.record(false, start);

        let summary = tracker.finish_interrupted(start + Duration::from_secs(3));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded + summary.failed, summary.total);
        assert_eq!(summary.average_per_item(), Duration::from_secs(1));
        assert_eq!(tracker.finish(start).total, 20);
    }

    #[test]
    fn test_rate_and_eta() {
        let snapshot = ProgressSnapshot {
            processed: 10,
            total: 30,
            succeeded: 8,
            failed: 2,
            elapsed: Duration::from_secs(60),
        };
        assert!((snapshot.rate_per_minute() - 10.0).abs() < 1e-9);
        assert_eq!(snapshot.eta(), Duration::from_secs(120));
        assert_eq!(
            snapshot.to_string(),
            "[10/30] | ✓ 8 | ✗ 2 | 10.0/min | ETA: 0:02:00"
        );
    }

    #[test]
    fn test_zero_elapsed_rate() {
        let snapshot = ProgressSnapshot {
            processed: 1,
            total: 2,
            succeeded: 1,
            failed: 0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(snapshot.rate_per_minute(), 0.0);
        assert_eq!(snapshot.eta(), Duration::ZERO);
    }

    #[test]
    fn test_summary() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new("batch_002", 4, Duration::from_secs(5), 10, start);
        tracker.record(true, start);
        tracker.record(true, start);
        tracker.record(true, start);
        tracker.record(false, start);

        let summary = tracker.finish(start + Duration::from_secs(8));
        assert_eq!(summary.average_per_item(), Duration::from_secs(2));
        assert_eq!(summary.success_rate(), 75.0);
        assert!(summary.to_string().contains("3/4 succeeded (75.0%)"));
    }

    #[test]
    fn test_empty_batch_summary() {
        let start = Instant::now();
        let summary = ProgressTracker::new("b", 0, Duration::from_secs(5), 10, start).finish(start);
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(summary.average_per_item(), Duration::ZERO);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_hms(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_hms(Duration::from_secs(90_000)), "25:00:00");
    }
}
