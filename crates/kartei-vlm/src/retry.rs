//! Generic retry with linear backoff
//!
//! Wraps any fallible async operation. Between failed attempts the policy
//! waits `base_delay * attempt`, capped at `max_delay`, so the wait grows
//! strictly with every attempt until the cap is reached. No wait follows the
//! final attempt.
//!
//! # Examples
//!
//! ```
//! use kartei_vlm::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let policy = RetryPolicy::new(3, Duration::ZERO);
//! let outcome = policy
//!     .run(|attempt| async move {
//!         if attempt < 2 { Err("not yet") } else { Ok(attempt) }
//!     })
//!     .await;
//!
//! assert_eq!(outcome.attempts, 2);
//! assert_eq!(outcome.result, Ok(2));
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts (2 seconds)
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default cap on a single backoff wait (60 seconds)
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

/// Final result of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T, E> {
    /// First success, or the error of the final attempt
    pub result: Result<T, E>,

    /// Attempts made, between 1 and `max_attempts`
    pub attempts: u32,
}

impl RetryPolicy {
    /// Create a policy; an attempt budget of zero is raised to one
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Cap every single wait at `max_delay`
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait inserted after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt).min(self.max_delay)
    }

    /// Run `op` until it succeeds or the budget is spent
    ///
    /// `op` receives the 1-based attempt number. Intermediate failures are
    /// logged; the caller receives the final error as a value.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(error) if attempt >= self.max_attempts => {
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                    }
                }
                Err(error) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {}",
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
