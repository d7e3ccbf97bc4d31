//! # Retry Policy
//!
//! Bounded exponential backoff for transient failures.
//!
//! ## Backoff Schedule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delay(n) = min(base * factor^n, cap)                                   │
//! │                                                                         │
//! │  Defaults: base 1s, factor 2, cap 10s, max_retries 3                    │
//! │                                                                         │
//! │  call ──fail──► wait 1s ──fail──► wait 2s ──fail──► wait 4s ──fail──►  │
//! │                                                          surface error  │
//! │                                                                         │
//! │  Retried:  Binding errors, transient transport faults                   │
//! │  Aborts:   everything else, immediately, without consuming attempts     │
//! │  Cancel:   checked between attempts and during backoff waits            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `max_retries` counts retries after the initial call: a fully failed
//! sequence makes `1 + max_retries` calls with `max_retries` waits between
//! them.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::{debug, warn};

use merchlink_core::{ConnectorError, ConnectorResult};

use crate::cancel::CancelToken;

// =============================================================================
// Policy
// =============================================================================

/// Retry policy for operations classified as transient-retriable.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base: Duration,

    /// Multiplier applied per retry.
    pub factor: f64,

    /// Upper bound on any single delay.
    pub cap: Duration,

    /// Maximum retries after the initial call (0 = no retries).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base: Duration::from_secs(1),
            factor: 2.0,
            cap: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

// =============================================================================
// Retry State
// =============================================================================

/// Attempt counter and next-delay state for one logical operation.
///
/// Scoped to a single `run` call and discarded on terminal outcome.
#[derive(Debug)]
struct RetryState {
    retries_made: u32,
    schedule: ExponentialBackoff,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        RetryState {
            retries_made: 0,
            schedule: ExponentialBackoff {
                initial_interval: policy.base,
                multiplier: policy.factor,
                max_interval: policy.cap,
                // Zero jitter keeps the schedule at exactly base * factor^n.
                randomization_factor: 0.0,
                // Attempts are bounded by count, not elapsed time.
                max_elapsed_time: None,
                ..Default::default()
            },
        }
    }

    /// Records a retry and returns the delay to wait before it.
    fn next_delay(&mut self, cap: Duration) -> Duration {
        self.retries_made += 1;
        self.schedule.next_backoff().unwrap_or(cap)
    }
}

// =============================================================================
// Executor
// =============================================================================

impl RetryPolicy {
    /// Runs `op`, retrying while it fails with a retryable error.
    ///
    /// Retries only `Binding` errors and transient `Transport` faults; any
    /// other error kind aborts immediately without consuming further
    /// attempts. The cancellation token is checked before every attempt and
    /// raced against every backoff wait; a cancelled sequence ends in the
    /// `Cancelled` outcome.
    pub async fn run<T, F, Fut>(&self, mut cancel: CancelToken, mut op: F) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let mut state = RetryState::new(self);

        loop {
            cancel.check()?;

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if state.retries_made >= self.max_retries {
                warn!(
                    retries = state.retries_made,
                    error = %err,
                    "retries exhausted"
                );
                return Err(err);
            }

            let delay = state.next_delay(self.cap);
            debug!(
                attempt = state.retries_made,
                ?delay,
                error = %err,
                "transient failure, waiting before retry"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    debug!("retry sequence cancelled during backoff");
                    return Err(ConnectorError::Cancelled);
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
