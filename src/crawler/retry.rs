//! Bounded retry with linear backoff
//!
//! Wraps one page's full acquire/navigate/extract sequence. The backoff
//! is linear rather than exponential: for a human-triggered batch crawl
//! the total wait per page stays bounded at
//! `base_delay * max_retries * (max_retries + 1) / 2`.

use crate::PageError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry policy for one page's pipeline
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempt budget: the first try plus `max_retries` retries
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry attempt `n` (1-based): `base_delay * n`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Lifecycle of one page through the retried pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Pending,
    Acquiring,
    Extracting,
    Succeeded,
    Retrying,
    Abandoned,
}

/// Terminal outcome of a retried page pipeline
#[derive(Debug)]
pub enum PageOutcome<T> {
    /// The pipeline succeeded within the attempt budget
    Succeeded(T),

    /// Every attempt failed; the page contributes zero records
    Abandoned { attempts: u32, last_error: PageError },

    /// Cancellation was observed before a terminal state
    Cancelled,
}

/// Runs an operation under the retry policy
///
/// The operation is invoked with a 0-based attempt index. Backoff sleeps
/// and in-flight attempts are both raced against the cancellation token,
/// so a cancelled crawl stops without waiting out its backoff.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> PageOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PageError>>,
{
    let mut last_error: Option<PageError> = None;

    for attempt in 0..policy.max_attempts() {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            tracing::debug!(attempt, ?delay, phase = ?PagePhase::Retrying, "backing off before retry");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PageOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PageOutcome::Cancelled,
            result = op(attempt) => result,
        };

        match result {
            Ok(value) => return PageOutcome::Succeeded(value),
            Err(error) => {
                tracing::warn!(attempt, error = %error, "page attempt failed");
                last_error = Some(error);
            }
        }
    }

    PageOutcome::Abandoned {
        attempts: policy.max_attempts(),
        last_error: last_error.expect("retry loop runs at least one attempt"),
    }
}
