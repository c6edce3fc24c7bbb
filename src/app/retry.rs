use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::app::ports::ExtractionError;
use crate::common::constants::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_RETRIES};
use crate::observability::metrics::IngestMetrics;

/// Bounded exponential backoff for calls to the extraction services
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failed one
    pub retries: u32,
    /// Wait after the first failed attempt; doubles after each further failure
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: Duration) -> Self {
        Self { retries, initial_delay }
    }

    /// Total calls made when every attempt fails transiently
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before the attempt following `failed_attempt` (1-based)
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }
}

/// Run `operation` until it succeeds, fails terminally, or the retries run out.
///
/// Only transient failures are retried. The last error is returned as-is.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ExtractionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        IngestMetrics::extraction_attempt();

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying: {}",
                    err
                );
                IngestMetrics::extraction_retry();
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                warn!(operation = operation_name, attempt, "Giving up: {}", err);
                IngestMetrics::extraction_failure();
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_transient_failures_stop_after_three_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry("test", &fast_policy(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExtractionError::from_status(503, "busy"))
        })
        .await;

        // one initial call plus three retries
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert!(matches!(result, Err(ExtractionError::Transient { status: Some(503), .. })));
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry("test", &fast_policy(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExtractionError::from_status(400, "bad request"))
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry("test", &fast_policy(), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(ExtractionError::from_status(429, "slow down"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let _ = with_retry("test", &policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ExtractionError::from_status(500, "down"))
        })
        .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
