//! Exponential-backoff retry for chain operations
//!
//! One attempt in flight at a time; the categorizer decides whether a
//! failure is worth retrying. When retries are exhausted the original
//! error is returned unwrapped, so the caller's own categorization still
//! sees the root cause.

use eyre::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::categorize_error;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    /// (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Backoff for the first retry; doubles on each subsequent one.
    /// No jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Backoff duration before retry number `attempt` (0-indexed):
    /// `base_delay * 2^attempt`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `operation`, retrying retryable failures with exponential backoff.
///
/// Non-retryable failures and exhausted attempts return the original
/// error immediately.
pub async fn retry_operation<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let enhanced = categorize_error(&error);

                if !enhanced.retryable || attempt >= policy.max_retries {
                    if attempt > 0 {
                        warn!(
                            attempts = attempt + 1,
                            category = %enhanced.category,
                            "Giving up after retries"
                        );
                    }
                    return Err(error);
                }

                let delay = policy.backoff_for_attempt(attempt);
                debug!(
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    ?delay,
                    category = %enhanced.category,
                    "Retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = retry_operation(&policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(eyre!("connection timeout"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two sleeps: 1000ms + 2000ms
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_retries_and_returns_original_error() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        let attempts = AtomicU32::new(0);

        let result: Result<()> = retry_operation(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(eyre!("network unreachable")) }
        })
        .await;

        // max_retries + 1 total attempts, original message intact
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(result.unwrap_err().to_string().contains("network unreachable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_fast() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<()> = retry_operation(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(eyre!("execution reverted: Not a participant")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
