//! Bounded retry with exponential backoff for the requisition step.

use std::future::Future;
use std::time::Duration;

use labhub_config::RequisitionSettings;
use labhub_core::HubError;
use tracing::{info, warn};

/// Attempt budget and wait schedule.
///
/// Attempt 1 waits `initial_delay`, giving the hub time to prepare the
/// documents. Retry `n` waits `base_delay * 2^(n-1)`. Nothing is awaited
/// after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RequisitionSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
        }
    }

    /// Policy without waits, for callers that already paced the hub.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            initial_delay: Duration::ZERO,
        }
    }

    /// Wait before the 1-based `attempt`, or `None` past the budget.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        match attempt {
            0 => None,
            a if a > self.max_attempts => None,
            1 => Some(self.initial_delay),
            a => {
                let factor = 2u32.saturating_pow(a - 2);
                Some(self.base_delay.saturating_mul(factor))
            }
        }
    }
}

/// Result of a retried operation. Exhaustion is a value, not an error.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: HubError },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget runs out. Waits are `tokio::time::sleep` suspension points.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, HubError>>,
{
    let mut attempt = 1;
    loop {
        if let Some(delay) = policy.delay_before(attempt)
            && !delay.is_zero()
        {
            tokio::time::sleep(delay).await;
        }

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Succeeded after retry");
                }
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                };
            }
            Err(e) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    category = %e.category(),
                    error = %e,
                    "Attempt failed"
                );
                if !e.is_retryable() || attempt >= policy.max_attempts {
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn assert_elapsed(started: Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_before(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_before(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_before(4), None);
        assert_eq!(policy.delay_before(0), None);
    }

    #[test]
    fn test_from_settings() {
        let settings = RequisitionSettings {
            max_attempts: 5,
            base_delay_ms: 250,
            initial_delay_ms: 0,
            ..Default::default()
        };
        let policy = RetryPolicy::from_settings(&settings);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_before(5), Some(Duration::from_millis(2000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_http_errors_exhaust_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let counter = calls.clone();
        let outcome: RetryOutcome<()> =
            retry_with_backoff(&RetryPolicy::default(), "requisition", move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(HubError::http(503, "not ready"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.status(), Some(503));
            }
            RetryOutcome::Succeeded { .. } => panic!("expected exhaustion"),
        }
        // initial wait, then 2s and 4s between attempts, nothing after the last
        assert_elapsed(started, Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let started = Instant::now();
        let outcome = retry_with_backoff(&RetryPolicy::default(), "requisition", |attempt| async move {
            if attempt == 1 {
                Err(HubError::http(500, "busy"))
            } else {
                Ok("requisition-1-2.pdf")
            }
        })
        .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 2);
        assert_elapsed(started, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let outcome: RetryOutcome<()> =
            retry_with_backoff(&RetryPolicy::default(), "requisition", move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(HubError::parse("orderSupportDocuments is missing or empty", "{}"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts(), 1);
    }
}
