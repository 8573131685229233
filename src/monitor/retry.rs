// Caller-side retry policy for backend operations

use std::time::Duration;
use tokio::time::sleep;

/// Backoff schedule between attempts
#[derive(Debug, Clone)]
pub enum Backoff {
    /// Retry immediately
    Immediate,
    /// Fixed delay
    Fixed(Duration),
    /// Exponential backoff
    Exponential {
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl Backoff {
    /// Get delay before the retry following a given attempt (1-based)
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            Backoff::Immediate => Duration::from_millis(0),
            Backoff::Fixed(duration) => *duration,
            Backoff::Exponential {
                base_delay,
                max_delay,
                multiplier,
            } => {
                let delay_ms = base_delay.as_millis() as f64 * multiplier.powi(attempt as i32 - 1);
                Duration::from_millis(delay_ms as u64).min(*max_delay)
            }
        }
    }
}

/// Explicit retry wrapper around a backend call. Adapters never retry
/// internally; a caller that wants retries wraps the call in a policy so
/// attempt limits and backoff stay testable in isolation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // single attempt: retries are opt-in
        Self {
            max_attempts: 1,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run an operation until `is_done` approves its outcome or attempts
    /// run out. The last outcome is returned either way.
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        is_done: impl Fn(&T) -> bool,
        operation: F,
    ) -> T
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let mut attempt = 1;

        loop {
            let outcome = operation().await;

            if is_done(&outcome) {
                if attempt > 1 {
                    tracing::info!(
                        "operation '{}' succeeded on attempt {}",
                        operation_name,
                        attempt
                    );
                }
                return outcome;
            }

            if attempt >= self.max_attempts {
                return outcome;
            }

            let delay = self.backoff.delay(attempt);
            tracing::warn!(
                "operation '{}' failed on attempt {}, retrying in {:?}",
                operation_name,
                attempt,
                delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_until_success() {
        let policy = RetryPolicy::new(3, Backoff::Immediate);
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result = policy
            .run("test_operation", |r: &Result<&str, &str>| r.is_ok(), move || {
                let count = count.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 2 {
                        Err("simulated failure")
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("success"));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let policy = RetryPolicy::new(3, Backoff::Immediate);
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result = policy
            .run("always_failing", |r: &Result<(), &str>| r.is_ok(), move || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err("still broken")
                }
            })
            .await;

        assert_eq!(result, Err("still broken"));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let policy = RetryPolicy::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let _: Result<(), &str> = policy
            .run("single_shot", |r: &Result<(), &str>| r.is_ok(), move || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err("nope")
                }
            })
            .await;

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_backoff_delays() {
        let backoff = Backoff::Exponential {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        };

        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(400));
        assert_eq!(backoff.delay(4), Duration::from_millis(500)); // capped at max_delay
    }

    #[test]
    fn test_fixed_and_immediate_backoff() {
        let immediate = Backoff::Immediate;
        assert_eq!(immediate.delay(5), Duration::from_millis(0));

        let fixed = Backoff::Fixed(Duration::from_secs(2));
        assert_eq!(fixed.delay(1), Duration::from_secs(2));
        assert_eq!(fixed.delay(5), Duration::from_secs(2));
    }
}
