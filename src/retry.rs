//! Retry with exponential backoff around calls to external systems.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Something that can wait.
///
/// The sync loop and [`RetryPolicy`] never call `tokio::time::sleep`
/// directly, so tests can record delays instead of waiting them out.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// How often, and how patiently, a failing call is retried.
///
/// Attempts are counted from 0. After attempt `i` fails the policy waits
/// `base_delay * 2^i`, so the defaults (5 attempts, 1s) wait 1, 2, 4 and 8
/// seconds before giving up on the fifth failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay after the failed attempt number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// On exhaustion the error from the last attempt is returned unchanged.
    pub async fn run<T, F, Fut, S>(&self, name: &str, sleeper: &S, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        S: Sleeper + ?Sized,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!("{name} succeeded on attempt {}", attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) if attempt + 1 >= max_attempts => {
                    tracing::error!("{name} failed after {max_attempts} attempts: {e:#}");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{name} failed (attempt {}/{max_attempts}), retrying in {delay:?}: {e:#}",
                        attempt + 1
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_for() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..5).map(|i| policy.delay_for(i).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);

        // Large attempt numbers saturate instead of overflowing
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[tokio::test]
    async fn test_succeeds_after_three_failures() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let value = RetryPolicy::default()
            .run("flaky", &sleeper, move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                    anyhow::bail!("connection refused");
                }
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.total(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = RetryPolicy::default()
            .run("always failing", &sleeper, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("connection refused"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_first_success_does_not_sleep() {
        let sleeper = RecordingSleeper::new();
        let value = RetryPolicy::default()
            .run("ok", &sleeper, || async { Ok("done") })
            .await
            .unwrap();

        assert_eq!(value, "done");
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = RetryPolicy::new(0, Duration::from_secs(1))
            .run("once", &sleeper, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("boom"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
