//! Retry with exponential backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderError;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// How often and how patiently to retry a provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    ///
    /// Only [`ProviderError`]s that are not permanent are retried. Anything
    /// else (including unparseable output) fails immediately.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(provider_err) = err.downcast_ref::<ProviderError>() else {
                        return Err(err);
                    };
                    if provider_err.is_permanent() || attempt >= self.max_retries {
                        return Err(err);
                    }
                    if let Some(ms) = provider_err.retry_after_ms() {
                        delay = Duration::from_millis(ms).min(MAX_DELAY);
                    }
                    attempt += 1;
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying: {err}");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let value = policy
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProviderError::NetworkError("reset".into()).into())
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2, Duration::from_millis(10));

        let err = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ProviderError::Timeout(30).into())
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5, Duration::from_millis(10));

        let _ = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ProviderError::AuthenticationFailed("bad key".into()).into())
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::default();

        let _ = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("bad output"))
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_is_capped() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(1, Duration::from_millis(10));
        let started = tokio::time::Instant::now();

        let value = policy
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::RateLimited {
                        retry_after_ms: u64::MAX,
                    }
                    .into())
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "done");
        let waited = started.elapsed();
        assert!(waited >= MAX_DELAY && waited < MAX_DELAY + Duration::from_secs(1));
    }
}
