//! Rate limiting and retry utilities shared by the retailer sources.
//!
//! Both sources impose request-rate constraints; a fixed-interval gate
//! serializes outbound calls in one place instead of ad-hoc sleeps
//! interleaved with requests. Exponential backoff covers transient HTTP
//! failures; non-retriable errors (404s, parse failures, API rejections)
//! propagate immediately.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::RetailError;

/// Fixed-interval gate: callers `wait()` before every outbound request and
/// are delayed until at least `min_interval` has passed since the previous
/// request went out.
pub struct RequestGate {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestGate {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Blocks until the minimum interval since the previous call has
    /// elapsed, then records the current instant. The lock is held across
    /// the sleep so concurrent callers queue rather than stampede.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Returns `true` if `err` represents a transient condition worth retrying
/// after a backoff delay.
fn is_retriable(err: &RetailError) -> bool {
    matches!(
        err,
        RetailError::RateLimited { .. } | RetailError::Http(_)
    )
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// Sleeps `backoff_base_secs * 2^attempt` between attempts, up to
/// `max_retries` retries after the first try. Non-retriable errors are
/// returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, RetailError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetailError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        // Cap the shift to keep base * 2^attempt from overflowing.
        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient retailer error — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> RetailError {
        RetailError::RateLimited {
            domain: "api.example.com".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[tokio::test]
    async fn gate_spaces_consecutive_calls() {
        let gate = RequestGate::new(Duration::from_millis(20));
        let start = std::time::Instant::now();
        gate.wait().await;
        gate.wait().await;
        gate.wait().await;
        assert!(
            start.elapsed() >= Duration::from_millis(40),
            "three calls should span at least two intervals, took {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn gate_first_call_is_immediate() {
        let gate = RequestGate::new(Duration::from_secs(60));
        let start = std::time::Instant::now();
        gate.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, RetailError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, RetailError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, RetailError>(rate_limited())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(RetailError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, RetailError>(RetailError::NotFound {
                    url: "https://example.com/product".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetailError::NotFound { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_api_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, RetailError>(RetailError::ApiError("InvalidParameterValue".to_owned()))
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetailError::ApiError(_))));
    }
}
