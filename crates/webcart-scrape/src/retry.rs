//! Retry utilities for transient load failures.
//!
//! Page loads go through [`retry_with_backoff`], which retries only errors
//! flagged retryable by [`ScrapeError::is_retryable`]. Deterministic errors
//! (bad selectors, malformed JSON, 404s) are propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// Ceiling on a single backoff sleep, regardless of attempt count.
const MAX_BACKOFF_SECS: u64 = 60;

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retryable error the function sleeps for
/// `backoff_base_secs * 2^attempt` seconds (capped at [`MAX_BACKOFF_SECS`])
/// and tries again, up to `max_retries` additional attempts after the first
/// try. If all retries are exhausted the last error is returned.
///
/// Non-retryable errors are returned immediately without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_secs = backoff_base_secs
            .saturating_mul(1u64 << attempt.min(62))
            .min(MAX_BACKOFF_SECS);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient load error, retrying after backoff"
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

    fn transient() -> ScrapeError {
        ScrapeError::PageLoad {
            url: "https://shop.example.com/p/1".to_string(),
            reason: "timed out".to_string(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScrapeError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_error_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(transient())
                } else {
                    Ok::<u32, ScrapeError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
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
                Err::<u32, ScrapeError>(transient())
            }
        })
        .await;
        // max_retries=2 means 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScrapeError::PageLoad { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_deterministic_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScrapeError>(ScrapeError::NotFound {
                    url: "https://shop.example.com/gone".to_string(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScrapeError::NotFound { .. })));
    }
}
