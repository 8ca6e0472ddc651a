use crate::core::error::ValuationError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation while it fails with a transient error
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay`: Pause between attempts
///
/// # Returns
/// Either the successful result or the last error. Errors that are not
/// transient are returned immediately.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay: Duration,
) -> Result<T, ValuationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ValuationError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if !err.is_transient() || attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt,
                    retries + 1,
                    err
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Bounds a provider call; running out of time counts as the provider being unavailable.
pub async fn with_timeout<T>(
    provider: &str,
    limit: Duration,
    call: impl Future<Output = Result<T, ValuationError>>,
) -> Result<T, ValuationError> {
    tokio::time::timeout(limit, call).await.map_err(|_| {
        ValuationError::unavailable(provider, format!("timed out after {}ms", limit.as_millis()))
    })?
}
