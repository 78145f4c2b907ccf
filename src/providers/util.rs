use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries a transient network operation a fixed number of times.
///
/// Runs `operation` up to `1 + retries` times, sleeping `delay_ms` between
/// attempts, and returns the first success or the last error.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(Error::from) {
            Ok(val) => return Ok(val),
            Err(err) if attempt > retries => return Err(err),
            Err(err) => {
                debug!("Attempt {attempt}/{retries} failed: {err}. Retrying...");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
