use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Connection failures and timeouts are worth another attempt; anything the
/// server actually answered is not.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Sends a request, retrying up to `retries` more times after transient
/// transport failures with `delay_ms` between attempts.
pub async fn with_retry<F, Fut, T>(
    mut send: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut failures = 0;
    loop {
        let err = match send().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if failures >= retries || !is_transient(&err) {
            return Err(err);
        }
        failures += 1;
        debug!(failures, retries, error = %err, "Request failed, retrying");
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
