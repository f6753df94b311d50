//! Retry logic for transient storage failures.
//!
//! Automatic retry with exponential backoff. Opt-in at the call site; the
//! resolution engine itself never retries (recomputation after a transient
//! failure is the caller's decision).

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Execute a storage operation with automatic retry on transient failures.
///
/// Backoff doubles per attempt starting at 100ms. Non-transient errors
/// (constraint violations, bad input) are returned immediately.
pub async fn execute_with_retry<F, Fut, T>(mut f: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retriable_error(&e) => {
                let backoff_ms = 100_u64 * 2_u64.pow(attempt - 1);
                warn!(
                    "Storage operation failed (attempt {}/{}): {}. Retrying in {}ms",
                    attempt, max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Check if a storage error is likely transient
fn is_retriable_error(e: &anyhow::Error) -> bool {
    let err_str = e.to_string().to_lowercase();

    err_str.contains("connection")
        || err_str.contains("timeout")
        || err_str.contains("broken pipe")
        // PostgreSQL transient conditions
        || err_str.contains("could not serialize")
        || err_str.contains("deadlock detected")
        || err_str.contains("too many clients")
        || err_str.contains("server closed the connection")
}
