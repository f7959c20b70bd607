//! Bounded backoff for transient store failures.

use std::future::Future;
use std::time::Duration;

use sediment_core::error::DomainError;

/// Attempts per store call, including the first.
pub const MAX_STORE_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each subsequent one.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// Runs `op`, retrying transient `StoreUnavailable` failures with
/// exponential backoff up to [`MAX_STORE_ATTEMPTS`]. All other errors
/// (conflicts, validation) pass through untouched on the first try.
///
/// The closure rebuilds its future each attempt, so an append retried
/// here reuses the same envelopes — and the same commit id, which is
/// what makes an I/O retry idempotent at the store.
///
/// # Errors
///
/// The last `StoreUnavailable` once attempts are exhausted, or the first
/// non-transient error.
pub async fn with_backoff<T, F, Fut>(op_name: &str, mut op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut delay = INITIAL_BACKOFF;

    for attempt in 1..=MAX_STORE_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < MAX_STORE_ATTEMPTS => {
                tracing::warn!(
                    op = op_name,
                    attempt,
                    ?delay,
                    "store unavailable, backing off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the final attempt")
}
