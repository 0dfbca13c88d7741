//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap the upstream call with the operator-configured deadline
//! - Cancel the upstream call cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The deadline covers connect + response headers only; streamed bodies
//!   and WebSocket tunnels may outlive it
//! - No deadline configured means the call may wait indefinitely

use std::future::Future;
use std::time::Duration;

/// The deadline expired before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {limit:?} exceeded")]
pub struct DeadlineExceeded {
    pub limit: Duration,
}

/// Upstream deadline from config seconds; zero disables it.
pub fn upstream_deadline(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Await `fut`, giving up after `limit` when one is set. Dropping the
/// future on expiry closes any connection it was using.
pub async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, DeadlineExceeded> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeadlineExceeded { limit }),
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_disables_deadline() {
        assert_eq!(upstream_deadline(0), None);
        assert_eq!(upstream_deadline(3), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn expires_slow_future() {
        let limit = Duration::from_millis(20);
        let result = within(Some(limit), tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(result, Err(DeadlineExceeded { limit }));
    }

    #[tokio::test]
    async fn passes_through_without_limit() {
        assert_eq!(within(None, async { 7 }).await, Ok(7));
    }
}
