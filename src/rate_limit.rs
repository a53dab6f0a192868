//! Minimum-interval limiter for outbound API calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Serializes callers so that consecutive calls are at least `min_interval` apart.
///
/// Waiting happens with `sleep_until`, so only the task that called
/// [`RateLimiter::acquire`] is suspended. Callers queue on the mutex in
/// arrival order.
pub struct RateLimiter {
    min_interval: Duration,
    /// When the last call was let through. Never moves backwards.
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call is allowed, then record it. Returns the instant the
    /// caller was released.
    pub async fn acquire(&self) -> Instant {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if Instant::now() < ready_at {
                debug!("Rate limited, waiting {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last_call = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let first = limiter.acquire().await;
        let second = limiter.acquire().await;
        assert!(second - first >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50)));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        for pair in released.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
    }
}
