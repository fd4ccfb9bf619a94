//! Client-side request budget.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    window_start: Instant,
}

/// Token bucket refilled to capacity at the start of every window.
///
/// Callers never wait: an empty bucket is reported immediately so the caller
/// can fall back to cached data.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    window: Duration,
    state: Mutex<Bucket>,
}

impl TokenBucket {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window, state: Mutex::new(Bucket { tokens: capacity, window_start: Instant::now() }) }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if now.duration_since(bucket.window_start) >= self.window {
            bucket.tokens = self.capacity;
            bucket.window_start = now;
        }

        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }

    /// Tokens left in the current window.
    pub fn available(&self) -> u32 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_then_refills() {
        let bucket = TokenBucket::new(2, Duration::from_secs(60));
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        assert_eq!(bucket.available(), 0);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!bucket.try_acquire());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(bucket.try_acquire());
        assert_eq!(bucket.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_never_grants() {
        let bucket = TokenBucket::new(0, Duration::from_secs(1));
        assert!(!bucket.try_acquire());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!bucket.try_acquire());
    }
}
