//! Per-client budget for failed search requests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tripbuddy_core::AppConfig;

/// Body of the 429 reply once a client has used up its budget.
pub const SEARCH_LIMIT_MESSAGE: &str = "Too many flight search requests - please try again in 1 hour.";

#[derive(Debug)]
struct Window {
    failures: u32,
    started: Instant,
}

/// Fixed-window counter of unsuccessful searches, keyed by client address.
///
/// Successful searches are free. Once a client has failed `max_failures`
/// times inside one window, further searches are refused until the window
/// ends.
#[derive(Debug)]
pub struct SearchLimiter {
    max_failures: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl SearchLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self { max_failures, window, clients: Mutex::new(HashMap::new()) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.search_rate_limit, config.search_rate_limit_window())
    }

    /// Whether `client` may search right now.
    pub fn allows(&self, client: &str) -> bool {
        let clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        match clients.get(client) {
            Some(w) if w.started.elapsed() < self.window => w.failures < self.max_failures,
            _ => true,
        }
    }

    /// Count one unsuccessful search against `client`.
    pub fn record_failure(&self, client: &str) {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        clients.retain(|_, w| now.duration_since(w.started) < self.window);

        let entry = clients.entry(client.to_owned()).or_insert(Window { failures: 0, started: now });
        entry.failures = entry.failures.saturating_add(1);
        tracing::debug!(client, failures = entry.failures, "search failure counted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_after_max_failures() {
        let limiter = SearchLimiter::new(2, Duration::from_secs(3600));
        assert!(limiter.allows("10.0.0.1"));
        limiter.record_failure("10.0.0.1");
        assert!(limiter.allows("10.0.0.1"));
        limiter.record_failure("10.0.0.1");
        assert!(!limiter.allows("10.0.0.1"));

        // other clients keep their own budget
        assert!(limiter.allows("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_window_end_restores_budget() {
        let limiter = SearchLimiter::new(1, Duration::from_millis(20));
        limiter.record_failure("c");
        assert!(!limiter.allows("c"));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.allows("c"));
        limiter.record_failure("c");
        assert!(!limiter.allows("c"));
    }
}
