//! Cache entry with an absolute expiry.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON value readable only while `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Duration) -> Self {
        Self { value, expires_at: expiry_from(Utc::now(), ttl) }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }
}

/// `now + ttl`, saturating at the maximum representable instant.
pub fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
