//! Domain model shared by the device client and the server.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Transport category; each one owns an independent server-side cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    #[serde(rename = "flights")]
    Flights,
    #[serde(rename = "trains")]
    Trains,
    #[serde(rename = "buses")]
    Buses,
    /// Cars, called `4wheelers` on the wire.
    #[serde(rename = "4wheelers")]
    Cars,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] =
        [TransportMode::Flights, TransportMode::Trains, TransportMode::Buses, TransportMode::Cars];

    /// Wire name, also used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Flights => "flights",
            TransportMode::Trains => "trains",
            TransportMode::Buses => "buses",
            TransportMode::Cars => "4wheelers",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flights" => Ok(TransportMode::Flights),
            "trains" => Ok(TransportMode::Trains),
            "buses" => Ok(TransportMode::Buses),
            "4wheelers" | "cars" => Ok(TransportMode::Cars),
            other => Err(Error::InvalidInput(format!("invalid mode: {other}"))),
        }
    }
}

/// A validated transport search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub source: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub mode: TransportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response body of `POST /transport/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<Value>,
    pub cached: bool,
    pub count: usize,
    /// Milliseconds spent producing the response.
    pub response_time: u64,
    pub trip_id: Option<String>,
}

/// Where a trip record was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Local,
    Remote,
}

/// Whether the remote store has acknowledged a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Pending,
    Synced,
}

/// Saved trips are created by the user; search trips are recorded by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripKind {
    #[default]
    Saved,
    Search,
}

/// A trip record. Identity is the `(user_id, id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub kind: TripKind,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl TripRecord {
    /// Create a fresh, unsynced record owned by this device.
    pub fn new_local(user_id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: new_trip_id(),
            user_id: user_id.into(),
            payload,
            created_at: Utc::now(),
            kind: TripKind::Saved,
            origin: Origin::Local,
            sync_state: SyncState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.sync_state == SyncState::Pending
    }

    /// `pending -> synced`. A synced record stays synced.
    pub fn mark_synced(&mut self) {
        self.sync_state = SyncState::Synced;
    }

    /// Re-label a record as the remote copy.
    pub fn into_remote(mut self) -> Self {
        self.origin = Origin::Remote;
        self.sync_state = SyncState::Synced;
        self
    }
}

/// Client-generated trip id: creation millis plus a random suffix.
pub fn new_trip_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), random_suffix(9))
}

/// Device user id in the `user_<millis>_<random>` form.
pub fn new_user_id() -> String {
    format!("user_{}_{}", Utc::now().timestamp_millis(), random_suffix(9))
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// Reject identifiers that are empty or would break `user/trip` scoping.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }
    if value.contains('/') {
        return Err(Error::InvalidInput(format!("{field} must not contain '/'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(serde_json::to_value(TransportMode::Cars).unwrap(), json!("4wheelers"));
        assert_eq!("FLIGHTS".parse::<TransportMode>().unwrap(), TransportMode::Flights);
        assert_eq!(" 4wheelers ".parse::<TransportMode>().unwrap(), TransportMode::Cars);
        assert!("boats".parse::<TransportMode>().is_err());
    }

    #[test]
    fn test_new_local_record_is_pending() {
        let record = TripRecord::new_local("u1", json!({"a": 1}));
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.origin, Origin::Local);
        assert!(record.is_pending());
        assert_eq!(record.kind, TripKind::Saved);
    }

    #[test]
    fn test_trip_ids_are_unique() {
        let a = new_trip_id();
        let b = new_trip_id();
        assert_ne!(a, b);
        assert!(new_user_id().starts_with("user_"));
    }

    #[test]
    fn test_record_wire_shape() {
        let mut record = TripRecord::new_local("u1", json!({"flight": "AI 101"}));
        record.mark_synced();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["syncState"], "synced");
        assert_eq!(value["origin"], "local");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_record_defaults_when_fields_missing() {
        let record: TripRecord = serde_json::from_value(json!({
            "id": "1",
            "userId": "u1",
            "createdAt": "2025-09-07T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.sync_state, SyncState::Pending);
        assert_eq!(record.origin, Origin::Local);
        assert_eq!(record.payload, Value::Null);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("userId", "u1").is_ok());
        assert!(validate_identifier("userId", "  ").is_err());
        assert!(validate_identifier("userId", "a/b").is_err());
    }
}
