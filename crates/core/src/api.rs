//! HTTP payload shapes shared by the server handlers and the device client.
//!
//! ```text
//! POST   /transport/search          {source, destination, date?, mode, userId?}
//! GET    /transport/history/{user}
//! POST   /transport/trip/add        {userId, tripData}
//! POST   /transport/trip/sync       {userId, tripData}
//! DELETE /transport/trip/{tripId}   {userId}
//! POST   /transport/cache/clear     {mode, source?, destination?}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{TripKind, TripRecord};

/// Trip data as submitted by a client. Unknown fields are ignored, so a full
/// [`TripRecord`] is accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingTrip {
    /// Client-generated id; required for sync, optional for add.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kind: TripKind,
}

impl From<&TripRecord> for IncomingTrip {
    fn from(record: &TripRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            payload: record.payload.clone(),
            created_at: Some(record.created_at),
            kind: record.kind,
        }
    }
}

/// Body of `trip/add` and `trip/sync`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripWriteRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub trip_data: Option<IncomingTrip>,
}

/// Response of `trip/add` and `trip/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripWriteResponse {
    pub success: bool,
    pub trip: TripRecord,
    /// False when a sync found the record already stored.
    #[serde(default = "default_true")]
    pub created: bool,
    #[serde(default)]
    pub message: String,
}

fn default_true() -> bool {
    true
}

/// Response of `GET /transport/history/{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripHistory {
    pub trips: Vec<TripRecord>,
    pub count: usize,
}

/// Body of `DELETE /transport/trip/{tripId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTripRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response of `DELETE /transport/trip/{tripId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTripResponse {
    pub success: bool,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record_is_accepted_as_incoming_trip() {
        let record = TripRecord::new_local("u1", json!({"a": 1}));
        let wire = serde_json::to_value(&record).unwrap();
        let incoming: IncomingTrip = serde_json::from_value(wire).unwrap();
        assert_eq!(incoming, IncomingTrip::from(&record));
    }

    #[test]
    fn test_write_request_tolerates_missing_fields() {
        let req: TripWriteRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.user_id.is_none());
        assert!(req.trip_data.is_none());
    }
}
