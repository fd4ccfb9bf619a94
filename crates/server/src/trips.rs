//! Server-side trip repository.
//!
//! Trips live in the `trips` document collection under `{userId}/{tripId}`,
//! so a lookup with another user's id never reaches the record.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tripbuddy_core::api::IncomingTrip;
use tripbuddy_core::model::{new_trip_id, validate_identifier};
use tripbuddy_core::{DocumentStore, Error, Origin, SearchRequest, SyncState, TripKind, TripRecord};

const COLLECTION: &str = "trips";

fn document_id(user_id: &str, trip_id: &str) -> String {
    format!("{user_id}/{trip_id}")
}

#[derive(Clone)]
pub struct TripRepository {
    docs: Arc<dyn DocumentStore>,
}

impl TripRepository {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    /// Saved and search trips for `user_id`, newest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<TripRecord>, Error> {
        validate_identifier("userId", user_id)?;
        let docs = self.docs.list(COLLECTION, &format!("{user_id}/")).await?;

        let mut trips: Vec<TripRecord> = docs
            .into_iter()
            .filter_map(|(id, body)| match serde_json::from_value(body) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping unreadable trip document");
                    None
                }
            })
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    /// Store a trip, assigning an id when the client sent none.
    ///
    /// Re-adding an id that is already stored returns the stored record.
    pub async fn add(&self, user_id: &str, trip: IncomingTrip) -> Result<TripRecord, Error> {
        let trip = IncomingTrip { id: Some(trip.id.unwrap_or_else(new_trip_id)), ..trip };
        let (record, _) = self.sync(user_id, trip).await?;
        Ok(record)
    }

    /// Store a client-identified trip at most once.
    ///
    /// Returns the stored record and whether this call created it.
    pub async fn sync(&self, user_id: &str, trip: IncomingTrip) -> Result<(TripRecord, bool), Error> {
        validate_identifier("userId", user_id)?;
        let trip_id = trip.id.clone().unwrap_or_default();
        validate_identifier("tripData.id", &trip_id)?;

        let record = TripRecord {
            id: trip_id.clone(),
            user_id: user_id.to_string(),
            payload: trip.payload,
            created_at: trip.created_at.unwrap_or_else(Utc::now),
            kind: trip.kind,
            origin: Origin::Remote,
            sync_state: SyncState::Synced,
        };

        let doc_id = document_id(user_id, &trip_id);
        if self.docs.create(COLLECTION, &doc_id, &serde_json::to_value(&record)?).await? {
            tracing::info!(user_id, trip_id = %trip_id, "stored trip");
            return Ok((record, true));
        }

        tracing::debug!(user_id, trip_id = %trip_id, "trip already stored");
        let existing = match self.docs.get(COLLECTION, &doc_id).await? {
            Some(body) => serde_json::from_value(body)?,
            None => record,
        };
        Ok((existing, false))
    }

    /// Delete a trip owned by `user_id`.
    pub async fn delete(&self, user_id: &str, trip_id: &str) -> Result<(), Error> {
        validate_identifier("userId", user_id)?;
        validate_identifier("tripId", trip_id)?;

        if self.docs.delete(COLLECTION, &document_id(user_id, trip_id)).await? {
            tracing::info!(user_id, trip_id, "deleted trip");
            Ok(())
        } else {
            Err(Error::NotFound("Trip not found or unauthorized".into()))
        }
    }

    /// Record a search in the user's history.
    pub async fn record_search(&self, req: &SearchRequest, results_count: usize) -> Result<TripRecord, Error> {
        let user_id = req.user_id.as_deref().unwrap_or_default();
        let trip = IncomingTrip {
            id: None,
            payload: json!({
                "source": req.source,
                "destination": req.destination,
                "date": req.date,
                "mode": req.mode,
                "resultsCount": results_count,
                "searchTime": Utc::now(),
            }),
            created_at: None,
            kind: TripKind::Search,
        };
        self.add(user_id, trip).await
    }
}
