//! Fare providers behind one search seam.
//!
//! Flights come from the RapidAPI fare search when a key is configured.
//! Trains, buses and cars are served from static route tables.

pub mod error;
pub mod flights;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use tripbuddy_core::{AppConfig, SearchRequest, TransportMode};

pub use error::FareError;
pub use flights::{FlightFareClient, FlightFareConfig};

/// Source of fare results for a validated search.
///
/// Upstream failures degrade to an empty list; they never fail the request.
#[async_trait]
pub trait FareSource: Send + Sync {
    async fn search(&self, req: &SearchRequest) -> Vec<Value>;
}

/// Dispatches searches to the provider for each transport mode.
#[derive(Debug, Clone)]
pub struct Fares {
    flights: Option<FlightFareClient>,
    max_results: usize,
}

impl Fares {
    pub fn new(flights: Option<FlightFareClient>, max_results: usize) -> Self {
        Self { flights, max_results }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let flights = match FlightFareConfig::from_app(config).and_then(FlightFareClient::new) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "flight fare API disabled; flight searches return no results");
                None
            }
        };
        Self::new(flights, config.max_results)
    }

    async fn flights(&self, req: &SearchRequest) -> Vec<Value> {
        let Some(client) = &self.flights else {
            return Vec::new();
        };
        match client
            .search(&req.source, &req.destination, req.date.as_deref(), self.max_results)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, source = %req.source, destination = %req.destination, "flight search failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl FareSource for Fares {
    async fn search(&self, req: &SearchRequest) -> Vec<Value> {
        let mut results = match req.mode {
            TransportMode::Flights => self.flights(req).await,
            TransportMode::Trains => mock::trains(&req.source, &req.destination, req.date.as_deref()),
            TransportMode::Buses => mock::buses(&req.source, &req.destination),
            TransportMode::Cars => mock::cars(&req.source, &req.destination),
        };
        results.truncate(self.max_results);
        results
    }
}
