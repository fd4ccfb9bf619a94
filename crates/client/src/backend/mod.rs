//! HTTP client for the TripBuddy server.
//!
//! Covers the transport search endpoint and the trip endpoints used by the
//! sync reconciler. Searches are gated by a local [`TokenBucket`]; trip calls
//! are not, since they are already best-effort.

pub mod error;
pub mod limiter;

pub use error::BackendError;
pub use limiter::TokenBucket;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tripbuddy_core::api::{DeleteTripRequest, IncomingTrip, TripHistory, TripWriteRequest, TripWriteResponse};
use tripbuddy_core::{AppConfig, SearchRequest, SearchResponse, TripRecord};
use url::Url;

use crate::trips::remote::{PushOutcome, RemoteTrips};

/// TripBuddy server client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    limiter: Arc<TokenBucket>,
}

impl BackendClient {
    /// Build a client from the loaded configuration.
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| BackendError::Network(Arc::new(e)))?;

        let limiter = Arc::new(TokenBucket::new(config.rate_limit, config.rate_limit_window()));
        Ok(Self { http, base_url: normalize_base(&config.backend_url)?, limiter })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let start = Instant::now();

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "backend response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error::classify(status, &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Run a transport search.
    ///
    /// Fails fast with [`BackendError::RateLimited`] when the local budget is spent.
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, BackendError> {
        if !self.limiter.try_acquire() {
            tracing::warn!(mode = %req.mode, "search rate limit reached");
            return Err(BackendError::RateLimited);
        }
        self.send(Method::POST, "transport/search", Some(req)).await
    }

    /// Upload a trip through the dedup-safe sync endpoint.
    pub async fn push(&self, record: &TripRecord) -> Result<TripWriteResponse, BackendError> {
        let body =
            TripWriteRequest { user_id: Some(record.user_id.clone()), trip_data: Some(IncomingTrip::from(record)) };
        self.send(Method::POST, "transport/trip/sync", Some(&body)).await
    }

    /// Trips the server holds for `user_id`.
    pub async fn fetch(&self, user_id: &str) -> Result<Vec<TripRecord>, BackendError> {
        let path = format!("transport/history/{}", encode_segment(user_id));
        let history: TripHistory = self.send(Method::GET, &path, None::<&()>).await?;
        Ok(history.trips)
    }

    pub async fn delete(&self, user_id: &str, trip_id: &str) -> Result<(), BackendError> {
        let path = format!("transport/trip/{}", encode_segment(trip_id));
        let body = DeleteTripRequest { user_id: Some(user_id.to_string()) };
        let _: serde_json::Value = self.send(Method::DELETE, &path, Some(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteTrips for BackendClient {
    async fn push(&self, record: &TripRecord) -> Result<PushOutcome, BackendError> {
        let response = BackendClient::push(self, record).await?;
        Ok(if response.created { PushOutcome::Created } else { PushOutcome::AlreadyExists })
    }

    async fn fetch(&self, user_id: &str) -> Result<Vec<TripRecord>, BackendError> {
        BackendClient::fetch(self, user_id).await
    }

    async fn delete(&self, user_id: &str, trip_id: &str) -> Result<(), BackendError> {
        BackendClient::delete(self, user_id, trip_id).await
    }
}

/// Parse the base URL and make sure relative joins append to its path.
fn normalize_base(raw: &str) -> Result<Url, BackendError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| BackendError::InvalidUrl(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Percent-encode one path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        let config = AppConfig { backend_url: base.into(), rate_limit: 1, ..Default::default() };
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = normalize_base("https://api.tripbuddy.app/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.tripbuddy.app/v1/");
        assert_eq!(url.join("transport/search").unwrap().as_str(), "https://api.tripbuddy.app/v1/transport/search");
    }

    #[test]
    fn test_base_url_root() {
        let url = normalize_base("http://127.0.0.1:5000").unwrap();
        assert_eq!(url.join("transport/history/u1").unwrap().as_str(), "http://127.0.0.1:5000/transport/history/u1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(normalize_base("not a url"), Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("user_1_abc"), "user_1_abc");
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_search_fails_fast_when_budget_spent() {
        // Nothing listens on port 9; the first request fails on the network, the second never leaves.
        let client = client("http://127.0.0.1:9");
        let req = SearchRequest {
            source: "DEL".into(),
            destination: "BOM".into(),
            date: None,
            mode: tripbuddy_core::TransportMode::Flights,
            user_id: None,
        };

        let first = client.search(&req).await;
        assert!(!matches!(first, Err(BackendError::RateLimited)));

        let second = client.search(&req).await;
        assert!(matches!(second, Err(BackendError::RateLimited)));
    }
}
