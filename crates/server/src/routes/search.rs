//! `POST /transport/search`.

use std::time::Instant;

use actix_web::{HttpRequest, post, web};
use serde::Deserialize;
use tripbuddy_core::{CacheKey, SearchRequest, SearchResponse, TransportMode};

use crate::error::{ApiError, ApiResult};
use crate::limiter::SEARCH_LIMIT_MESSAGE;
use crate::state::AppState;

/// Search body as sent by clients; every field is checked by hand so that
/// missing fields produce the documented message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

impl TryFrom<SearchBody> for SearchRequest {
    type Error = ApiError;

    fn try_from(body: SearchBody) -> Result<Self, Self::Error> {
        let (Some(source), Some(destination), Some(mode)) =
            (present(body.source), present(body.destination), present(body.mode))
        else {
            return Err(ApiError::BadRequest(
                "Missing required fields: source, destination, and mode are required.".into(),
            ));
        };
        let mode: TransportMode = mode
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid mode selected.".into()))?;

        Ok(SearchRequest { source, destination, date: present(body.date), mode, user_id: present(body.user_id) })
    }
}

/// Clients that keep sending failing searches are refused with 429 for the
/// rest of the limiter window; successful searches do not count.
#[post("/search")]
pub async fn search(
    state: web::Data<AppState>, http: HttpRequest, body: web::Json<SearchBody>,
) -> ApiResult<web::Json<SearchResponse>> {
    let client = http.connection_info().realip_remote_addr().unwrap_or("unknown").to_owned();
    if !state.search_limiter.allows(&client) {
        tracing::warn!(client, "search refused by rate limiter");
        return Err(ApiError::TooManyRequests(SEARCH_LIMIT_MESSAGE.into()));
    }

    let outcome = run_search(&state, body.into_inner()).await;
    if outcome.is_err() {
        state.search_limiter.record_failure(&client);
    }
    outcome.map(web::Json)
}

async fn run_search(state: &AppState, body: SearchBody) -> ApiResult<SearchResponse> {
    let req = SearchRequest::try_from(body)?;
    let started = Instant::now();
    let key = CacheKey::from(&req);

    if let Some(results) = state.cache.get(&key) {
        let count = results.len();
        tracing::debug!(key = %key, count, "category cache hit");
        return Ok(SearchResponse { results, cached: true, count, response_time: elapsed_ms(started), trip_id: None });
    }

    tracing::debug!(key = %key, "category cache miss");
    let results = state.fares.search(&req).await;
    state.cache.set(key, results.clone());

    let mut trip_id = None;
    if req.user_id.is_some() && !results.is_empty() {
        match state.trips.record_search(&req, results.len()).await {
            Ok(trip) => trip_id = Some(trip.id),
            Err(e) => tracing::warn!(error = %e, "failed to record search history"),
        }
    }

    let count = results.len();
    let response_time = elapsed_ms(started);
    tracing::info!(mode = %req.mode, count, response_time, "search completed");

    Ok(SearchResponse { results, cached: false, count, response_time, trip_id })
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
