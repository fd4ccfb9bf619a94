//! `POST /transport/cache/clear`.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tripbuddy_core::TransportMode;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// Drop cached results for one mode, optionally narrowed to a route.
#[post("/cache/clear")]
pub async fn clear(state: web::Data<AppState>, body: web::Json<ClearRequest>) -> ApiResult<web::Json<ClearResponse>> {
    let body = body.into_inner();
    let mode: TransportMode = body
        .mode
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid mode selected.".into()))?;

    let cleared = state.cache.clear(mode, body.source.as_deref(), body.destination.as_deref());
    Ok(web::Json(ClearResponse { cleared }))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::json;
    use tripbuddy_core::CacheKey;

    use super::*;
    use crate::routes::configure;
    use crate::routes::test_support::{CountingFares, state};

    #[actix_web::test]
    async fn test_clear_route_only() {
        let state = state(CountingFares::new(0)).await;
        let cache = state.cache.clone();
        cache.set(CacheKey::new(TransportMode::Flights, "del", "bom", None), vec![json!(1)]);
        cache.set(CacheKey::new(TransportMode::Flights, "del", "goi", None), vec![json!(2)]);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/transport/cache/clear")
            .set_json(json!({"mode": "flights", "source": "DEL", "destination": "BOM"}))
            .to_request();
        let resp: ClearResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.cleared, 1);
        assert_eq!(cache.len(TransportMode::Flights), 1);
    }

    #[actix_web::test]
    async fn test_clear_rejects_unknown_mode() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state(CountingFares::new(0)).await)).configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/transport/cache/clear")
            .set_json(json!({"mode": "boats"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
