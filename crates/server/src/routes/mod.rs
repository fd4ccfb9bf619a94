//! HTTP surface of the TripBuddy server.
//!
//! ```text
//! GET    /                          liveness text
//! GET    /transport/test            liveness JSON
//! POST   /transport/search
//! GET    /transport/history/{userId}
//! POST   /transport/trip/add
//! POST   /transport/trip/sync
//! DELETE /transport/trip/{tripId}
//! POST   /transport/cache/clear
//! ```

use actix_web::{HttpRequest, HttpResponse, get, web};
use chrono::Utc;
use serde_json::json;

use crate::error::ApiError;

pub mod cache;
pub mod search;
pub mod trips;

/// Register every route. Malformed JSON bodies become 400 responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid request body: {err}")).into());

    cfg.app_data(json).service(root).service(
        web::scope("/transport")
            .service(transport_test)
            .service(search::search)
            .service(trips::history)
            .service(trips::add)
            .service(trips::sync)
            .service(trips::delete)
            .service(cache::clear),
    );
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().body("TripBuddy Backend is running")
}

#[get("/test")]
async fn transport_test(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Transport API is working!",
        "timestamp": Utc::now(),
        "endpoint": req.uri().to_string(),
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tripbuddy_core::{RemoteCategoryCache, SearchRequest, StoreDb};

    use crate::fares::FareSource;
    use crate::limiter::SearchLimiter;
    use crate::state::AppState;
    use crate::trips::TripRepository;

    /// Fare source that counts upstream calls and returns `count` results.
    pub struct CountingFares {
        pub calls: AtomicUsize,
        pub count: usize,
    }

    impl CountingFares {
        pub fn new(count: usize) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), count })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FareSource for CountingFares {
        async fn search(&self, req: &SearchRequest) -> Vec<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (0..self.count)
                .map(|i| json!({"id": format!("{}-{i}", req.mode), "from": req.source, "to": req.destination}))
                .collect()
        }
    }

    pub async fn state(fares: Arc<CountingFares>) -> AppState {
        let db = StoreDb::open_in_memory().await.unwrap();
        AppState::new(
            Arc::new(RemoteCategoryCache::default()),
            TripRepository::new(Arc::new(db)),
            fares,
            Arc::new(SearchLimiter::new(10, Duration::from_secs(3600))),
        )
    }
}
