//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use tripbuddy_core::{AppConfig, RemoteCategoryCache, StoreDb};

use crate::fares::{FareSource, Fares};
use crate::limiter::SearchLimiter;
use crate::trips::TripRepository;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RemoteCategoryCache>,
    pub trips: TripRepository,
    pub fares: Arc<dyn FareSource>,
    pub search_limiter: Arc<SearchLimiter>,
}

impl AppState {
    pub fn new(
        cache: Arc<RemoteCategoryCache>, trips: TripRepository, fares: Arc<dyn FareSource>,
        search_limiter: Arc<SearchLimiter>,
    ) -> Self {
        Self { cache, trips, fares, search_limiter }
    }

    pub fn from_config(config: &AppConfig, db: StoreDb) -> Self {
        Self::new(
            Arc::new(RemoteCategoryCache::new(&config.cache_ttl)),
            TripRepository::new(Arc::new(db)),
            Arc::new(Fares::from_config(config)),
            Arc::new(SearchLimiter::from_config(config)),
        )
    }
}
