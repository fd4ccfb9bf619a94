//! Core types and shared functionality for TripBuddy.
//!
//! This crate provides:
//! - Domain model for trips and transport searches
//! - Cache keys, the in-process volatile cache and the per-category result cache
//! - SQLite-backed key-value and document storage
//! - Unified error types
//! - Configuration structures

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use cache::{CacheKey, RemoteCategoryCache, VolatileCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{Origin, SearchRequest, SearchResponse, SyncState, TransportMode, TripKind, TripRecord};
pub use store::{DocumentStore, StoreDb, StoredValue};
