//! Device-side code for TripBuddy.
//!
//! This crate provides the stale-while-revalidate read path over the
//! in-memory and on-device cache tiers, the offline-first trip store with its
//! sync reconciler, and the HTTP client for the TripBuddy server.

pub mod backend;
pub mod device;
pub mod durable;
pub mod swr;
pub mod trips;

pub use backend::{BackendClient, BackendError, TokenBucket};
pub use device::{Device, DeviceError};
pub use durable::DurableCache;
pub use swr::{Resolved, SwrCoordinator};
pub use trips::{Delivery, PushOutcome, RemoteTrips, SyncReconciler, SyncReport, TripStore, settle};
