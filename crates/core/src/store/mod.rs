//! SQLite-backed storage.
//!
//! One database schema serves both sides:
//! - `kv_store`: device-local key/value entries with optional expiry
//! - `documents`: server-side JSON documents grouped into collections

pub mod connection;
pub mod documents;
pub mod kv;
pub mod migrations;

pub use connection::StoreDb;
pub use documents::DocumentStore;
pub use kv::StoredValue;
