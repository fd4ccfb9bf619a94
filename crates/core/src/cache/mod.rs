//! In-process caches and cache keys.
//!
//! - [`CacheKey`]: deterministic fingerprint of a transport search
//! - [`VolatileCache`]: process-memory key/value cache with per-entry expiry
//! - [`RemoteCategoryCache`]: server-side result cache, one partition per transport mode
//!
//! The durable tier lives in [`crate::store`]; nothing here survives a restart.

pub mod category;
pub mod entry;
pub mod key;
pub mod volatile;

pub use category::RemoteCategoryCache;
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use volatile::VolatileCache;
