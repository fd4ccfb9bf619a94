//! Search fingerprint used as the category cache key.

use std::fmt;

use crate::model::{SearchRequest, TransportMode};

const NO_DATE: &str = "no-date";

/// Normalized `(mode, source, destination, date)` tuple.
///
/// Source and destination are trimmed and lowercased so that case variants of
/// the same search share one entry. Renders as
/// `{mode}_{source}_{destination}_{date|no-date}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub mode: TransportMode,
    pub source: String,
    pub destination: String,
    pub date: Option<String>,
}

impl CacheKey {
    pub fn new(mode: TransportMode, source: &str, destination: &str, date: Option<&str>) -> Self {
        Self {
            mode,
            source: normalize(source),
            destination: normalize(destination),
            date: date.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
        }
    }

    /// Whether this key falls under a `(source?, destination?)` invalidation filter.
    pub fn matches(&self, source: Option<&str>, destination: Option<&str>) -> bool {
        source.is_none_or(|s| self.source == normalize(s)) && destination.is_none_or(|d| self.destination == normalize(d))
    }
}

impl From<&SearchRequest> for CacheKey {
    fn from(req: &SearchRequest) -> Self {
        Self::new(req.mode, &req.source, &req.destination, req.date.as_deref())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.mode,
            self.source,
            self.destination,
            self.date.as_deref().unwrap_or(NO_DATE)
        )
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = CacheKey::new(TransportMode::Flights, "DEL", "BOM", Some("2025-09-07"));
        assert_eq!(key.to_string(), "flights_del_bom_2025-09-07");
    }

    #[test]
    fn test_key_without_date() {
        let key = CacheKey::new(TransportMode::Cars, "Pune", "Goa", None);
        assert_eq!(key.to_string(), "4wheelers_pune_goa_no-date");

        let blank = CacheKey::new(TransportMode::Cars, "Pune", "Goa", Some("  "));
        assert_eq!(blank, key);
    }

    #[test]
    fn test_case_variants_share_a_key() {
        let a = CacheKey::new(TransportMode::Trains, " Delhi ", "MUMBAI", None);
        let b = CacheKey::new(TransportMode::Trains, "delhi", "mumbai", None);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_mode_distinguishes_keys() {
        let a = CacheKey::new(TransportMode::Buses, "del", "bom", None);
        let b = CacheKey::new(TransportMode::Flights, "del", "bom", None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_matches_filter() {
        let key = CacheKey::new(TransportMode::Flights, "DEL", "BOM", Some("2025-09-07"));
        assert!(key.matches(None, None));
        assert!(key.matches(Some("del"), None));
        assert!(key.matches(Some("Del"), Some("bom")));
        assert!(!key.matches(Some("del"), Some("bombay")));
        assert!(!key.matches(None, Some("blr")));
    }
}
