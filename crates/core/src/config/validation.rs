//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `backend_url` is not an http(s) URL
    /// - any TTL, rate limit or sweep interval is 0
    /// - `max_results` is 0 or exceeds 100
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(invalid("backend_url", "must start with http:// or https://"));
        }

        if self.volatile_ttl_ms == 0 {
            return Err(invalid("volatile_ttl_ms", "must be greater than 0"));
        }
        if self.durable_ttl_ms == 0 {
            return Err(invalid("durable_ttl_ms", "must be greater than 0"));
        }
        if self.durable_ttl_ms < self.volatile_ttl_ms {
            tracing::warn!(
                volatile_ttl_ms = self.volatile_ttl_ms,
                durable_ttl_ms = self.durable_ttl_ms,
                "durable cache TTL is shorter than the in-memory TTL"
            );
        }

        if self.rate_limit == 0 {
            return Err(invalid("rate_limit", "must be greater than 0"));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(invalid("rate_limit_window_ms", "must be greater than 0"));
        }

        if self.search_rate_limit == 0 {
            return Err(invalid("search_rate_limit", "must be greater than 0"));
        }

        for (field, secs) in [
            ("cache_ttl.flights", self.cache_ttl.flights),
            ("cache_ttl.trains", self.cache_ttl.trains),
            ("cache_ttl.buses", self.cache_ttl.buses),
            ("cache_ttl.cars", self.cache_ttl.cars),
            ("cache_sweep_secs", self.cache_sweep_secs),
            ("search_rate_limit_window_secs", self.search_rate_limit_window_secs),
        ] {
            if secs == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }

        if self.max_results == 0 || self.max_results > 100 {
            return Err(invalid("max_results", "must be between 1 and 100"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheTtlConfig;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_backend_url_scheme() {
        let config = AppConfig { backend_url: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "backend_url"));

        let config = AppConfig { backend_url: "https://api.tripbuddy.app".into(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let config = AppConfig { rate_limit: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "rate_limit"));
    }

    #[test]
    fn test_validate_zero_search_rate_limit() {
        let config = AppConfig { search_rate_limit: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "search_rate_limit"));

        let config = AppConfig { search_rate_limit_window_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "search_rate_limit_window_secs"));
    }

    #[test]
    fn test_validate_zero_category_ttl() {
        let config = AppConfig { cache_ttl: CacheTtlConfig { trains: 0, ..Default::default() }, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl.trains"));
    }

    #[test]
    fn test_validate_max_results_bounds() {
        let config = AppConfig { max_results: 101, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { max_results: 1, timeout_ms: 100, ..Default::default() }; // minimum valid values
        assert!(config.validate().is_ok());
    }
}
