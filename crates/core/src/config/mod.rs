//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TRIPBUDDY_*)
//! 2. TOML config file (if TRIPBUDDY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::model::TransportMode;

mod validation;

pub use validation::ConfigError;

/// Per-category TTLs for the server result cache, in seconds.
///
/// Set via TRIPBUDDY_CACHE_TTL__<MODE>, e.g. TRIPBUDDY_CACHE_TTL__FLIGHTS=900.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    pub flights: u64,
    pub trains: u64,
    pub buses: u64,
    pub cars: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self { flights: 1800, trains: 3600, buses: 1800, cars: 3600 }
    }
}

impl CacheTtlConfig {
    pub fn ttl_for(&self, mode: TransportMode) -> Duration {
        let secs = match mode {
            TransportMode::Flights => self.flights,
            TransportMode::Trains => self.trains,
            TransportMode::Buses => self.buses,
            TransportMode::Cars => self.cars,
        };
        Duration::from_secs(secs)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TRIPBUDDY_*)
/// 2. TOML config file (if TRIPBUDDY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database (device store on the client, document store on the server).
    ///
    /// Set via TRIPBUDDY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP server binds to.
    ///
    /// Set via TRIPBUDDY_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the TripBuddy server, used by the device client.
    ///
    /// Set via TRIPBUDDY_BACKEND_URL environment variable.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// User-Agent string for outbound HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TRIPBUDDY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lifetime of entries in the in-memory client cache.
    #[serde(default = "default_volatile_ttl_ms")]
    pub volatile_ttl_ms: u64,

    /// Lifetime of entries in the on-device durable cache.
    #[serde(default = "default_durable_ttl_ms")]
    pub durable_ttl_ms: u64,

    /// Client-side search requests allowed per rate limit window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Length of the client-side rate limit window in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Failed searches a server client may make per window before it is refused.
    ///
    /// Set via TRIPBUDDY_SEARCH_RATE_LIMIT environment variable.
    #[serde(default = "default_search_rate_limit")]
    pub search_rate_limit: u32,

    /// Length of the server search limit window in seconds.
    #[serde(default = "default_search_rate_limit_window_secs")]
    pub search_rate_limit_window_secs: u64,

    /// Per-category TTLs of the server result cache.
    #[serde(default)]
    pub cache_ttl: CacheTtlConfig,

    /// Interval between sweeps of expired server cache entries, in seconds.
    #[serde(default = "default_cache_sweep_secs")]
    pub cache_sweep_secs: u64,

    /// Maximum results returned per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// RapidAPI key for the flight fare API.
    ///
    /// Set via TRIPBUDDY_RAPIDAPI_KEY environment variable.
    /// Without it flight searches return no results.
    #[serde(default)]
    pub rapidapi_key: Option<String>,

    /// RapidAPI host of the flight fare API.
    #[serde(default = "default_rapidapi_host")]
    pub rapidapi_host: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tripbuddy.sqlite")
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_user_agent() -> String {
    "tripbuddy/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_volatile_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_durable_ttl_ms() -> u64 {
    86_400_000 // 24 hours
}

fn default_rate_limit() -> u32 {
    85
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_search_rate_limit() -> u32 {
    10
}

fn default_search_rate_limit_window_secs() -> u64 {
    3600 // 1 hour
}

fn default_cache_sweep_secs() -> u64 {
    120
}

fn default_max_results() -> usize {
    20
}

fn default_rapidapi_host() -> String {
    "flight-fare-search.p.rapidapi.com".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            backend_url: default_backend_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            volatile_ttl_ms: default_volatile_ttl_ms(),
            durable_ttl_ms: default_durable_ttl_ms(),
            rate_limit: default_rate_limit(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            search_rate_limit: default_search_rate_limit(),
            search_rate_limit_window_secs: default_search_rate_limit_window_secs(),
            cache_ttl: CacheTtlConfig::default(),
            cache_sweep_secs: default_cache_sweep_secs(),
            max_results: default_max_results(),
            rapidapi_key: None,
            rapidapi_host: default_rapidapi_host(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn volatile_ttl(&self) -> Duration {
        Duration::from_millis(self.volatile_ttl_ms)
    }

    pub fn durable_ttl(&self) -> Duration {
        Duration::from_millis(self.durable_ttl_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn search_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.search_rate_limit_window_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TRIPBUDDY_`
    /// 2. TOML file from `TRIPBUDDY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TRIPBUDDY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TRIPBUDDY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the RapidAPI key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_rapidapi_key(&self) -> Result<&str, ConfigError> {
        self.rapidapi_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "rapidapi_key".into(),
                hint: "Set TRIPBUDDY_RAPIDAPI_KEY environment variable".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./tripbuddy.sqlite"));
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.volatile_ttl(), Duration::from_secs(300));
        assert_eq!(config.durable_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.rate_limit, 85);
        assert_eq!(config.search_rate_limit, 10);
        assert_eq!(config.search_rate_limit_window(), Duration::from_secs(3600));
        assert_eq!(config.max_results, 20);
        assert_eq!(config.cache_ttl, CacheTtlConfig::default());
        assert!(config.rapidapi_key.is_none());
    }

    #[test]
    fn test_category_ttls() {
        let ttls = CacheTtlConfig::default();
        assert_eq!(ttls.ttl_for(TransportMode::Flights), Duration::from_secs(1800));
        assert_eq!(ttls.ttl_for(TransportMode::Trains), Duration::from_secs(3600));
        assert_eq!(ttls.ttl_for(TransportMode::Buses), Duration::from_secs(1800));
        assert_eq!(ttls.ttl_for(TransportMode::Cars), Duration::from_secs(3600));
    }

    #[test]
    fn test_require_rapidapi_key_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.require_rapidapi_key(), Err(ConfigError::Missing { .. })));

        let blank = AppConfig { rapidapi_key: Some(String::new()), ..Default::default() };
        assert!(blank.require_rapidapi_key().is_err());
    }

    #[test]
    fn test_require_rapidapi_key_present() {
        let config = AppConfig { rapidapi_key: Some("test-key".into()), ..Default::default() };
        assert_eq!(config.require_rapidapi_key().unwrap(), "test-key");
    }

    #[test]
    fn test_env_overrides_nested_ttl() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TRIPBUDDY_CACHE_TTL__FLIGHTS", "60");
            jail.set_env("TRIPBUDDY_MAX_RESULTS", "10");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_ttl.flights, 60);
            assert_eq!(config.cache_ttl.trains, 3600);
            assert_eq!(config.max_results, 10);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_layer() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tripbuddy.toml",
                r#"
                bind_addr = "127.0.0.1:8080"

                [cache_ttl]
                buses = 600
                "#,
            )?;
            jail.set_env("TRIPBUDDY_CONFIG_FILE", "tripbuddy.toml");
            jail.set_env("TRIPBUDDY_BIND_ADDR", "127.0.0.1:9090");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.bind_addr, "127.0.0.1:9090");
            assert_eq!(config.cache_ttl.buses, 600);
            assert_eq!(config.cache_ttl.cars, 3600);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TRIPBUDDY_MAX_RESULTS", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
