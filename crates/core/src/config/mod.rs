//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (KARUTA_*)
//! 2. TOML config file (if KARUTA_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Fallback thumbnail used when an entry has no cover and no override is set.
pub const DEFAULT_COVER: &str = "/img/default-cover.svg";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (KARUTA_*)
/// 2. TOML config file (if KARUTA_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the static site (scheme, host and port).
    ///
    /// Set via KARUTA_SITE_URL environment variable.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Path to the SQLite database holding response caches and history.
    ///
    /// Set via KARUTA_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Version tag embedded in the cache names.
    ///
    /// Bumping it makes activation sweep every cache of the previous version.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Prefix of the cache names (`<prefix>-static-<version>`).
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Keystroke debounce before a search runs.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Items scored per batch before yielding back to the runtime.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Upper bound on rendered results.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Number of queries kept in the search history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Minimum query length (in characters) for searching and history.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    /// Override for the fallback result thumbnail.
    #[serde(default)]
    pub default_cover: Option<String>,

    /// Interval between service-worker update checks.
    #[serde(default = "default_update_check_interval_secs")]
    pub update_check_interval_secs: u64,

    /// Lifetime of the on-page update notice.
    #[serde(default = "default_update_notice_ttl_secs")]
    pub update_notice_ttl_secs: u64,
}

fn default_site_url() -> String {
    "http://localhost:1313".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./karuta-cache.sqlite")
}

fn default_user_agent() -> String {
    "karuta/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_cache_version() -> String {
    "v3.0.0".into()
}

fn default_cache_prefix() -> String {
    "karuta".into()
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_chunk_size() -> usize {
    50
}

fn default_max_results() -> usize {
    100
}

fn default_history_capacity() -> usize {
    10
}

fn default_min_query_len() -> usize {
    2
}

fn default_update_check_interval_secs() -> u64 {
    60 * 60
}

fn default_update_notice_ttl_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_version: default_cache_version(),
            cache_prefix: default_cache_prefix(),
            debounce_ms: default_debounce_ms(),
            chunk_size: default_chunk_size(),
            max_results: default_max_results(),
            history_capacity: default_history_capacity(),
            min_query_len: default_min_query_len(),
            default_cover: None,
            update_check_interval_secs: default_update_check_interval_secs(),
            update_notice_ttl_secs: default_update_notice_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn update_check_interval(&self) -> Duration {
        Duration::from_secs(self.update_check_interval_secs)
    }

    pub fn update_notice_ttl(&self) -> Duration {
        Duration::from_secs(self.update_notice_ttl_secs)
    }

    /// Thumbnail shown for entries without a cover.
    pub fn cover_fallback(&self) -> &str {
        match self.default_cover.as_deref() {
            Some(cover) if !cover.is_empty() => cover,
            _ => DEFAULT_COVER,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `KARUTA_`
    /// 2. TOML file from `KARUTA_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("KARUTA_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("KARUTA_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.site_url, "http://localhost:1313");
        assert_eq!(config.db_path, PathBuf::from("./karuta-cache.sqlite"));
        assert_eq!(config.user_agent, "karuta/0.1");
        assert_eq!(config.cache_version, "v3.0.0");
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.max_results, 100);
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.min_query_len, 2);
        assert!(config.default_cover.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.update_check_interval(), Duration::from_secs(3600));
        assert_eq!(config.update_notice_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_cover_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.cover_fallback(), DEFAULT_COVER);

        let config = AppConfig { default_cover: Some("/img/site.png".into()), ..Default::default() };
        assert_eq!(config.cover_fallback(), "/img/site.png");

        let config = AppConfig { default_cover: Some(String::new()), ..Default::default() };
        assert_eq!(config.cover_fallback(), DEFAULT_COVER);
    }
}
