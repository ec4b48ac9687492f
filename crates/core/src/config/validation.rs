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
    /// - `site_url` is not an http(s) URL with a host
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent`, `cache_version` or `cache_prefix` is empty
    /// - any of the size knobs is 0
    /// - `update_check_interval_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "site_url".into(),
                hint: "Set KARUTA_SITE_URL environment variable".into(),
            });
        }
        match url::Url::parse(&self.site_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {}
            Ok(_) => return Err(invalid("site_url", "must be an http(s) origin")),
            Err(e) => return Err(invalid("site_url", &e.to_string())),
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.cache_version.is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.cache_prefix.is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }

        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be greater than 0"));
        }
        if self.max_results == 0 {
            return Err(invalid("max_results", "must be greater than 0"));
        }
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be greater than 0"));
        }
        if self.min_query_len == 0 {
            return Err(invalid("min_query_len", "must be greater than 0"));
        }

        if self.update_check_interval_secs == 0 {
            return Err(invalid("update_check_interval_secs", "must be greater than 0"));
        }

        if self.debounce_ms > 5_000 {
            tracing::warn!(debounce_ms = self.debounce_ms, "debounce is unusually long; input will feel sluggish");
        }

        Ok(())
    }
}
