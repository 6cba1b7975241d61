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
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) origin or ends with `/`
    /// - a store name is empty, or two stores share a name
    /// - `max_bytes` is 0 or exceeds 512MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self
            .origin
            .strip_prefix("https://")
            .or_else(|| self.origin.strip_prefix("http://"));
        match host {
            None => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: "must use http or https".into() });
            }
            Some("") => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: "must include a host".into() });
            }
            Some(host) if host.contains('/') => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: "must not contain a path or trailing slash".into(),
                });
            }
            Some(_) => {}
        }

        let stores = [
            ("content_cache", &self.content_cache),
            ("temp_cache", &self.temp_cache),
            ("manifest_cache", &self.manifest_cache),
        ];
        for (field, name) in stores {
            if name.is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }
        if self.content_cache == self.temp_cache
            || self.content_cache == self.manifest_cache
            || self.temp_cache == self.manifest_cache
        {
            return Err(ConfigError::Invalid {
                field: "content_cache".into(),
                reason: "content, temp and manifest stores need distinct names".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 512 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 512MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.auto_activate {
            tracing::warn!("auto_activate is off; the worker waits for an explicit activate event");
        }

        Ok(())
    }
}
