//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRECACHE_*)
//! 2. TOML config file (if PRECACHE_CONFIG_FILE set)
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

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PRECACHE_*)
/// 2. TOML config file (if PRECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the cached application is served from, without trailing slash.
    ///
    /// Set via PRECACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to the build-time bundle (resource manifest and shell list).
    ///
    /// Set via PRECACHE_BUNDLE_PATH environment variable.
    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,

    /// Path to the SQLite database holding every named store.
    ///
    /// Set via PRECACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name of the long-lived content store.
    #[serde(default = "default_content_cache")]
    pub content_cache: String,

    /// Name of the store filled during install and drained on activation.
    #[serde(default = "default_temp_cache")]
    pub temp_cache: String,

    /// Name of the store holding the persisted manifest record.
    #[serde(default = "default_manifest_cache")]
    pub manifest_cache: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PRECACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Activate right after a successful install when the worker asked to
    /// skip waiting.
    #[serde(default = "default_true")]
    pub auto_activate: bool,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_bundle_path() -> PathBuf {
    PathBuf::from("./precache-bundle.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./precache.sqlite")
}

fn default_content_cache() -> String {
    "app-cache".into()
}

fn default_temp_cache() -> String {
    "temp-cache".into()
}

fn default_manifest_cache() -> String {
    "app-manifest".into()
}

fn default_user_agent() -> String {
    "precache/0.1".into()
}

fn default_max_bytes() -> usize {
    52_428_800 // 50MB, wasm bundles are large
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            bundle_path: default_bundle_path(),
            db_path: default_db_path(),
            content_cache: default_content_cache(),
            temp_cache: default_temp_cache(),
            manifest_cache: default_manifest_cache(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            auto_activate: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PRECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PRECACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
