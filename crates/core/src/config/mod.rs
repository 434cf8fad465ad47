//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELF_*)
//! 2. TOML config file (if SHELF_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::{ConfigError, MAX_PER_PAGE};

/// Which store backend the cache facade runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// One file per entry in `cache_dir`; invalidated by enumeration.
    File,
    /// SQLite table at `db_path`; invalidated by native prefix delete.
    Sqlite,
    /// Process-local map; invalidated by enumeration.
    Memory,
    /// Process-local map without enumeration; every invalidation flushes.
    Opaque,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELF_*)
/// 2. TOML config file (if SHELF_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lifetime of cached list/detail results, in minutes.
    ///
    /// Set via SHELF_CACHE_TTL_MINUTES environment variable.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    /// Page size used when a list request omits `per_page`.
    ///
    /// Set via SHELF_PER_PAGE environment variable.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Store backend for cached results.
    ///
    /// Set via SHELF_CACHE_BACKEND environment variable.
    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackend,

    /// Directory holding one file per entry for the file backend.
    ///
    /// Set via SHELF_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Path to the SQLite database for the sqlite backend.
    ///
    /// Set via SHELF_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_cache_ttl_minutes() -> u64 {
    60
}

fn default_per_page() -> u32 {
    20
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::File
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./storage/cache")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shelf-cache.sqlite")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
            per_page: default_per_page(),
            cache_backend: default_cache_backend(),
            cache_dir: default_cache_dir(),
            db_path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Cache TTL converted from minutes.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELF_`
    /// 2. TOML file from `SHELF_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SHELF_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELF_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
