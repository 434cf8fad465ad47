//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, CacheBackend};
use thiserror::Error;

/// Largest page size a list request may ask for.
pub const MAX_PER_PAGE: u32 = 100;

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
    /// - `cache_ttl_minutes` is 0 or exceeds one week
    /// - `per_page` is 0 or exceeds `MAX_PER_PAGE`
    /// - the path required by the selected backend is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_minutes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_ttl_minutes > 7 * 24 * 60 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_minutes".into(),
                reason: "must not exceed one week (10080 minutes)".into(),
            });
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::Invalid {
                field: "per_page".into(),
                reason: format!("must be between 1 and {MAX_PER_PAGE}"),
            });
        }

        match self.cache_backend {
            CacheBackend::File if self.cache_dir.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid { field: "cache_dir".into(), reason: "must not be empty".into() });
            }
            CacheBackend::Sqlite if self.db_path.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
            }
            CacheBackend::Opaque => {
                tracing::warn!(
                    backend = "opaque",
                    "Cache backend cannot enumerate keys; every invalidation will flush the whole cache"
                );
            }
            _ => {}
        }

        Ok(())
    }
}
