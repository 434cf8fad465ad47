//! Shared server state handed to every tool.

use shelf_core::{AppConfig, CacheFacade, Error, InvalidationOutcome, InvalidationRegistry, KeyDeriver, MutationEvent};

use crate::catalog::Catalog;

/// Everything a tool call needs. Built once at startup and shared via `Arc`.
#[derive(Debug)]
pub struct AppState {
    pub catalog: Catalog,
    pub cache: CacheFacade,
    pub keys: KeyDeriver,
    pub registry: InvalidationRegistry,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(catalog: Catalog, cache: CacheFacade, config: AppConfig) -> Self {
        Self {
            catalog,
            cache,
            keys: KeyDeriver::new(config.per_page),
            registry: InvalidationRegistry::standard(),
            config,
        }
    }

    /// Build the configured cache backend and an empty catalog.
    pub async fn from_config(config: AppConfig) -> Result<Self, Error> {
        let cache = CacheFacade::from_config(&config).await?;
        Ok(Self::new(Catalog::new(), cache, config))
    }

    /// Invalidate the caches `event` stales.
    ///
    /// The write has already been applied, so a failed invalidation is
    /// logged rather than failing the call.
    pub async fn after_write(&self, event: MutationEvent) -> Option<InvalidationOutcome> {
        match self.cache.invalidate_for(&self.registry, event).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(%event, error = %e, "Cache invalidation failed after write");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use shelf_core::StoreHandle;
    use shelf_core::cache::MemoryStore;

    use super::*;

    /// State over an enumerable in-memory cache.
    pub fn memory_state() -> Arc<AppState> {
        let cache = CacheFacade::new(StoreHandle::enumerable(MemoryStore::new()), Duration::from_secs(3600));
        Arc::new(AppState::new(Catalog::new(), cache, AppConfig::default()))
    }

    /// Pull the JSON body out of a tool result.
    pub fn body(result: &rmcp::model::CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use shelf_core::{CacheBackend, CacheName};
    use tempfile::TempDir;

    use super::*;

    fn config_in(dir: &TempDir, backend: CacheBackend) -> AppConfig {
        AppConfig {
            cache_backend: backend,
            cache_dir: dir.path().join("cache"),
            db_path: dir.path().join("cache.sqlite"),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_after_write_prunes_on_persistent_backends() {
        for backend in [CacheBackend::File, CacheBackend::Sqlite] {
            let dir = TempDir::new().unwrap();
            let state = AppState::from_config(config_in(&dir, backend)).await.unwrap();
            let key = state.keys.key(CacheName::OrdersList, &shelf_core::ParamBag::new());
            state.cache.remember_default(&key, || async { Ok::<_, Error>(1) }).await.unwrap();

            let outcome = state.after_write(MutationEvent::UserWritten).await;
            assert_eq!(outcome, Some(InvalidationOutcome::Pruned { removed: 1 }), "{backend:?}");
        }
    }

    #[tokio::test]
    async fn test_after_write_flushes_opaque_backend() {
        let dir = TempDir::new().unwrap();
        let state = AppState::from_config(config_in(&dir, CacheBackend::Opaque)).await.unwrap();
        let outcome = state.after_write(MutationEvent::OrderWritten).await;
        assert!(matches!(outcome, Some(InvalidationOutcome::Flushed { .. })));
    }
}
