//! Read-through cache facade with prefix-scoped invalidation.
//!
//! The facade is the only thing request handlers talk to. It never fails a
//! read because of the store: lookup and write errors are logged and the
//! request falls through to the compute closure. Invalidation errs on the
//! side of deleting too much, escalating to a full flush when a targeted
//! delete cannot complete.
//!
//! There is no single-flight: concurrent misses on the same key may each run
//! their compute closure, and the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use super::file::FileStore;
use super::memory::MemoryStore;
use super::names::CacheName;
use super::registry::{InvalidationRegistry, MutationEvent};
use super::store::{StoreHandle, StoredValue};
use crate::Error;
use crate::config::{AppConfig, CacheBackend};

/// How an invalidation was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum InvalidationOutcome {
    /// Only entries under the requested prefixes were deleted.
    Pruned { removed: u64 },
    /// The whole cache was flushed instead.
    Flushed { reason: String },
}

/// Point-in-time counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub store_errors: u64,
    pub invalidations: u64,
    pub flushes: u64,
}

impl CacheStats {
    /// Hit rate as a percentage of lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { (self.hits as f64 / total as f64) * 100.0 }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
    invalidations: AtomicU64,
    flushes: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Inner {
    store: StoreHandle,
    default_ttl: Duration,
    counters: Counters,
}

/// Shared handle to the cache. Cloning is cheap and shares state.
#[derive(Debug, Clone)]
pub struct CacheFacade {
    inner: Arc<Inner>,
}

impl CacheFacade {
    pub fn new(store: StoreHandle, default_ttl: Duration) -> Self {
        Self { inner: Arc::new(Inner { store, default_ttl, counters: Counters::default() }) }
    }

    /// Build the backend selected in `config` and wrap it.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let store = match config.cache_backend {
            CacheBackend::File => StoreHandle::enumerable(FileStore::open(&config.cache_dir).await?),
            CacheBackend::Sqlite => StoreHandle::indexed(CacheDb::open(&config.db_path).await?),
            CacheBackend::Memory => StoreHandle::enumerable(MemoryStore::new()),
            CacheBackend::Opaque => StoreHandle::opaque(MemoryStore::new()),
        };

        tracing::info!(
            backend = ?config.cache_backend,
            capability = store.capability(),
            ttl_secs = config.cache_ttl().as_secs(),
            "Cache store ready"
        );

        Ok(Self::new(store, config.cache_ttl()))
    }

    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// An `Err` from `compute` is returned unchanged and nothing is stored.
    /// A cached value that no longer decodes as `T` counts as a miss.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let counters = &self.inner.counters;

        match self.inner.store.get(key).await {
            Ok(Some(entry)) => match serde_json::from_value::<T>(entry.value) {
                Ok(value) => {
                    Counters::bump(&counters.hits);
                    tracing::debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Cached value does not decode, recomputing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                Counters::bump(&counters.store_errors);
                tracing::warn!(key, error = %e, "Cache lookup failed, computing without cache");
            }
        }

        Counters::bump(&counters.misses);
        tracing::debug!(key, "Cache miss");

        let value = compute().await?;

        let stored = serde_json::to_value(&value)
            .map_err(Error::from)
            .map(|json| StoredValue::new(json, ttl));
        let written = match stored {
            Ok(stored) => self.inner.store.put(key, stored).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            Counters::bump(&counters.store_errors);
            tracing::warn!(key, error = %e, "Cache write failed, value returned uncached");
        }

        Ok(value)
    }

    /// `remember` with the configured TTL.
    pub async fn remember_default<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.remember(key, self.inner.default_ttl, compute).await
    }

    /// Delete every entry whose key starts with one of `names`' prefixes.
    ///
    /// # Errors
    ///
    /// Only when a targeted delete failed and the fallback flush failed too.
    pub async fn invalidate(&self, names: &[CacheName]) -> Result<InvalidationOutcome, Error> {
        Counters::bump(&self.inner.counters.invalidations);

        if names.is_empty() {
            return Ok(InvalidationOutcome::Pruned { removed: 0 });
        }

        let prefixes: Vec<&str> = names.iter().map(|n| n.prefix()).collect();

        let attempt = match &self.inner.store {
            StoreHandle::Indexed(store) => {
                let mut removed = 0;
                let mut result = Ok(());
                for prefix in &prefixes {
                    match store.delete_prefix(prefix).await {
                        Ok(n) => removed += n,
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }
                result.map(|()| removed)
            }
            StoreHandle::Enumerable(store) => match store.keys().await {
                Ok(keys) => {
                    let mut removed = 0;
                    let mut result = Ok(());
                    for key in keys.iter().filter(|k| prefixes.iter().any(|p| k.starts_with(p))) {
                        match store.delete(key).await {
                            Ok(true) => removed += 1,
                            Ok(false) => {}
                            Err(e) => {
                                result = Err(Error::InvalidationPartial(format!("deleting {key}: {e}")));
                                break;
                            }
                        }
                    }
                    result.map(|()| removed)
                }
                Err(e) => Err(Error::InvalidationPartial(format!("listing keys: {e}"))),
            },
            StoreHandle::Opaque(_) => {
                let reason = "store cannot enumerate keys".to_string();
                tracing::warn!(prefixes = ?prefixes, "Flushing whole cache to invalidate prefixes: {reason}");
                return self.flush_for(reason).await;
            }
        };

        match attempt {
            Ok(removed) => {
                tracing::info!(
                    prefixes = ?prefixes,
                    removed,
                    capability = self.inner.store.capability(),
                    "Invalidated cache prefixes"
                );
                Ok(InvalidationOutcome::Pruned { removed })
            }
            Err(e) => {
                Counters::bump(&self.inner.counters.store_errors);
                tracing::warn!(prefixes = ?prefixes, error = %e, "Targeted invalidation failed, flushing");
                self.flush_for(e.to_string()).await
            }
        }
    }

    /// Invalidate every cache the registry associates with `event`.
    pub async fn invalidate_for(
        &self,
        registry: &InvalidationRegistry,
        event: MutationEvent,
    ) -> Result<InvalidationOutcome, Error> {
        let names = registry.names_for(event);
        tracing::debug!(%event, names = ?names, "Mutation invalidates caches");
        self.invalidate(names).await
    }

    /// Delete every entry. Returns the number removed.
    pub async fn flush(&self) -> Result<u64, Error> {
        Counters::bump(&self.inner.counters.flushes);
        let removed = self.inner.store.flush().await?;
        tracing::info!(removed, "Flushed cache");
        Ok(removed)
    }

    async fn flush_for(&self, reason: String) -> Result<InvalidationOutcome, Error> {
        self.flush().await.inspect_err(|e| {
            Counters::bump(&self.inner.counters.store_errors);
            tracing::error!(error = %e, "Cache flush failed, stale entries may remain");
        })?;
        Ok(InvalidationOutcome::Flushed { reason })
    }

    /// Delete expired entries. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let removed = self.inner.store.purge_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired cache entries");
        }
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }
}
