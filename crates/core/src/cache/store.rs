//! Store capability traits.
//!
//! The cache facade only ever issues get/put/delete/flush against a store.
//! How it invalidates by prefix depends on which extra capability the store
//! offers, and that choice is made once at construction through
//! [`StoreHandle`]:
//!
//! - [`PrefixStore`]: native delete-by-prefix (preferred)
//! - [`EnumerableStore`]: list all keys, then delete the matching ones
//! - plain [`CacheStore`]: no enumeration, invalidation falls back to a flush

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A cached value together with its expiry.
///
/// This is also the on-disk envelope of the file backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    /// Expiry as a unix timestamp in seconds.
    pub expires_at: i64,
    pub value: serde_json::Value,
}

impl StoredValue {
    pub fn new(value: serde_json::Value, ttl: Duration) -> Self {
        Self { expires_at: expiry_from_now(ttl), value }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Unix timestamp `ttl` from now, saturating on overflow.
pub fn expiry_from_now(ttl: Duration) -> i64 {
    let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Utc::now().timestamp().saturating_add(ttl_secs)
}

/// Basic key-value operations every backend supports.
///
/// Implementations must tolerate concurrent calls without external locking.
/// `get` never returns an expired entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an unexpired entry.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, Error>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, value: StoredValue) -> Result<(), Error>;

    /// Delete one entry. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, Error>;

    /// Delete every entry. Returns the number removed.
    async fn flush(&self) -> Result<u64, Error>;

    /// Delete entries whose expiry has passed. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64, Error>;
}

/// A store that can list its keys.
#[async_trait]
pub trait EnumerableStore: CacheStore {
    async fn keys(&self) -> Result<Vec<String>, Error>;
}

/// A store that can delete by key prefix natively.
#[async_trait]
pub trait PrefixStore: CacheStore {
    /// Delete every entry whose key starts with `prefix`. Returns the number removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, Error>;
}

/// A store paired with the invalidation capability it was configured with.
#[derive(Clone)]
pub enum StoreHandle {
    Indexed(Arc<dyn PrefixStore>),
    Enumerable(Arc<dyn EnumerableStore>),
    Opaque(Arc<dyn CacheStore>),
}

impl StoreHandle {
    pub fn indexed(store: impl PrefixStore + 'static) -> Self {
        StoreHandle::Indexed(Arc::new(store))
    }

    pub fn enumerable(store: impl EnumerableStore + 'static) -> Self {
        StoreHandle::Enumerable(Arc::new(store))
    }

    pub fn opaque(store: impl CacheStore + 'static) -> Self {
        StoreHandle::Opaque(Arc::new(store))
    }

    /// Capability name used in log fields.
    pub fn capability(&self) -> &'static str {
        match self {
            StoreHandle::Indexed(_) => "indexed",
            StoreHandle::Enumerable(_) => "enumerable",
            StoreHandle::Opaque(_) => "opaque",
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<StoredValue>, Error> {
        match self {
            StoreHandle::Indexed(s) => s.get(key).await,
            StoreHandle::Enumerable(s) => s.get(key).await,
            StoreHandle::Opaque(s) => s.get(key).await,
        }
    }

    pub async fn put(&self, key: &str, value: StoredValue) -> Result<(), Error> {
        match self {
            StoreHandle::Indexed(s) => s.put(key, value).await,
            StoreHandle::Enumerable(s) => s.put(key, value).await,
            StoreHandle::Opaque(s) => s.put(key, value).await,
        }
    }

    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        match self {
            StoreHandle::Indexed(s) => s.delete(key).await,
            StoreHandle::Enumerable(s) => s.delete(key).await,
            StoreHandle::Opaque(s) => s.delete(key).await,
        }
    }

    pub async fn flush(&self) -> Result<u64, Error> {
        match self {
            StoreHandle::Indexed(s) => s.flush().await,
            StoreHandle::Enumerable(s) => s.flush().await,
            StoreHandle::Opaque(s) => s.flush().await,
        }
    }

    pub async fn purge_expired(&self) -> Result<u64, Error> {
        match self {
            StoreHandle::Indexed(s) => s.purge_expired().await,
            StoreHandle::Enumerable(s) => s.purge_expired().await,
            StoreHandle::Opaque(s) => s.purge_expired().await,
        }
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StoreHandle").field(&self.capability()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stored_value_expiry() {
        let value = StoredValue { expires_at: 1_000, value: serde_json::json!([1, 2, 3]) };
        assert!(!value.is_expired_at(Utc.timestamp_opt(999, 0).unwrap()));
        assert!(value.is_expired_at(Utc.timestamp_opt(1_000, 0).unwrap()));
    }

    #[test]
    fn test_new_value_is_fresh() {
        let value = StoredValue::new(serde_json::json!("x"), Duration::from_secs(60));
        assert!(!value.is_expired());
        assert!(value.expires_at > Utc::now().timestamp());
    }

    #[test]
    fn test_expiry_saturates() {
        assert_eq!(expiry_from_now(Duration::from_secs(u64::MAX)), i64::MAX);
    }
}
