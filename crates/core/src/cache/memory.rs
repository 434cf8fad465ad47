//! Process-local store backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{CacheStore, EnumerableStore, StoredValue};
use crate::Error;

/// In-memory store behind an async RwLock.
///
/// Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, Error> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it lazily, unless a writer refreshed it meanwhile.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(StoredValue::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<(), Error> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn flush(&self) -> Result<u64, Error> {
        let mut entries = self.entries.write().await;
        let count = entries.len() as u64;
        entries.clear();
        Ok(count)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        Ok((before - entries.len()) as u64)
    }
}

#[async_trait]
impl EnumerableStore for MemoryStore {
    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store
            .put("products_list", StoredValue::new(json!([1, 2, 3]), Duration::from_secs(60)))
            .await
            .unwrap();

        let entry = store.get("products_list").await.unwrap().unwrap();
        assert_eq!(entry.value, json!([1, 2, 3]));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_dropped() {
        let store = MemoryStore::new();
        store
            .put("k", StoredValue { expires_at: 0, value: json!(1) })
            .await
            .unwrap();

        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_delete_flush() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store
                .put(key, StoredValue::new(json!(key), Duration::from_secs(60)))
                .await
                .unwrap();
        }

        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c"]);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.flush().await.unwrap(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.put("old", StoredValue { expires_at: 0, value: json!(1) }).await.unwrap();
        store
            .put("fresh", StoredValue::new(json!(2), Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}
