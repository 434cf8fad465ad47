//! Filesystem store backend.
//!
//! Each entry is one file in a flat directory. The filename is the cache key
//! and the content is a JSON [`StoredValue`] envelope. Writes go to a hidden
//! temporary file first and are renamed into place, so readers never see a
//! partial entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use super::store::{CacheStore, EnumerableStore, StoredValue};
use crate::Error;

const TEMP_PREFIX: &str = ".tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reject keys that are not safe as a bare filename.
pub fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".into()));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(Error::InvalidKey(format!("{key:?} contains characters outside [A-Za-z0-9_-]")));
    }
    Ok(())
}

/// One-file-per-key store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Opened file cache store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<StoredValue>, Error> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn remove(path: &Path) -> Result<bool, Error> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Paths of every entry file, skipping in-flight temporaries.
    async fn entry_paths(&self) -> Result<Vec<(String, PathBuf)>, Error> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            paths.push((name, entry.path()));
        }

        Ok(paths)
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, Error> {
        let path = self.path_for(key)?;
        let entry = match self.read_entry(&path).await {
            Ok(entry) => entry,
            Err(Error::Serialization(e)) => {
                tracing::warn!(key, error = %e, "Dropping unreadable cache file");
                Self::remove(&path).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match entry {
            Some(entry) if entry.is_expired() => {
                Self::remove(&path).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<(), Error> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec(&value)?;

        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp = self.dir.join(format!("{TEMP_PREFIX}{}-{seq}-{key}", std::process::id()));

        fs::write(&temp, &bytes).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let path = self.path_for(key)?;
        Self::remove(&path).await
    }

    async fn flush(&self) -> Result<u64, Error> {
        let mut removed = 0;
        for (_, path) in self.entry_paths().await? {
            if Self::remove(&path).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let mut removed = 0;
        for (name, path) in self.entry_paths().await? {
            let expired = match self.read_entry(&path).await {
                Ok(Some(entry)) => entry.is_expired(),
                Ok(None) => false,
                Err(Error::Serialization(_)) => true,
                Err(e) => return Err(e),
            };
            if expired && Self::remove(&path).await? {
                tracing::debug!(key = %name, "Purged expired cache file");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl EnumerableStore for FileStore {
    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.entry_paths().await?.into_iter().map(|(name, _)| name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn fresh(value: serde_json::Value) -> StoredValue {
        StoredValue::new(value, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.put("products_list", fresh(json!([1, 2, 3]))).await.unwrap();
        store.put("products_list_0123abcd", fresh(json!([1]))).await.unwrap();

        assert!(dir.path().join("products_list").is_file());
        assert!(dir.path().join("products_list_0123abcd").is_file());

        let raw = std::fs::read_to_string(dir.path().join("products_list")).unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["value"], json!([1, 2, 3]));
        assert!(envelope["expires_at"].is_i64());
    }

    #[tokio::test]
    async fn test_get_put_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
        store.put("k", fresh(json!("first"))).await.unwrap();
        store.put("k", fresh(json!("second"))).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap().value, json!("second"));
        assert_eq!(store.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for key in ["", "../escape", "a/b", "has space", "dot.ted"] {
            let err = store.put(key, fresh(json!(1))).await.unwrap_err();
            assert!(matches!(err, Error::InvalidKey(_)), "{key:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_expired_file_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.put("old", StoredValue { expires_at: 0, value: json!(1) }).await.unwrap();
        assert!(store.get("old").await.unwrap().is_none());
        assert!(!dir.path().join("old").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        std::fs::write(dir.path().join("broken"), b"not json").unwrap();
        assert!(store.get("broken").await.unwrap().is_none());
        assert!(!dir.path().join("broken").exists());
    }

    #[tokio::test]
    async fn test_flush_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.put("a", fresh(json!(1))).await.unwrap();
        store.put("b", StoredValue { expires_at: 0, value: json!(2) }).await.unwrap();
        store.put("c", fresh(json!(3))).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.keys().await.unwrap().len(), 2);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.flush().await.unwrap(), 1);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_skip_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        std::fs::create_dir(dir.path().join("nested")).unwrap();
        store.put("orders_list", fresh(json!([]))).await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["orders_list".to_string()]);
    }
}
