//! Cache entry operations on the SQLite backend.
//!
//! Entries live in the `cache_entries` table. Prefix invalidation compares
//! the leading characters of each key to the prefix exactly: `_` and `%`
//! are literal and case matters, as with `starts_with` on the other stores.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use super::store::{CacheStore, PrefixStore, StoredValue};
use crate::Error;

impl CacheDb {
    /// Number of rows in the table, expired ones included.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, Error> {
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<Option<StoredValue>, Error> {
                let row: Option<(String, i64)> = conn
                    .query_row(
                        "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                let Some((value, expires_at)) = row else {
                    return Ok(None);
                };

                if now >= expires_at {
                    conn.execute(
                        "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2",
                        params![key, now],
                    )?;
                    return Ok(None);
                }

                Ok(Some(StoredValue { expires_at, value: serde_json::from_str(&value)? }))
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<(), Error> {
        let key = key.to_string();
        let encoded = serde_json::to_string(&value.value)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, value, expires_at, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        expires_at = excluded.expires_at,
                        created_at = excluded.created_at",
                    params![key, encoded, value.expires_at, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn flush(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = chrono::Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl PrefixStore for CacheDb {
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE substr(key, 1, length(?1)) = ?1",
                    params![prefix],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
