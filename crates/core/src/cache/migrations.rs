//! Schema for the SQLite cache backend.
//!
//! `_migrations` records the highest applied schema version. Each pending
//! step runs in its own transaction together with its version row.

use tokio_rusqlite::{Connection, params};

use crate::Error;

/// Schema steps in version order.
const SCHEMA_STEPS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_cache_entries.sql"))];

/// Bring the cache schema up to date.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] naming the step that did not apply.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for (version, sql) in SCHEMA_STEPS.iter().filter(|(version, _)| *version > applied) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("cache schema v{version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "Applied cache schema step");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
