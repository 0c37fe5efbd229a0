//! SQLite queue backend.

use super::QueueStore;
use crate::error::StorageError;
use async_trait::async_trait;
use lodge_sync_types::{unix_millis, LocalId, Payload, PendingWrite, Resolution};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How many fresh ids `enqueue` tries before giving up.
const MAX_ID_ATTEMPTS: u32 = 5;

const SELECT_COLUMNS: &str = "SELECT local_id, payload, enqueued_at, resolved, attempts, \
     last_error, resolution, rejection_reason, resolved_at FROM pending_writes";

/// SQLite-backed queue.
///
/// Uses WAL mode with full synchronous commits, so an `enqueue` that returned
/// survives a crash or power loss.
#[derive(Clone)]
pub struct SqliteQueue {
    pool: SqlitePool,
}

impl SqliteQueue {
    /// Open (creating if missing) the queue database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StorageError::Unavailable)?;

        let queue = Self { pool };
        queue.initialize().await?;
        tracing::debug!(path = %path.display(), "Opened offline queue");
        Ok(queue)
    }

    /// Create an in-memory queue (for testing).
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options =
            SqliteConnectOptions::from_str(":memory:").map_err(StorageError::Unavailable)?;

        // The database lives only as long as its one connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StorageError::Unavailable)?;

        let queue = Self { pool };
        queue.initialize().await?;
        Ok(queue)
    }

    /// Store a row whose payload cannot be decoded.
    #[cfg(test)]
    pub(crate) async fn insert_unreadable(&self, local_id: &str) {
        sqlx::query(
            "INSERT INTO pending_writes (local_id, payload, enqueued_at) VALUES (?1, 'not json', 1)",
        )
        .bind(local_id)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    /// Close the pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<PendingWrite>, StorageError> {
        let rows = sqlx::query_as::<_, WriteRow>(sql)
            .fetch_all(&self.pool)
            .await?;

        let mut writes = Vec::with_capacity(rows.len());
        for row in rows {
            let local_id = row.local_id.clone();
            match PendingWrite::try_from(row) {
                Ok(write) => writes.push(write),
                Err(e) => {
                    // Leave it in place so it can be inspected or discarded.
                    tracing::error!(local_id = %local_id, "Skipping unreadable queue record: {}", e);
                }
            }
        }
        Ok(writes)
    }
}

#[async_trait]
impl QueueStore for SqliteQueue {
    async fn initialize(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_writes (
                local_id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                enqueued_at INTEGER NOT NULL,
                resolved INTEGER NOT NULL DEFAULT 0,
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                resolution TEXT,
                rejection_reason TEXT,
                resolved_at INTEGER
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Unavailable)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_writes_resolved \
             ON pending_writes(resolved, enqueued_at)",
        )
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Unavailable)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_writes_resolved_at \
             ON pending_writes(resolved_at)",
        )
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Unavailable)?;

        tx.commit().await.map_err(StorageError::Unavailable)?;
        Ok(())
    }

    async fn enqueue(&self, payload: &Payload) -> Result<LocalId, StorageError> {
        let body = serde_json::to_string(payload)?;
        let now = unix_millis() as i64;

        for _ in 0..MAX_ID_ATTEMPTS {
            let local_id = LocalId::generate();

            // enqueued_at never goes below the newest existing row, even if
            // the wall clock stepped backwards.
            let result = sqlx::query(
                r#"
                INSERT INTO pending_writes (local_id, payload, enqueued_at)
                VALUES (?1, ?2, MAX(?3, COALESCE((SELECT MAX(enqueued_at) FROM pending_writes), 0)))
                "#,
            )
            .bind(local_id.as_str())
            .bind(&body)
            .bind(now)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    tracing::debug!(local_id = %local_id, "Queued booking write");
                    return Ok(local_id);
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    tracing::warn!(local_id = %local_id, "Local id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::IdCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    async fn list_pending(&self) -> Result<Vec<PendingWrite>, StorageError> {
        self.fetch_rows(&format!(
            "{SELECT_COLUMNS} WHERE resolved = 0 ORDER BY enqueued_at ASC, rowid ASC"
        ))
        .await
    }

    async fn mark_resolved(
        &self,
        local_id: &LocalId,
        resolution: Resolution,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_writes
            SET resolved = 1, resolution = ?2, rejection_reason = ?3, resolved_at = ?4
            WHERE local_id = ?1 AND resolved = 0
            "#,
        )
        .bind(local_id.as_str())
        .bind(resolution.as_str())
        .bind(resolution.reason())
        .bind(unix_millis() as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_deferral(
        &self,
        local_id: &LocalId,
        reason: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE pending_writes
            SET attempts = attempts + 1, last_error = ?2
            WHERE local_id = ?1 AND resolved = 0
            "#,
        )
        .bind(local_id.as_str())
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn discard(&self, local_id: &LocalId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM pending_writes WHERE local_id = ?1")
            .bind(local_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn pending_count(&self) -> Result<u64, StorageError> {
        // Must agree with list_pending, which skips unreadable rows.
        Ok(self.list_pending().await?.len() as u64)
    }

    async fn get(&self, local_id: &LocalId) -> Result<Option<PendingWrite>, StorageError> {
        let row = sqlx::query_as::<_, WriteRow>(&format!("{SELECT_COLUMNS} WHERE local_id = ?1"))
            .bind(local_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_rejected(&self) -> Result<Vec<PendingWrite>, StorageError> {
        self.fetch_rows(&format!(
            "{SELECT_COLUMNS} WHERE resolved = 1 AND resolution = 'rejected' \
             ORDER BY resolved_at ASC, rowid ASC"
        ))
        .await
    }

    async fn purge_resolved(&self, max_age: Duration) -> Result<u64, StorageError> {
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        let cutoff = i64::try_from(unix_millis().saturating_sub(max_age_ms)).unwrap_or(i64::MAX);

        let result = sqlx::query(
            r#"
            DELETE FROM pending_writes WHERE resolved = 1 AND resolved_at <= ?1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct WriteRow {
    local_id: String,
    payload: String,
    enqueued_at: i64,
    resolved: bool,
    attempts: i64,
    last_error: Option<String>,
    resolution: Option<String>,
    rejection_reason: Option<String>,
    resolved_at: Option<i64>,
}

impl TryFrom<WriteRow> for PendingWrite {
    type Error = StorageError;

    fn try_from(row: WriteRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StorageError::Corrupt {
            local_id: row.local_id.clone(),
            reason,
        };

        let payload = match serde_json::from_str::<serde_json::Value>(&row.payload) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return Err(corrupt("payload is not a JSON object".into())),
            Err(e) => return Err(corrupt(format!("payload is not valid JSON: {e}"))),
        };

        let resolution = match row.resolution.as_deref() {
            None => None,
            Some("accepted") => Some(Resolution::Accepted),
            Some("rejected") => Some(Resolution::Rejected {
                reason: row.rejection_reason.clone().unwrap_or_default(),
            }),
            Some(other) => return Err(corrupt(format!("unknown resolution {other:?}"))),
        };

        Ok(PendingWrite {
            local_id: LocalId::from_string(row.local_id),
            payload,
            enqueued_at: row.enqueued_at.max(0) as u64,
            resolved: row.resolved,
            attempts: u32::try_from(row.attempts).unwrap_or(u32::MAX),
            last_error: row.last_error,
            resolution,
            resolved_at: row.resolved_at.map(|t| t.max(0) as u64),
        })
    }
}
