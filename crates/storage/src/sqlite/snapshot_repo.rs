use drill_core::model::{SessionSnapshot, UserId};
use sqlx::Row;
use tracing::warn;

use super::{SqliteRepository, mapping::user_id_text};
use crate::repository::{SnapshotRecord, SnapshotRepository, StorageError};

#[async_trait::async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn save_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let record = SnapshotRecord::from_snapshot(user, snapshot)?;

        sqlx::query(
            r"
                INSERT INTO session_snapshots (user_id, payload, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (user_id) DO UPDATE SET
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(user_id_text(user))
        .bind(record.payload)
        .bind(record.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn load_snapshot(&self, user: UserId) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT payload, saved_at
                FROM session_snapshots
                WHERE user_id = ?1
            ",
        )
        .bind(user_id_text(user))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = SnapshotRecord {
            user_id: user,
            payload: row
                .try_get("payload")
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            saved_at: row
                .try_get("saved_at")
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
        };

        // A corrupted payload must never crash the load path.
        match record.into_snapshot() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(%user, error = %err, "discarding unreadable session snapshot");
                Ok(None)
            }
        }
    }

    async fn clear_snapshot(&self, user: UserId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_snapshots WHERE user_id = ?1")
            .bind(user_id_text(user))
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
