use async_trait::async_trait;
use chrono::Utc;
use course_core::model::{ChapterId, QuizSnapshot};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{chapter_id_to_i64, ser};
use crate::codec::{decode_snapshot, encode_snapshot};
use crate::repository::{SnapshotRepository, StorageError};

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn get_snapshot(&self, chapter_id: ChapterId) -> Result<Option<QuizSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM quiz_snapshots WHERE chapter_id = ?1")
            .bind(chapter_id_to_i64(chapter_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        Ok(decode_snapshot(chapter_id, &payload))
    }

    async fn put_snapshot(
        &self,
        chapter_id: ChapterId,
        snapshot: &QuizSnapshot,
    ) -> Result<(), StorageError> {
        let payload = encode_snapshot(snapshot)?;
        sqlx::query(
            r"
                INSERT INTO quiz_snapshots (chapter_id, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(chapter_id) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(chapter_id_to_i64(chapter_id)?)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_snapshot(&self, chapter_id: ChapterId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_snapshots WHERE chapter_id = ?1")
            .bind(chapter_id_to_i64(chapter_id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
