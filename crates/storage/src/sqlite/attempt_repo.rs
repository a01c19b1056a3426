use async_trait::async_trait;
use course_core::model::{AttemptId, ChapterId, QuizAttempt};

use super::SqliteRepository;
use super::mapping::{chapter_id_to_i64, count_to_i64, map_attempt_row};
use crate::codec::encode_answers;
use crate::repository::{AttemptRepository, StorageError};

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let elapsed = i64::try_from(attempt.elapsed_seconds)
            .map_err(|_| StorageError::Serialization("elapsed_seconds overflow".into()))?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    chapter_id, score, total, answers, elapsed_seconds, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(chapter_id_to_i64(attempt.chapter_id)?)
        .bind(count_to_i64("score", attempt.score)?)
        .bind(count_to_i64("total", attempt.total)?)
        .bind(encode_answers(&attempt.answers)?)
        .bind(elapsed)
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(AttemptId::new(res.last_insert_rowid()))
    }

    async fn latest_attempt(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<QuizAttempt>, StorageError> {
        let mut rows = self.list_attempts(chapter_id, 1).await?;
        Ok(rows.pop().map(|(_, attempt)| attempt))
    }

    async fn list_attempts(
        &self,
        chapter_id: ChapterId,
        limit: u32,
    ) -> Result<Vec<(AttemptId, QuizAttempt)>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, chapter_id, score, total, answers, elapsed_seconds, submitted_at
                FROM quiz_attempts
                WHERE chapter_id = ?1
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(chapter_id_to_i64(chapter_id)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_attempt_row).collect()
    }
}
