use course_core::model::{AttemptId, ChapterId, QuizAttempt};
use sqlx::Row;

use crate::codec::decode_answers;
use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn chapter_id_to_i64(id: ChapterId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("chapter_id overflow".into()))
}

pub(crate) fn chapter_id_from_i64(v: i64) -> Result<ChapterId, StorageError> {
    u64::try_from(v)
        .map(ChapterId::new)
        .map_err(|_| StorageError::Serialization("chapter_id sign overflow".into()))
}

pub(crate) fn count_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn count_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(AttemptId, QuizAttempt), StorageError> {
    let id = AttemptId::new(row.try_get("id").map_err(ser)?);
    let chapter_id = chapter_id_from_i64(row.try_get("chapter_id").map_err(ser)?)?;
    let score = count_from_i64("score", row.try_get("score").map_err(ser)?)?;
    let total = count_from_i64("total", row.try_get("total").map_err(ser)?)?;
    let answers = decode_answers(&row.try_get::<String, _>("answers").map_err(ser)?)?;
    let elapsed: i64 = row.try_get("elapsed_seconds").map_err(ser)?;
    let elapsed_seconds = u64::try_from(elapsed)
        .map_err(|_| StorageError::Serialization(format!("invalid elapsed_seconds: {elapsed}")))?;
    let submitted_at = row.try_get("submitted_at").map_err(ser)?;

    Ok((
        id,
        QuizAttempt {
            chapter_id,
            score,
            total,
            answers,
            elapsed_seconds,
            submitted_at,
        },
    ))
}
