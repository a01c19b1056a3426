//! JSON encoding for values stored as text blobs.

use course_core::model::{AnswerMap, ChapterId, QuizSnapshot};
use tracing::warn;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Encode a snapshot for storage.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_snapshot(snapshot: &QuizSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(ser)
}

/// Decode a stored snapshot.
///
/// A payload that does not decode is reported as absent so the quiz starts fresh.
#[must_use]
pub fn decode_snapshot(chapter_id: ChapterId, raw: &str) -> Option<QuizSnapshot> {
    match serde_json::from_str(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(%chapter_id, error = %err, "discarding undecodable quiz snapshot");
            None
        }
    }
}

/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_answers(answers: &AnswerMap) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is not an answer map.
pub fn decode_answers(raw: &str) -> Result<AnswerMap, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_snapshot_decodes_as_absent() {
        assert!(decode_snapshot(ChapterId::new(1), "{not json").is_none());
        assert!(decode_snapshot(ChapterId::new(1), r#"{"order":"x"}"#).is_none());
    }

    #[test]
    fn snapshot_survives_encoding() {
        let answers: AnswerMap = [(1, 0), (2, 3)].into_iter().collect();
        let snapshot = QuizSnapshot::new(vec![2, 1, 0], answers, 0);
        let raw = encode_snapshot(&snapshot).unwrap();
        assert_eq!(decode_snapshot(ChapterId::new(1), &raw), Some(snapshot));
    }

    #[test]
    fn bad_answers_are_an_error() {
        assert!(matches!(
            decode_answers("[1,2]"),
            Err(StorageError::Serialization(_))
        ));
    }
}
