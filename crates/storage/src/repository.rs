use async_trait::async_trait;
use course_core::model::{AttemptId, ChapterId, QuizAttempt, QuizSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::codec::{decode_snapshot, encode_snapshot};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key-value port for in-progress quiz snapshots, keyed by chapter.
///
/// Writes are idempotent: putting the same snapshot twice leaves the same state.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Fetch the snapshot for a chapter.
    ///
    /// Stored values that fail to decode are returned as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get_snapshot(&self, chapter_id: ChapterId) -> Result<Option<QuizSnapshot>, StorageError>;

    /// Store or replace the snapshot for a chapter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn put_snapshot(
        &self,
        chapter_id: ChapterId,
        snapshot: &QuizSnapshot,
    ) -> Result<(), StorageError>;

    /// Remove the snapshot for a chapter. Removing a missing snapshot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn delete_snapshot(&self, chapter_id: ChapterId) -> Result<(), StorageError>;
}

/// History of submitted attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a submitted attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError>;

    /// Most recent attempt for a chapter, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or decoding failures.
    async fn latest_attempt(&self, chapter_id: ChapterId)
    -> Result<Option<QuizAttempt>, StorageError>;

    /// Attempts for a chapter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or decoding failures.
    async fn list_attempts(
        &self,
        chapter_id: ChapterId,
        limit: u32,
    ) -> Result<Vec<(AttemptId, QuizAttempt)>, StorageError>;
}

/// In-memory repository for tests and for hosts without a durable medium.
///
/// Snapshots are held as encoded text, the same shape a durable store keeps.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<ChapterId, String>>>,
    attempts: Arc<Mutex<Vec<(AttemptId, QuizAttempt)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw payload as-is, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw_snapshot(
        &self,
        chapter_id: ChapterId,
        raw: impl Into<String>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(chapter_id, raw.into());
        Ok(())
    }

    /// Whether a payload exists for the chapter, decodable or not.
    #[must_use]
    pub fn has_snapshot(&self, chapter_id: ChapterId) -> bool {
        self.snapshots
            .lock()
            .map(|guard| guard.contains_key(&chapter_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn get_snapshot(&self, chapter_id: ChapterId) -> Result<Option<QuizSnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&chapter_id)
            .and_then(|raw| decode_snapshot(chapter_id, raw)))
    }

    async fn put_snapshot(
        &self,
        chapter_id: ChapterId,
        snapshot: &QuizSnapshot,
    ) -> Result<(), StorageError> {
        let raw = encode_snapshot(snapshot)?;
        self.put_raw_snapshot(chapter_id, raw)
    }

    async fn delete_snapshot(&self, chapter_id: ChapterId) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&chapter_id);
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))?
            + 1;
        let id = AttemptId::new(next);
        guard.push((id, attempt.clone()));
        Ok(id)
    }

    async fn latest_attempt(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<QuizAttempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .rev()
            .find(|(_, a)| a.chapter_id == chapter_id)
            .map(|(_, a)| a.clone()))
    }

    async fn list_attempts(
        &self,
        chapter_id: ChapterId,
        limit: u32,
    ) -> Result<Vec<(AttemptId, QuizAttempt)>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .filter(|(_, a)| a.chapter_id == chapter_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            snapshots,
            attempts,
        }
    }
}
