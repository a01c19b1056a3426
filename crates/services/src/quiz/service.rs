use std::sync::Arc;

use course_core::model::{AttemptId, ChapterId, Question, QuizAttempt, QuizSettings};
use rand::Rng;
use storage::repository::{AttemptRepository, SnapshotRepository, Storage};
use tracing::{debug, info, warn};

use super::engine::{Persistence, QuizSession};
use super::view::QuizResult;
use crate::Clock;
use crate::error::QuizError;

/// Outcome of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub result: QuizResult,
    /// Id of the stored attempt, absent if history could not be written.
    pub attempt_id: Option<AttemptId>,
}

/// Drives `QuizSession`s against the snapshot and attempt stores.
///
/// Every mutating call awaits its storage write before returning.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    settings: QuizSettings,
    snapshots: Arc<dyn SnapshotRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        snapshots: Arc<dyn SnapshotRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            settings: QuizSettings::default(),
            snapshots,
            attempts,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.snapshots),
            Arc::clone(&storage.attempts),
        )
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    //
    // ─── STARTING ──────────────────────────────────────────────────────────────
    //

    /// Start a quiz with a fresh random order, then check for a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an invalid pool or a failed snapshot read.
    pub async fn start(
        &self,
        chapter_id: ChapterId,
        pool: Vec<Question>,
    ) -> Result<QuizSession, QuizError> {
        let session = QuizSession::new(chapter_id, pool, self.settings, &mut rand::rng())?;
        self.finish_loading(session).await
    }

    /// Like `start`, drawing the order from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an invalid pool or a failed snapshot read.
    pub async fn start_with_rng<R: Rng + ?Sized>(
        &self,
        chapter_id: ChapterId,
        pool: Vec<Question>,
        rng: &mut R,
    ) -> Result<QuizSession, QuizError> {
        let session = QuizSession::new(chapter_id, pool, self.settings, rng)?;
        self.finish_loading(session).await
    }

    /// Open a quiz, preferring a supplied completed attempt over any stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an invalid pool or a failed snapshot read.
    pub async fn open(
        &self,
        chapter_id: ChapterId,
        pool: Vec<Question>,
        completed: Option<QuizAttempt>,
    ) -> Result<QuizSession, QuizError> {
        match completed {
            Some(attempt) => self.review(chapter_id, pool, attempt),
            None => self.start(chapter_id, pool).await,
        }
    }

    /// Review the latest stored attempt for the chapter.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoAttempt` if nothing was submitted yet, or a storage error.
    pub async fn open_review(
        &self,
        chapter_id: ChapterId,
        pool: Vec<Question>,
    ) -> Result<QuizSession, QuizError> {
        let attempt = self
            .attempts
            .latest_attempt(chapter_id)
            .await?
            .ok_or(QuizError::NoAttempt)?;
        self.review(chapter_id, pool, attempt)
    }

    /// Submitted attempts for a chapter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if history cannot be read.
    pub async fn history(
        &self,
        chapter_id: ChapterId,
        limit: u32,
    ) -> Result<Vec<(AttemptId, QuizAttempt)>, QuizError> {
        Ok(self.attempts.list_attempts(chapter_id, limit).await?)
    }

    fn review(
        &self,
        chapter_id: ChapterId,
        pool: Vec<Question>,
        attempt: QuizAttempt,
    ) -> Result<QuizSession, QuizError> {
        info!(%chapter_id, score = attempt.score, "opening quiz review");
        QuizSession::review(
            chapter_id,
            pool,
            self.settings,
            attempt.answers,
            attempt.elapsed_seconds,
        )
    }

    async fn finish_loading(&self, mut session: QuizSession) -> Result<QuizSession, QuizError> {
        let chapter_id = session.chapter_id();
        let snapshot = self.snapshots.get_snapshot(chapter_id).await?;
        session.load_snapshot(snapshot);
        info!(
            %chapter_id,
            questions = session.pool().len(),
            phase = ?session.phase(),
            "quiz started"
        );
        Ok(session)
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Accept the pending resume prompt. Nothing is written.
    pub fn resume(&self, session: &mut QuizSession) -> bool {
        let resumed = session.resume();
        if resumed {
            info!(
                chapter_id = %session.chapter_id(),
                answered = session.answers().len(),
                batch = session.batch_index(),
                "quiz resumed"
            );
        }
        resumed
    }

    /// Discard progress and the stored snapshot, then start over.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be deleted. The session
    /// is already reset in memory when this happens.
    pub async fn restart(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let persistence = session.restart(&mut rand::rng());
        let restarted = persistence == Persistence::Delete;
        if restarted {
            info!(chapter_id = %session.chapter_id(), "quiz restarted");
        }
        self.apply(session.chapter_id(), persistence).await?;
        Ok(restarted)
    }

    /// Record an answer and persist the snapshot.
    ///
    /// Returns `false` when the answer was ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be written. The answer
    /// stays recorded in memory.
    pub async fn answer(
        &self,
        session: &mut QuizSession,
        pool_index: usize,
        option: usize,
    ) -> Result<bool, QuizError> {
        let persistence = session.answer(pool_index, option);
        if persistence == Persistence::Unchanged {
            debug!(chapter_id = %session.chapter_id(), pool_index, option, "answer ignored");
            return Ok(false);
        }
        self.apply(session.chapter_id(), persistence).await?;
        Ok(true)
    }

    /// Move to the next batch and persist the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be written.
    pub async fn next_batch(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let persistence = session.next_batch();
        self.apply_move(session.chapter_id(), persistence).await
    }

    /// Move to the previous batch and persist the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be written.
    pub async fn prev_batch(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let persistence = session.prev_batch();
        self.apply_move(session.chapter_id(), persistence).await
    }

    /// Confirm a pending submission.
    ///
    /// Deletes the snapshot and appends the attempt to history. Storage failures
    /// at this point are logged; the result is still returned. Returns `None`
    /// unless the session was confirming.
    pub async fn confirm_submit(&self, session: &mut QuizSession) -> Option<QuizSubmission> {
        let result = session.confirm_submit()?;
        let chapter_id = session.chapter_id();
        info!(
            %chapter_id,
            score = result.score,
            total = result.total,
            elapsed_seconds = result.elapsed_seconds,
            "quiz submitted"
        );

        if let Err(err) = self.snapshots.delete_snapshot(chapter_id).await {
            warn!(%chapter_id, error = %err, "failed to delete quiz snapshot after submit");
        }

        let attempt = QuizAttempt {
            chapter_id,
            score: result.score,
            total: result.total,
            answers: result.answers.clone(),
            elapsed_seconds: result.elapsed_seconds,
            submitted_at: self.clock.now(),
        };
        let attempt_id = match self.attempts.append_attempt(&attempt).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(%chapter_id, error = %err, "failed to record quiz attempt");
                None
            }
        };

        Some(QuizSubmission { result, attempt_id })
    }

    async fn apply_move(
        &self,
        chapter_id: ChapterId,
        persistence: Persistence,
    ) -> Result<bool, QuizError> {
        let moved = persistence != Persistence::Unchanged;
        self.apply(chapter_id, persistence).await?;
        Ok(moved)
    }

    async fn apply(&self, chapter_id: ChapterId, persistence: Persistence) -> Result<(), QuizError> {
        match persistence {
            Persistence::Unchanged => {}
            Persistence::Write(snapshot) => {
                self.snapshots.put_snapshot(chapter_id, &snapshot).await?;
            }
            Persistence::Delete => self.snapshots.delete_snapshot(chapter_id).await?,
        }
        Ok(())
    }
}
