use std::fmt;

use course_core::model::{
    AnswerMap, ChapterId, Question, QuizSettings, QuizSnapshot, batch_count,
};
use rand::Rng;
use tracing::{debug, warn};

use super::order::{pool_order, shuffled_order};
use super::view::{QuestionView, QuizPhase, QuizProgress, QuizResult};
use crate::error::QuizError;

//
// ─── PERSISTENCE INTENT ────────────────────────────────────────────────────────
//

/// What the caller must do with the durable snapshot after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Persistence {
    Unchanged,
    Write(QuizSnapshot),
    Delete,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session for one chapter.
///
/// Pure state machine: it never touches storage itself. Mutations return a
/// `Persistence` intent that `QuizSessionService` applies before returning to the host.
pub struct QuizSession {
    chapter_id: ChapterId,
    settings: QuizSettings,
    pool: Vec<Question>,
    order: Vec<usize>,
    answers: AnswerMap,
    batch_index: usize,
    elapsed_seconds: u64,
    phase: QuizPhase,
    pending_resume: Option<QuizSnapshot>,
}

impl QuizSession {
    /// Create a session in `Loading` with a fresh question order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyPool` if `pool` is empty, or
    /// `QuizError::PoolIndexMismatch` if a question's index is not its position.
    pub fn new<R: Rng + ?Sized>(
        chapter_id: ChapterId,
        pool: Vec<Question>,
        settings: QuizSettings,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        check_pool(&pool)?;
        let order = fresh_order(pool.len(), settings, rng);
        Ok(Self {
            chapter_id,
            settings,
            pool,
            order,
            answers: AnswerMap::new(),
            batch_index: 0,
            elapsed_seconds: 0,
            phase: QuizPhase::Loading,
            pending_resume: None,
        })
    }

    /// Open a finished attempt for review.
    ///
    /// Uses the original pool order and never consults storage.
    ///
    /// # Errors
    ///
    /// Same pool checks as `new`.
    pub fn review(
        chapter_id: ChapterId,
        pool: Vec<Question>,
        settings: QuizSettings,
        answers: AnswerMap,
        elapsed_seconds: u64,
    ) -> Result<Self, QuizError> {
        check_pool(&pool)?;
        let answers = answers
            .iter()
            .filter(|(q, _)| *q < pool.len())
            .collect();
        Ok(Self {
            chapter_id,
            settings,
            order: pool_order(pool.len()),
            pool,
            answers,
            batch_index: 0,
            elapsed_seconds,
            phase: QuizPhase::Completed,
            pending_resume: None,
        })
    }

    /// Finish loading with whatever the store held for this chapter.
    ///
    /// A snapshot that no longer fits the pool is dropped and the quiz starts fresh.
    pub fn load_snapshot(&mut self, snapshot: Option<QuizSnapshot>) {
        if self.phase != QuizPhase::Loading {
            return;
        }
        let usable = snapshot.filter(|s| match s.validate(&self.pool, self.settings.batch_size()) {
            Ok(()) => true,
            Err(err) => {
                warn!(chapter_id = %self.chapter_id, error = %err, "ignoring stale quiz snapshot");
                false
            }
        });

        match usable {
            Some(snapshot) => {
                self.pending_resume = Some(snapshot);
                self.phase = QuizPhase::AwaitingResumeChoice;
            }
            None => self.phase = QuizPhase::InProgress,
        }
    }

    /// Continue from the stored snapshot, reproducing its order, answers and batch.
    ///
    /// Returns `false` unless a resume prompt is pending.
    pub fn resume(&mut self) -> bool {
        if self.phase != QuizPhase::AwaitingResumeChoice {
            return false;
        }
        let Some(snapshot) = self.pending_resume.take() else {
            return false;
        };
        self.order = snapshot.order;
        self.answers = snapshot.answers;
        self.batch_index = snapshot.batch_index;
        self.phase = QuizPhase::InProgress;
        true
    }

    /// Drop progress and start over with a new order.
    ///
    /// Allowed from the resume prompt or while in progress.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Persistence {
        if !matches!(
            self.phase,
            QuizPhase::AwaitingResumeChoice | QuizPhase::InProgress
        ) {
            return Persistence::Unchanged;
        }
        self.pending_resume = None;
        self.order = fresh_order(self.pool.len(), self.settings, rng);
        self.answers = AnswerMap::new();
        self.batch_index = 0;
        self.elapsed_seconds = 0;
        self.phase = QuizPhase::InProgress;
        Persistence::Delete
    }

    /// Record an answer. Ignored unless in progress, the question exists, the
    /// option exists, and the question has not been answered yet.
    pub fn answer(&mut self, pool_index: usize, option: usize) -> Persistence {
        if self.phase != QuizPhase::InProgress {
            return Persistence::Unchanged;
        }
        let Some(question) = self.pool.get(pool_index) else {
            return Persistence::Unchanged;
        };
        if option >= question.options().len() || !self.answers.record(pool_index, option) {
            return Persistence::Unchanged;
        }
        Persistence::Write(self.snapshot())
    }

    pub fn next_batch(&mut self) -> Persistence {
        if self.phase != QuizPhase::InProgress || self.batch_index + 1 >= self.batch_count() {
            return Persistence::Unchanged;
        }
        self.batch_index += 1;
        debug!(chapter_id = %self.chapter_id, batch = self.batch_index, "next batch");
        Persistence::Write(self.snapshot())
    }

    pub fn prev_batch(&mut self) -> Persistence {
        if self.phase != QuizPhase::InProgress || self.batch_index == 0 {
            return Persistence::Unchanged;
        }
        self.batch_index -= 1;
        debug!(chapter_id = %self.chapter_id, batch = self.batch_index, "previous batch");
        Persistence::Write(self.snapshot())
    }

    /// Advance the elapsed timer by one second while in progress.
    pub fn tick(&mut self) -> bool {
        if self.phase != QuizPhase::InProgress {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Enter the confirmation prompt if enough questions are answered.
    pub fn request_submit(&mut self) -> bool {
        if self.phase != QuizPhase::InProgress || !self.can_submit() {
            return false;
        }
        self.phase = QuizPhase::ConfirmingSubmit;
        true
    }

    /// Leave the confirmation prompt without side effects.
    pub fn cancel_submit(&mut self) -> bool {
        if self.phase != QuizPhase::ConfirmingSubmit {
            return false;
        }
        self.phase = QuizPhase::InProgress;
        true
    }

    /// Complete the quiz. Returns the result exactly once; later calls return `None`.
    pub fn confirm_submit(&mut self) -> Option<QuizResult> {
        if self.phase != QuizPhase::ConfirmingSubmit {
            return None;
        }
        self.phase = QuizPhase::Completed;
        Some(self.result())
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn pool(&self) -> &[Question] {
        &self.pool
    }

    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        batch_count(self.pool.len(), self.settings.batch_size())
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Submission needs a full batch answered, or the whole pool if it is smaller.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.answers.len() >= self.settings.submit_threshold(self.pool.len())
    }

    /// Correct answers so far.
    #[must_use]
    pub fn score(&self) -> usize {
        self.answers.score(&self.pool)
    }

    /// True while answers exist that a completed submission has not consumed.
    #[must_use]
    pub fn has_unsaved_progress(&self) -> bool {
        !self.answers.is_empty() && self.phase != QuizPhase::Completed
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot::new(self.order.clone(), self.answers.clone(), self.batch_index)
    }

    /// Questions in session order.
    pub fn ordered_questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.order.iter().filter_map(|&i| self.pool.get(i))
    }

    /// Questions of the active batch, with their display positions.
    #[must_use]
    pub fn current_batch(&self) -> Vec<QuestionView<'_>> {
        let size = self.settings.batch_size();
        let start = self.batch_index.saturating_mul(size).min(self.order.len());
        let end = start.saturating_add(size).min(self.order.len());
        self.order[start..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, &pool_index)| {
                let question = self.pool.get(pool_index)?;
                Some(QuestionView::new(
                    start + offset,
                    question,
                    self.answers.get(pool_index),
                ))
            })
            .collect()
    }

    /// Render state for one question by pool index.
    #[must_use]
    pub fn question_view(&self, pool_index: usize) -> Option<QuestionView<'_>> {
        let question = self.pool.get(pool_index)?;
        let position = self.order.iter().position(|&i| i == pool_index)?;
        Some(QuestionView::new(
            position,
            question,
            self.answers.get(pool_index),
        ))
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            phase: self.phase,
            total: self.pool.len(),
            answered: self.answers.len(),
            batch_index: self.batch_index,
            batch_count: self.batch_count(),
            can_submit: self.can_submit(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }

    /// Result view of the current state. Submission hands this out as an event
    /// once; review screens may rebuild it at any time.
    #[must_use]
    pub fn result(&self) -> QuizResult {
        QuizResult {
            score: self.score(),
            total: self.pool.len(),
            answers: self.answers.clone(),
            ordered_questions: self.ordered_questions().cloned().collect(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }
}

fn check_pool(pool: &[Question]) -> Result<(), QuizError> {
    if pool.is_empty() {
        return Err(QuizError::EmptyPool);
    }
    if let Some((position, question)) = pool
        .iter()
        .enumerate()
        .find(|(position, q)| q.index() != *position)
    {
        return Err(QuizError::PoolIndexMismatch {
            position,
            index: question.index(),
        });
    }
    Ok(())
}

fn fresh_order<R: Rng + ?Sized>(len: usize, settings: QuizSettings, rng: &mut R) -> Vec<usize> {
    if settings.shuffle() {
        shuffled_order(len, rng)
    } else {
        pool_order(len)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("chapter_id", &self.chapter_id)
            .field("pool_len", &self.pool.len())
            .field("answered", &self.answers.len())
            .field("batch_index", &self.batch_index)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::QuestionDraft;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Pool where question `i` has correct option `i % 4`.
    fn pool(n: usize) -> Vec<Question> {
        Question::pool_from_drafts((0..n).map(|i| {
            QuestionDraft::new(format!("Q{i}"), ["a", "b", "c", "d"], i % 4, format!("why {i}"))
        }))
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn started(n: usize) -> QuizSession {
        let mut session =
            QuizSession::new(ChapterId::new(1), pool(n), QuizSettings::default(), &mut rng())
                .unwrap();
        session.load_snapshot(None);
        session
    }

    fn answer_correctly(session: &mut QuizSession, pool_index: usize) {
        let _ = session.answer(pool_index, pool_index % 4);
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = QuizSession::new(ChapterId::new(1), Vec::new(), QuizSettings::default(), &mut rng())
            .unwrap_err();
        assert!(matches!(err, QuizError::EmptyPool));
    }

    #[test]
    fn fresh_session_without_snapshot_is_in_progress() {
        let session = started(5);
        assert_eq!(session.phase(), QuizPhase::InProgress);
        let mut sorted = session.order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unshuffled_settings_keep_pool_order() {
        let settings = QuizSettings::new(50, false).unwrap();
        let session = QuizSession::new(ChapterId::new(1), pool(6), settings, &mut rng()).unwrap();
        assert_eq!(session.order(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn answers_are_final_and_persisted() {
        let mut session = started(3);
        let write = session.answer(2, 1);
        let Persistence::Write(snapshot) = write else {
            panic!("expected a snapshot write");
        };
        assert_eq!(snapshot.answers.get(2), Some(1));

        assert_eq!(session.answer(2, 3), Persistence::Unchanged);
        assert_eq!(session.answers().get(2), Some(1));
    }

    #[test]
    fn invalid_answers_are_ignored() {
        let mut session = started(3);
        assert_eq!(session.answer(7, 0), Persistence::Unchanged);
        assert_eq!(session.answer(0, 4), Persistence::Unchanged);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn answers_are_refused_outside_progress() {
        let mut session =
            QuizSession::new(ChapterId::new(1), pool(3), QuizSettings::default(), &mut rng())
                .unwrap();
        assert_eq!(session.answer(0, 0), Persistence::Unchanged);

        session.load_snapshot(Some(QuizSnapshot::new(vec![2, 1, 0], AnswerMap::new(), 0)));
        assert_eq!(session.phase(), QuizPhase::AwaitingResumeChoice);
        assert_eq!(session.answer(0, 0), Persistence::Unchanged);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn resume_restores_exact_order_answers_and_batch() {
        let settings = QuizSettings::new(2, true).unwrap();
        let mut first = QuizSession::new(ChapterId::new(4), pool(5), settings, &mut rng()).unwrap();
        first.load_snapshot(None);
        let _ = first.answer(first.order()[0], 0);
        let _ = first.next_batch();
        let _ = first.answer(first.order()[3], 2);
        let saved = first.snapshot();

        let mut second =
            QuizSession::new(ChapterId::new(4), pool(5), settings, &mut StdRng::seed_from_u64(5))
                .unwrap();
        second.load_snapshot(Some(saved.clone()));
        assert_eq!(second.phase(), QuizPhase::AwaitingResumeChoice);
        assert!(second.resume());

        assert_eq!(second.phase(), QuizPhase::InProgress);
        assert_eq!(second.order(), first.order());
        assert_eq!(second.answers(), first.answers());
        assert_eq!(second.batch_index(), 1);
        assert!(!second.resume());
    }

    #[test]
    fn stale_snapshot_starts_fresh() {
        let mut session =
            QuizSession::new(ChapterId::new(1), pool(3), QuizSettings::default(), &mut rng())
                .unwrap();
        session.load_snapshot(Some(QuizSnapshot::new(vec![0, 1], AnswerMap::new(), 0)));
        assert_eq!(session.phase(), QuizPhase::InProgress);
        assert!(!session.resume());
    }

    #[test]
    fn restart_clears_everything() {
        let mut session = started(60);
        answer_correctly(&mut session, 3);
        let _ = session.next_batch();
        session.tick();

        assert_eq!(session.restart(&mut rng()), Persistence::Delete);
        assert!(session.answers().is_empty());
        assert_eq!(session.batch_index(), 0);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.phase(), QuizPhase::InProgress);
    }

    #[test]
    fn restart_from_resume_prompt_discards_snapshot() {
        let mut session =
            QuizSession::new(ChapterId::new(1), pool(3), QuizSettings::default(), &mut rng())
                .unwrap();
        let answers: AnswerMap = [(1, 1)].into_iter().collect();
        session.load_snapshot(Some(QuizSnapshot::new(vec![2, 1, 0], answers, 0)));

        assert_eq!(session.restart(&mut rng()), Persistence::Delete);
        assert!(session.answers().is_empty());
        assert!(!session.resume());
    }

    #[test]
    fn batches_clamp_at_both_ends() {
        let mut session = started(120);
        assert_eq!(session.batch_count(), 3);
        assert_eq!(session.prev_batch(), Persistence::Unchanged);

        assert!(matches!(session.next_batch(), Persistence::Write(_)));
        assert!(matches!(session.next_batch(), Persistence::Write(_)));
        assert_eq!(session.batch_index(), 2);
        assert_eq!(session.next_batch(), Persistence::Unchanged);
        assert_eq!(session.batch_index(), 2);

        assert!(matches!(session.prev_batch(), Persistence::Write(_)));
        assert_eq!(session.batch_index(), 1);
    }

    #[test]
    fn current_batch_pages_session_order() {
        let mut session = started(120);
        let _ = session.next_batch();
        let _ = session.next_batch();
        let batch = session.current_batch();
        assert_eq!(batch.len(), 20);
        assert_eq!(batch[0].position, 100);
        assert_eq!(batch[0].question.index(), session.order()[100]);
    }

    #[test]
    fn question_view_reveals_after_answer() {
        let mut session = started(4);
        let before = session.question_view(2).unwrap();
        assert!(!before.is_locked());
        assert!(before.explanation.is_none());

        let _ = session.answer(2, 0);
        let after = session.question_view(2).unwrap();
        assert_eq!(after.selected, Some(0));
        assert_eq!(after.is_correct, Some(false));
        assert_eq!(after.revealed_correct_option, Some(2));
        assert_eq!(after.explanation, Some("why 2"));
    }

    #[test]
    fn small_pool_submission_scenario() {
        let mut session = started(10);
        // 7 right, 3 wrong
        for i in 0..10 {
            let option = if i < 7 { i % 4 } else { (i + 1) % 4 };
            let _ = session.answer(i, option);
        }
        for _ in 0..12 {
            session.tick();
        }

        assert!(session.can_submit());
        assert_eq!(session.score(), 7);
        assert!(session.request_submit());
        assert_eq!(session.phase(), QuizPhase::ConfirmingSubmit);

        let result = session.confirm_submit().unwrap();
        assert_eq!(result.score, 7);
        assert_eq!(result.elapsed_seconds, 12);
        assert_eq!(result.answers.len(), 10);
        let shown: Vec<_> = result.ordered_questions.iter().map(Question::index).collect();
        assert_eq!(shown, session.order());

        assert!(session.confirm_submit().is_none());
        assert_eq!(session.phase(), QuizPhase::Completed);
    }

    #[test]
    fn large_pool_needs_one_full_batch() {
        let mut session = started(120);
        for i in 0..40 {
            let pool_index = session.order()[i];
            answer_correctly(&mut session, pool_index);
        }
        assert!(!session.can_submit());
        assert!(!session.request_submit());

        for i in 40..50 {
            let pool_index = session.order()[i];
            answer_correctly(&mut session, pool_index);
        }
        assert_eq!(session.batch_index(), 0);
        assert!(session.can_submit());
    }

    #[test]
    fn can_submit_ignores_current_batch() {
        let mut session = started(120);
        for i in 60..110 {
            let pool_index = session.order()[i];
            answer_correctly(&mut session, pool_index);
        }
        assert_eq!(session.batch_index(), 0);
        assert!(session.can_submit());
    }

    #[test]
    fn score_is_independent_of_answer_order() {
        let picks = [(0, 0), (5, 1), (9, 3), (3, 2), (6, 2)];
        let mut forward = started(10);
        let mut backward = started(10);
        for &(q, o) in &picks {
            let _ = forward.answer(q, o);
        }
        for &(q, o) in picks.iter().rev() {
            let _ = backward.answer(q, o);
        }
        assert_eq!(forward.answers(), backward.answers());
        assert_eq!(forward.score(), backward.score());
        assert_eq!(forward.score(), 3);
    }

    #[test]
    fn timer_only_runs_in_progress() {
        let mut session = started(2);
        assert!(session.tick());
        let _ = session.answer(0, 0);
        let _ = session.answer(1, 1);
        assert!(session.request_submit());
        assert!(!session.tick());
        assert!(session.cancel_submit());
        assert!(session.tick());
        assert!(session.request_submit());
        let result = session.confirm_submit().unwrap();
        assert_eq!(result.elapsed_seconds, 2);
        assert!(!session.tick());
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn cancel_submit_has_no_side_effects() {
        let mut session = started(2);
        let _ = session.answer(0, 0);
        let _ = session.answer(1, 0);
        let before = session.snapshot();
        assert!(session.request_submit());
        assert!(session.cancel_submit());
        assert_eq!(session.phase(), QuizPhase::InProgress);
        assert_eq!(session.snapshot(), before);
        assert!(!session.cancel_submit());
    }

    #[test]
    fn review_uses_pool_order_and_is_completed() {
        let answers: AnswerMap = [(0, 0), (1, 0), (2, 2), (40, 1)].into_iter().collect();
        let mut session =
            QuizSession::review(ChapterId::new(1), pool(4), QuizSettings::default(), answers, 30)
                .unwrap();
        assert_eq!(session.phase(), QuizPhase::Completed);
        assert_eq!(session.order(), &[0, 1, 2, 3]);
        assert_eq!(session.answers().len(), 3);
        assert_eq!(session.score(), 2);
        assert!(!session.has_unsaved_progress());
        assert_eq!(session.answer(3, 3), Persistence::Unchanged);
        assert_eq!(session.restart(&mut rng()), Persistence::Unchanged);
        assert!(session.confirm_submit().is_none());
    }

    #[test]
    fn answers_never_exceed_order() {
        let mut session = started(8);
        for q in 0..20 {
            for o in 0..5 {
                let _ = session.answer(q % 8, o);
                assert!(session.answers().len() <= session.order().len());
            }
        }
        assert_eq!(session.answers().len(), 8);
    }

    #[test]
    fn unsaved_progress_tracks_answers() {
        let mut session = started(3);
        assert!(!session.has_unsaved_progress());
        let _ = session.answer(0, 0);
        assert!(session.has_unsaved_progress());
    }
}
