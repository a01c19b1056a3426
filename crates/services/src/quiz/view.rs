use course_core::model::{AnswerMap, Question};
use serde::Serialize;

/// Lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    Loading,
    AwaitingResumeChoice,
    InProgress,
    ConfirmingSubmit,
    Completed,
}

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    pub phase: QuizPhase,
    pub total: usize,
    pub answered: usize,
    pub batch_index: usize,
    pub batch_count: usize,
    pub can_submit: bool,
    pub elapsed_seconds: u64,
}

/// Render state for one question.
///
/// Once answered, `selected` is fixed and the correct option and explanation are
/// revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView<'a> {
    pub position: usize,
    pub question: &'a Question,
    pub selected: Option<usize>,
    pub is_correct: Option<bool>,
    pub revealed_correct_option: Option<usize>,
    pub explanation: Option<&'a str>,
}

impl<'a> QuestionView<'a> {
    pub(crate) fn new(position: usize, question: &'a Question, selected: Option<usize>) -> Self {
        let answered = selected.is_some();
        Self {
            position,
            question,
            selected,
            is_correct: selected.map(|option| question.is_correct(option)),
            revealed_correct_option: answered.then(|| question.correct_option()),
            explanation: answered.then(|| question.explanation()),
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.selected.is_some()
    }
}

/// Emitted once when a quiz is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub answers: AnswerMap,
    /// Questions in the order the learner saw them.
    pub ordered_questions: Vec<Question>,
    pub elapsed_seconds: u64,
}
