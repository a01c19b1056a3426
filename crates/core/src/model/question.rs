use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {index}: text cannot be empty")]
    EmptyText { index: usize },

    #[error("question {index}: at least two options are required, got {len}")]
    TooFewOptions { index: usize, len: usize },

    #[error("question {index}: option {option} cannot be empty")]
    EmptyOption { index: usize, option: usize },

    #[error("question {index}: correct option {correct} is out of range (options: {len})")]
    CorrectOptionOutOfRange {
        index: usize,
        correct: usize,
        len: usize,
    },

    #[error("question pool cannot be empty")]
    EmptyPool,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// `index` is the position in the original pool. Answers and snapshots are keyed
/// by it, never by the on-screen position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    index: usize,
    text: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: String,
}

impl Question {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        self.correct_option == option
    }

    /// Validate a list of drafts into a pool, assigning pool indices in order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPool` for an empty list, or the first
    /// per-question validation failure.
    pub fn pool_from_drafts(
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Vec<Question>, QuestionError> {
        let pool = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| draft.validate(index))
            .collect::<Result<Vec<_>, _>>()?;
        if pool.is_empty() {
            return Err(QuestionError::EmptyPool);
        }
        Ok(pool)
    }
}

//
// ─── DRAFT (unvalidated input) ─────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from content metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    #[serde(alias = "correctOptionIndex", alias = "correct")]
    pub correct_option: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionDraft {
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_option: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_option,
            explanation: explanation.into(),
        }
    }

    /// Validate the draft and pin it to its pool index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or any option is blank, fewer than two
    /// options are given, or the correct option does not exist.
    pub fn validate(self, index: usize) -> Result<Question, QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText { index });
        }
        let len = self.options.len();
        if len < 2 {
            return Err(QuestionError::TooFewOptions { index, len });
        }
        if let Some(option) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index, option });
        }
        if self.correct_option >= len {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index,
                correct: self.correct_option,
                len,
            });
        }

        Ok(Question {
            index,
            text: self.text,
            options: self.options,
            correct_option: self.correct_option,
            explanation: self.explanation,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
