use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, ChapterId};

/// A submitted quiz attempt, kept for later review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub chapter_id: ChapterId,
    pub score: usize,
    pub total: usize,
    pub answers: AnswerMap,
    pub elapsed_seconds: u64,
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    #[must_use]
    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    /// Score as a whole-number percentage of the pool, rounded down.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.score * 100 / self.total
    }
}
