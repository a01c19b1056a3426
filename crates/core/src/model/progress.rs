use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a persisted snapshot cannot be applied to the current question pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot order has {found} entries, pool has {expected}")]
    OrderLength { expected: usize, found: usize },

    #[error("snapshot order is not a permutation of the pool")]
    NotAPermutation,

    #[error("answer recorded for unknown question {index}")]
    UnknownQuestion { index: usize },

    #[error("answer for question {index} selects missing option {option}")]
    UnknownOption { index: usize, option: usize },

    #[error("batch index {batch_index} is out of range ({batch_count} batches)")]
    BatchOutOfRange {
        batch_index: usize,
        batch_count: usize,
    },
}

//
// ─── ANSWER MAP ────────────────────────────────────────────────────────────────
//

/// Selected option per question, keyed by pool index.
///
/// Entries are write-once: a recorded answer cannot be replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, usize>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `question` unless it was already answered.
    ///
    /// Returns `true` when the answer was stored.
    pub fn record(&mut self, question: usize, option: usize) -> bool {
        if self.0.contains_key(&question) {
            return false;
        }
        self.0.insert(question, option);
        true
    }

    #[must_use]
    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(&question).copied()
    }

    #[must_use]
    pub fn contains(&self, question: usize) -> bool {
        self.0.contains_key(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(pool_index, option)` pairs in pool-index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(q, o)| (*q, *o))
    }

    /// Number of answers matching the correct option of their question.
    ///
    /// Answers pointing outside the pool count as wrong.
    #[must_use]
    pub fn score(&self, pool: &[Question]) -> usize {
        self.iter()
            .filter(|(q, o)| pool.get(*q).is_some_and(|question| question.is_correct(*o)))
            .count()
    }

    fn check_against(&self, pool: &[Question]) -> Result<(), SnapshotError> {
        for (index, option) in self.iter() {
            let question = pool
                .get(index)
                .ok_or(SnapshotError::UnknownQuestion { index })?;
            if option >= question.options().len() {
                return Err(SnapshotError::UnknownOption { index, option });
            }
        }
        Ok(())
    }
}

impl FromIterator<(usize, usize)> for AnswerMap {
    /// Collects pairs keeping the first answer seen for each question.
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (q, o) in iter {
            map.record(q, o);
        }
        map
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Durable projection of an in-progress quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub order: Vec<usize>,
    pub answers: AnswerMap,
    #[serde(alias = "batchIndex")]
    pub batch_index: usize,
}

impl QuizSnapshot {
    #[must_use]
    pub fn new(order: Vec<usize>, answers: AnswerMap, batch_index: usize) -> Self {
        Self {
            order,
            answers,
            batch_index,
        }
    }

    /// Check that the snapshot still describes `pool` under the given batch size.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` when the order is not a permutation of the pool,
    /// an answer references a missing question/option, or the batch is out of range.
    pub fn validate(&self, pool: &[Question], batch_size: usize) -> Result<(), SnapshotError> {
        if self.order.len() != pool.len() {
            return Err(SnapshotError::OrderLength {
                expected: pool.len(),
                found: self.order.len(),
            });
        }
        let mut seen = vec![false; pool.len()];
        for &index in &self.order {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(SnapshotError::NotAPermutation),
            }
        }
        self.answers.check_against(pool)?;

        let batch_count = batch_count(pool.len(), batch_size);
        if self.batch_index >= batch_count {
            return Err(SnapshotError::BatchOutOfRange {
                batch_index: self.batch_index,
                batch_count,
            });
        }
        Ok(())
    }
}

/// Number of batches needed to page `total` questions, at least one.
#[must_use]
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1)).max(1)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
