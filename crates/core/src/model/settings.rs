use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("batch size must be > 0")]
    InvalidBatchSize,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Configuration for a quiz session.
///
/// - `batch_size`: questions per page, also the minimum answered count required
///   before submission (capped at the pool size)
/// - `shuffle`: draw a random question order for fresh sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    batch_size: usize,
    shuffle: bool,
}

impl QuizSettings {
    pub const DEFAULT_BATCH_SIZE: usize = 50;

    /// Creates validated quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError::InvalidBatchSize` if `batch_size` is zero.
    pub fn new(batch_size: usize, shuffle: bool) -> Result<Self, QuizSettingsError> {
        if batch_size == 0 {
            return Err(QuizSettingsError::InvalidBatchSize);
        }
        Ok(Self {
            batch_size,
            shuffle,
        })
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Answers required before submission is allowed for a pool of `total` questions.
    #[must_use]
    pub fn submit_threshold(&self, total: usize) -> usize {
        self.batch_size.min(total)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            shuffle: true,
        }
    }
}

/// Unvalidated settings, e.g. parsed from the environment or CLI flags.
#[derive(Debug, Clone, Default)]
pub struct QuizSettingsDraft {
    pub batch_size: Option<usize>,
    pub shuffle: Option<bool>,
}

impl QuizSettingsDraft {
    /// Fill missing values from defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError` if the resulting settings are invalid.
    pub fn validate(self) -> Result<QuizSettings, QuizSettingsError> {
        let defaults = QuizSettings::default();
        QuizSettings::new(
            self.batch_size.unwrap_or(defaults.batch_size),
            self.shuffle.unwrap_or(defaults.shuffle),
        )
    }
}
