use thiserror::Error;

use crate::media::ResolverSettingsError;
use crate::model::{QuestionError, QuizSettingsError, SnapshotError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizSettings(#[from] QuizSettingsError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    ResolverSettings(#[from] ResolverSettingsError),
}
