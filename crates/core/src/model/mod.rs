mod attempt;
mod content;
mod ids;
mod progress;
mod question;
mod settings;

pub use attempt::QuizAttempt;
pub use content::{Chapter, ChapterContent};
pub use ids::{AttemptId, ChapterId, ParseIdError};
pub use progress::{AnswerMap, QuizSnapshot, SnapshotError, batch_count};
pub use question::{Question, QuestionDraft, QuestionError};
pub use settings::{QuizSettings, QuizSettingsDraft, QuizSettingsError};
