use std::sync::Arc;

use course_core::model::QuizSettings;
use course_core::{MediaResolver, ResolverSettings};
use storage::repository::Storage;

use crate::Clock;
use crate::chapter_service::ChapterService;
use crate::error::CourseServicesError;
use crate::quiz::QuizSessionService;

/// Assembles host-facing services over one storage backend.
#[derive(Clone)]
pub struct CourseServices {
    quiz: Arc<QuizSessionService>,
    chapters: Arc<ChapterService>,
}

impl CourseServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `CourseServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        quiz_settings: QuizSettings,
        resolver_settings: ResolverSettings,
    ) -> Result<Self, CourseServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            clock,
            quiz_settings,
            resolver_settings,
        ))
    }

    /// Build services over non-durable storage.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        quiz_settings: QuizSettings,
        resolver_settings: ResolverSettings,
    ) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, quiz_settings, resolver_settings)
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        quiz_settings: QuizSettings,
        resolver_settings: ResolverSettings,
    ) -> Self {
        let quiz = Arc::new(QuizSessionService::from_storage(clock, storage).with_settings(quiz_settings));
        let chapters = Arc::new(ChapterService::new(MediaResolver::new(resolver_settings)));
        Self { quiz, chapters }
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn chapters(&self) -> Arc<ChapterService> {
        Arc::clone(&self.chapters)
    }
}
