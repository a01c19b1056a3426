#![forbid(unsafe_code)]

pub mod chapter_service;
pub mod course_services;
pub mod error;
pub mod notice;
pub mod quiz;

pub use course_core::Clock;

pub use chapter_service::{ChapterService, PreparedContent};
pub use course_services::CourseServices;
pub use error::{CourseServicesError, QuizError};
pub use notice::{CapabilityError, HostNotice, NoticeLevel};
pub use quiz::{
    ElapsedTicker, QuestionView, QuizPhase, QuizProgress, QuizResult, QuizSession,
    QuizSessionService, QuizSubmission,
};
