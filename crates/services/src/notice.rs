//! Recoverable, user-visible notices.
//!
//! Hosts surface these in a banner or status line. None of them stop a session.

use serde::Serialize;
use thiserror::Error;

use course_core::model::ChapterId;

/// A host capability that was requested but not granted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CapabilityError {
    #[error("full-screen request was rejected")]
    FullscreenRejected,
    #[error("clipboard is unavailable")]
    ClipboardUnavailable,
    #[error("{0} is not supported here")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl HostNotice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// A media link that could not be turned into a player.
    #[must_use]
    pub fn media_unavailable(label: &str) -> Self {
        Self::warning(format!("this {label} link cannot be opened here"))
    }

    /// Progress could not be saved; the session keeps running in memory.
    #[must_use]
    pub fn progress_not_saved(chapter_id: ChapterId) -> Self {
        Self::warning(format!(
            "progress for chapter {chapter_id} could not be saved and will be lost on exit"
        ))
    }
}

impl From<CapabilityError> for HostNotice {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::FullscreenRejected => {
                Self::info("full screen is not available; the player stays inline")
            }
            CapabilityError::ClipboardUnavailable => {
                Self::info("copying is not available on this device")
            }
            CapabilityError::Unsupported(_) => Self::info(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_errors_become_info_notices() {
        let notice = HostNotice::from(CapabilityError::FullscreenRejected);
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("full screen"));

        let notice = HostNotice::from(CapabilityError::Unsupported("picture-in-picture".into()));
        assert_eq!(notice.message, "picture-in-picture is not supported here");
    }

    #[test]
    fn unsaved_progress_is_a_warning() {
        let notice = HostNotice::progress_not_saved(ChapterId::new(12));
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("chapter 12"));
    }
}
