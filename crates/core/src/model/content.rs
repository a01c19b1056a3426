use serde::{Deserialize, Serialize};

use crate::model::{ChapterId, QuestionDraft};

/// The body of a chapter. Exactly one variant is active per chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChapterContent {
    NotesImage {
        url: String,
    },
    NotesHtml {
        html: String,
    },
    Mcq {
        questions: Vec<QuestionDraft>,
    },
    Video {
        url: String,
        #[serde(default)]
        premium: bool,
    },
    Document {
        url: String,
        #[serde(default)]
        premium: bool,
    },
    Markdown {
        text: String,
    },
}

impl ChapterContent {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotesImage { .. } => "notes_image",
            Self::NotesHtml { .. } => "notes_html",
            Self::Mcq { .. } => "mcq",
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
            Self::Markdown { .. } => "markdown",
        }
    }
}

/// A unit of course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub content: ChapterContent,
}
