use course_core::entitlement::{self, ContentKind, EntitlementRequest};
use course_core::model::{Chapter, ChapterContent, Question};
use course_core::{MediaResolver, ResolvedMedia};
use tracing::debug;

use crate::error::QuizError;
use crate::notice::HostNotice;

/// Chapter content ready for a host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedContent {
    Image {
        url: String,
    },
    Html {
        html: String,
    },
    Markdown {
        text: String,
    },
    Quiz {
        pool: Vec<Question>,
    },
    Media {
        kind: ContentKind,
        media: ResolvedMedia,
        download_allowed: bool,
    },
    Unavailable {
        notice: HostNotice,
    },
}

/// Turns stored chapter content into render-ready values.
#[derive(Debug, Clone, Default)]
pub struct ChapterService {
    resolver: MediaResolver,
}

impl ChapterService {
    #[must_use]
    pub fn new(resolver: MediaResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    /// Prepare `content` for a learner on `learner_plan`.
    ///
    /// Media links that cannot be resolved come back as `Unavailable` with a notice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Question` if a multiple-choice chapter holds an invalid
    /// question, or `QuizError::EmptyPool` if it holds none.
    pub fn prepare(
        &self,
        content: &ChapterContent,
        learner_plan: Option<&str>,
    ) -> Result<PreparedContent, QuizError> {
        let prepared = match content {
            ChapterContent::NotesImage { url } => PreparedContent::Image { url: url.clone() },
            ChapterContent::NotesHtml { html } => PreparedContent::Html { html: html.clone() },
            ChapterContent::Markdown { text } => PreparedContent::Markdown { text: text.clone() },
            ChapterContent::Mcq { questions } => {
                if questions.is_empty() {
                    return Err(QuizError::EmptyPool);
                }
                PreparedContent::Quiz {
                    pool: Question::pool_from_drafts(questions.iter().cloned())?,
                }
            }
            ChapterContent::Video { url, premium } => {
                self.prepare_media(url, ContentKind::Video, *premium, learner_plan)
            }
            ChapterContent::Document { url, premium } => {
                self.prepare_media(url, ContentKind::Document, *premium, learner_plan)
            }
        };
        Ok(prepared)
    }

    /// Prepare a whole chapter.
    ///
    /// # Errors
    ///
    /// Same as `prepare`.
    pub fn prepare_chapter(
        &self,
        chapter: &Chapter,
        learner_plan: Option<&str>,
    ) -> Result<PreparedContent, QuizError> {
        debug!(chapter_id = %chapter.id, kind = chapter.content.label(), "preparing chapter");
        self.prepare(&chapter.content, learner_plan)
    }

    fn prepare_media(
        &self,
        url: &str,
        kind: ContentKind,
        premium: bool,
        learner_plan: Option<&str>,
    ) -> PreparedContent {
        let download_allowed =
            entitlement::evaluate(&EntitlementRequest::new(learner_plan, kind, premium));
        let media = self.resolver.resolve(url, download_allowed);
        if !media.is_resolved() {
            return PreparedContent::Unavailable {
                notice: HostNotice::media_unavailable(kind.label()),
            };
        }
        PreparedContent::Media {
            kind,
            media,
            download_allowed,
        }
    }
}
