//! Download entitlement policy.
//!
//! A pure decision table over the learner's plan tier, the kind of content, and
//! whether the content sits in the premium tier. Unknown or missing plans are
//! denied.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Downloadable content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Document,
}

impl ContentKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "document" | "doc" | "pdf" => Ok(Self::Document),
            _ => Err(UnknownContentKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentKind(pub String);

impl fmt::Display for UnknownContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content kind: {}", self.0)
    }
}

impl std::error::Error for UnknownContentKind {}

//
// ─── PLAN TIERS ────────────────────────────────────────────────────────────────
//

/// Recognized subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanTier {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Lifetime,
}

/// What a tier may download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DownloadAccess {
    Nothing,
    Standard,
    Everything,
}

impl PlanTier {
    /// Parse a free-form plan label.
    ///
    /// Matching ignores case, surrounding whitespace, and `-`/`_` separators, so
    /// `"3-Month"`, `"3 months"` and `"QUARTERLY"` all name the same tier.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        match normalized.as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" | "3 month" | "3 months" => Some(Self::Quarterly),
            "yearly" | "1 year" | "1 years" => Some(Self::Yearly),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }

    fn access(self) -> DownloadAccess {
        match self {
            Self::Weekly | Self::Monthly => DownloadAccess::Nothing,
            Self::Quarterly => DownloadAccess::Standard,
            Self::Yearly | Self::Lifetime => DownloadAccess::Everything,
        }
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

//
// ─── REQUEST / EVALUATION ──────────────────────────────────────────────────────
//

/// Inputs to a download decision, supplied by the host from account and content metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementRequest<'a> {
    pub learner_plan: Option<&'a str>,
    pub content_kind: ContentKind,
    pub is_premium_tier: bool,
}

impl<'a> EntitlementRequest<'a> {
    #[must_use]
    pub fn new(learner_plan: Option<&'a str>, content_kind: ContentKind, premium: bool) -> Self {
        Self {
            learner_plan,
            content_kind,
            is_premium_tier: premium,
        }
    }
}

/// Decide whether the learner may download the content.
///
/// Quarterly plans reach standard videos and documents; yearly and lifetime
/// plans also reach premium videos. Everything else is denied.
#[must_use]
pub fn evaluate(request: &EntitlementRequest<'_>) -> bool {
    let Some(tier) = request.learner_plan.and_then(PlanTier::parse) else {
        return false;
    };

    let required = match (request.content_kind, request.is_premium_tier) {
        (ContentKind::Video, true) => DownloadAccess::Everything,
        (ContentKind::Video, false) | (ContentKind::Document, _) => DownloadAccess::Standard,
    };
    tier.access() >= required
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(plan: Option<&str>, kind: ContentKind, premium: bool) -> bool {
        evaluate(&EntitlementRequest::new(plan, kind, premium))
    }

    #[test]
    fn quarterly_cannot_download_premium_video() {
        assert!(!allowed(Some("quarterly"), ContentKind::Video, true));
        assert!(allowed(Some("quarterly"), ContentKind::Video, false));
    }

    #[test]
    fn quarterly_can_download_documents() {
        assert!(allowed(Some("quarterly"), ContentKind::Document, false));
        assert!(allowed(Some("quarterly"), ContentKind::Document, true));
    }

    #[test]
    fn short_plans_are_denied_everything() {
        for plan in ["weekly", "monthly"] {
            assert!(!allowed(Some(plan), ContentKind::Document, false));
            assert!(!allowed(Some(plan), ContentKind::Video, false));
            assert!(!allowed(Some(plan), ContentKind::Video, true));
        }
    }

    #[test]
    fn long_plans_are_allowed_everything() {
        for plan in ["yearly", "lifetime", "1-year", "1 Year"] {
            assert!(allowed(Some(plan), ContentKind::Document, false));
            assert!(allowed(Some(plan), ContentKind::Video, false));
            assert!(allowed(Some(plan), ContentKind::Video, true));
        }
    }

    #[test]
    fn aliases_collapse_case_and_separators() {
        assert_eq!(PlanTier::parse("3-Month"), Some(PlanTier::Quarterly));
        assert_eq!(PlanTier::parse("  3 months "), Some(PlanTier::Quarterly));
        assert_eq!(PlanTier::parse("QUARTERLY"), Some(PlanTier::Quarterly));
        assert_eq!(PlanTier::parse("1_year"), Some(PlanTier::Yearly));
        assert_eq!(PlanTier::parse("LifeTime"), Some(PlanTier::Lifetime));
    }

    #[test]
    fn unknown_or_missing_plan_is_denied() {
        assert!(!allowed(None, ContentKind::Document, false));
        assert!(!allowed(Some(""), ContentKind::Document, false));
        assert!(!allowed(Some("platinum"), ContentKind::Video, false));
        assert!(!allowed(Some("6 months"), ContentKind::Document, false));
    }

    #[test]
    fn content_kind_parses_labels() {
        assert_eq!("Video".parse::<ContentKind>().unwrap(), ContentKind::Video);
        assert_eq!("pdf".parse::<ContentKind>().unwrap(), ContentKind::Document);
        assert!("audio".parse::<ContentKind>().is_err());
    }
}
