use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use super::settings::ResolverSettings;
use super::zones::{ProtectionZone, drive_zones, youtube_zones};

// Drive file ids are long opaque tokens; the shape holds across /view, /open,
// /edit and share-link variants.
static DRIVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w-]{25,}").expect("drive id pattern compiles"));

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|/v/|/u/\w/|/embed/|watch\?v=|&v=)([^#&?/]*)")
        .expect("youtube id pattern compiles")
});

const YOUTUBE_ID_LEN: usize = 11;

const YOUTUBE_EMBED_PARAMS: &str = "autoplay=1&rel=0&modestbranding=1&disablekb=1&showinfo=0";

//
// ─── TYPES ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    YouTube,
    Drive,
    Direct,
    Unresolved,
}

/// Embeddable form of a media reference.
///
/// `download_url` is only ever set when the caller passed an allowing entitlement
/// decision, and never for YouTube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMedia {
    pub provider: Provider,
    pub canonical_id: Option<String>,
    pub embed_url: Option<String>,
    pub download_url: Option<String>,
    pub protection_zones: Vec<ProtectionZone>,
}

impl ResolvedMedia {
    #[must_use]
    pub fn unresolved() -> Self {
        Self {
            provider: Provider::Unresolved,
            canonical_id: None,
            embed_url: None,
            download_url: None,
            protection_zones: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.provider != Provider::Unresolved
    }
}

//
// ─── EXTRACTION ────────────────────────────────────────────────────────────────
//

/// First run of 25 or more word characters/hyphens in the URL path and query.
#[must_use]
pub fn extract_drive_id(url: &Url) -> Option<String> {
    let tail = &url[url::Position::BeforePath..];
    DRIVE_ID.find(tail).map(|m| m.as_str().to_string())
}

/// 11-character video id from any of the supported YouTube URL shapes.
#[must_use]
pub fn extract_youtube_id(raw: &str) -> Option<String> {
    let id = YOUTUBE_ID.captures(raw)?.get(1)?.as_str();
    let valid = id.len() == YOUTUBE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| id.to_string())
}

fn parse_lenient(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .or_else(|| Url::parse(&format!("https://{raw}")).ok())
        .filter(|u| u.host_str().is_some())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn is_drive_host(host: &str) -> bool {
    host_matches(host, "drive.google.com") || host_matches(host, "docs.google.com")
}

fn is_youtube_host(host: &str) -> bool {
    ["youtube.com", "youtu.be", "youtube-nocookie.com"]
        .iter()
        .any(|domain| host_matches(host, domain))
}

//
// ─── RESOLVER ──────────────────────────────────────────────────────────────────
//

/// Classifies media URLs and builds embed/download targets.
///
/// Stateless apart from its settings; safe to share between sessions.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    settings: ResolverSettings,
}

impl MediaResolver {
    #[must_use]
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve a raw reference. `download_allowed` is the entitlement decision for
    /// this asset; it is the only way a download link can appear in the result.
    ///
    /// Drive is checked first, then YouTube, then direct document links. Anything
    /// else comes back `Unresolved`.
    #[must_use]
    pub fn resolve(&self, raw: &str, download_allowed: bool) -> ResolvedMedia {
        let raw = raw.trim();
        let Some(url) = parse_lenient(raw) else {
            debug!(reference = raw, "media reference is not a URL");
            return ResolvedMedia::unresolved();
        };
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        let resolved = if is_drive_host(&host) {
            self.resolve_drive(&url, download_allowed)
        } else if is_youtube_host(&host) {
            self.resolve_youtube(raw)
        } else {
            self.resolve_direct(raw, &url, &host, download_allowed)
        };

        if !resolved.is_resolved() {
            debug!(reference = raw, host = %host, "media reference unresolved");
        }
        resolved
    }

    fn resolve_drive(&self, url: &Url, download_allowed: bool) -> ResolvedMedia {
        let Some(id) = extract_drive_id(url) else {
            return ResolvedMedia::unresolved();
        };
        ResolvedMedia {
            provider: Provider::Drive,
            embed_url: Some(format!("https://drive.google.com/file/d/{id}/preview")),
            download_url: download_allowed
                .then(|| format!("https://drive.google.com/uc?id={id}&export=download")),
            protection_zones: drive_zones(self.settings.branding_url()),
            canonical_id: Some(id),
        }
    }

    fn resolve_youtube(&self, raw: &str) -> ResolvedMedia {
        let Some(id) = extract_youtube_id(raw) else {
            return ResolvedMedia::unresolved();
        };
        ResolvedMedia {
            provider: Provider::YouTube,
            embed_url: Some(format!(
                "https://www.youtube.com/embed/{id}?{YOUTUBE_EMBED_PARAMS}"
            )),
            download_url: None,
            protection_zones: youtube_zones(self.settings.branding_url()),
            canonical_id: Some(id),
        }
    }

    /// `url` only classifies the link; the caller's text is what gets returned.
    fn resolve_direct(
        &self,
        raw: &str,
        url: &Url,
        host: &str,
        download_allowed: bool,
    ) -> ResolvedMedia {
        let recognized = matches!(url.scheme(), "http" | "https")
            && (self.settings.has_document_extension(url.path())
                || self.settings.is_trusted_host(host));
        if !recognized {
            return ResolvedMedia::unresolved();
        }
        let target = raw.to_string();
        ResolvedMedia {
            provider: Provider::Direct,
            canonical_id: None,
            download_url: download_allowed.then(|| target.clone()),
            embed_url: Some(target),
            protection_zones: Vec::new(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ResolverSettingsDraft, ZoneAction};

    const DRIVE_TOKEN: &str = "1AbCdEfGhIjKlMnOpQrStUvWxYz0123"; // 31 chars
    const VIDEO_ID: &str = "dQw4w9WgXcQ";

    fn resolver() -> MediaResolver {
        MediaResolver::default()
    }

    #[test]
    fn drive_token_becomes_preview_url() {
        let token = &DRIVE_TOKEN[..30];
        let url = format!("https://drive.google.com/file/d/{token}/view?usp=sharing");
        let media = resolver().resolve(&url, false);

        assert_eq!(media.provider, Provider::Drive);
        assert_eq!(media.canonical_id.as_deref(), Some(token));
        assert_eq!(
            media.embed_url.as_deref(),
            Some(format!("https://drive.google.com/file/d/{token}/preview").as_str())
        );
        assert!(media.download_url.is_none());
        assert!(!media.protection_zones.is_empty());
    }

    #[test]
    fn drive_variants_share_the_same_id() {
        let variants = [
            format!("https://drive.google.com/file/d/{DRIVE_TOKEN}/view"),
            format!("https://drive.google.com/open?id={DRIVE_TOKEN}"),
            format!("https://docs.google.com/document/d/{DRIVE_TOKEN}/edit"),
            format!("drive.google.com/file/d/{DRIVE_TOKEN}"),
        ];
        for url in variants {
            let media = resolver().resolve(&url, false);
            assert_eq!(media.canonical_id.as_deref(), Some(DRIVE_TOKEN), "{url}");
        }
    }

    #[test]
    fn drive_download_requires_entitlement() {
        let url = format!("https://drive.google.com/file/d/{DRIVE_TOKEN}/view");
        let media = resolver().resolve(&url, true);
        assert_eq!(
            media.download_url.as_deref(),
            Some(format!("https://drive.google.com/uc?id={DRIVE_TOKEN}&export=download").as_str())
        );
    }

    #[test]
    fn drive_without_token_is_unresolved() {
        let media = resolver().resolve("https://drive.google.com/drive/my-drive", true);
        assert_eq!(media, ResolvedMedia::unresolved());
    }

    #[test]
    fn youtube_shapes_normalize_to_same_embed() {
        let shapes = [
            format!("https://www.youtube.com/watch?v={VIDEO_ID}"),
            format!("https://youtu.be/{VIDEO_ID}"),
            format!("https://www.youtube.com/embed/{VIDEO_ID}"),
            format!("https://www.youtube.com/v/{VIDEO_ID}?version=3"),
            format!("https://www.youtube.com/watch?feature=share&v={VIDEO_ID}"),
            format!("https://www.youtube.com/user/SomeChannel#p/u/1/{VIDEO_ID}"),
        ];
        let embeds: Vec<_> = shapes
            .iter()
            .map(|s| resolver().resolve(s, true).embed_url)
            .collect();

        let expected = format!(
            "https://www.youtube.com/embed/{VIDEO_ID}?autoplay=1&rel=0&modestbranding=1&disablekb=1&showinfo=0"
        );
        for (shape, embed) in shapes.iter().zip(&embeds) {
            assert_eq!(embed.as_deref(), Some(expected.as_str()), "{shape}");
        }
    }

    #[test]
    fn youtube_never_offers_download() {
        let media = resolver().resolve(&format!("https://youtu.be/{VIDEO_ID}"), true);
        assert_eq!(media.provider, Provider::YouTube);
        assert!(media.download_url.is_none());
        assert_eq!(media.protection_zones.len(), 3);
    }

    #[test]
    fn youtube_without_id_is_unresolved() {
        let media = resolver().resolve("https://www.youtube.com/feed/trending", true);
        assert_eq!(media.provider, Provider::Unresolved);

        let short = resolver().resolve("https://youtu.be/abc", true);
        assert_eq!(short.provider, Provider::Unresolved);
    }

    #[test]
    fn direct_document_passes_through() {
        let url = "https://cdn.example.org/notes/chapter-3.pdf";
        let denied = resolver().resolve(url, false);
        assert_eq!(denied.provider, Provider::Direct);
        assert_eq!(denied.embed_url.as_deref(), Some(url));
        assert!(denied.download_url.is_none());
        assert!(denied.protection_zones.is_empty());

        let allowed = resolver().resolve(url, true);
        assert_eq!(allowed.download_url.as_deref(), Some(url));
    }

    #[test]
    fn direct_link_keeps_caller_text() {
        for raw in [
            "https://CDN.Example.org/notes/Week 1.pdf",
            "cdn.example.org/notes/week1.pdf",
            "https://cdn.example.org:443/notes/week1.pdf",
        ] {
            let media = resolver().resolve(&format!("  {raw} "), true);
            assert_eq!(media.provider, Provider::Direct, "{raw}");
            assert_eq!(media.embed_url.as_deref(), Some(raw));
            assert_eq!(media.download_url.as_deref(), Some(raw));
        }
    }

    #[test]
    fn trusted_host_passes_through_without_extension() {
        let media = resolver().resolve("https://www.dropbox.com/s/abc123/handout", false);
        assert_eq!(media.provider, Provider::Direct);
    }

    #[test]
    fn unknown_page_and_garbage_are_unresolved() {
        assert_eq!(
            resolver().resolve("https://example.org/lesson", true).provider,
            Provider::Unresolved
        );
        assert_eq!(resolver().resolve("", true).provider, Provider::Unresolved);
        assert_eq!(
            resolver().resolve("not a url at all", true).provider,
            Provider::Unresolved
        );
    }

    #[test]
    fn drive_wins_over_youtube_like_paths() {
        let url = format!("https://drive.google.com/file/d/{DRIVE_TOKEN}/embed/{VIDEO_ID}");
        assert_eq!(resolver().resolve(&url, false).provider, Provider::Drive);
    }

    #[test]
    fn branding_link_flows_into_zones() {
        let settings = ResolverSettingsDraft {
            branding_url: Some("https://academy.example/".into()),
            ..ResolverSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let media = MediaResolver::new(settings).resolve(&format!("https://youtu.be/{VIDEO_ID}"), false);
        assert!(
            media
                .protection_zones
                .iter()
                .any(|z| matches!(z.action, ZoneAction::ExternalLink(_)))
        );
    }
}
