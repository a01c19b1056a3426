use serde::Serialize;
use url::Url;

/// Corner of the embedded frame a zone is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A zone dimension, either fixed or relative to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    Pixels(u32),
    Percent(u8),
}

/// What a tap inside the zone does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "url")]
pub enum ZoneAction {
    None,
    ExternalLink(Url),
}

/// Rectangle a host overlays above an embedded player to cover provider chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectionZone {
    pub anchor: Anchor,
    pub width: Extent,
    pub height: Extent,
    pub blocks_interaction: bool,
    pub action: ZoneAction,
}

impl ProtectionZone {
    fn blocking(anchor: Anchor, width: Extent, height: Extent) -> Self {
        Self {
            anchor,
            width,
            height,
            blocks_interaction: true,
            action: ZoneAction::None,
        }
    }

    /// Provider logo cover. Taps go to the branding link when one is configured,
    /// otherwise they are swallowed.
    fn logo(anchor: Anchor, width: Extent, height: Extent, branding: Option<&Url>) -> Self {
        match branding {
            Some(url) => Self {
                anchor,
                width,
                height,
                blocks_interaction: false,
                action: ZoneAction::ExternalLink(url.clone()),
            },
            None => Self::blocking(anchor, width, height),
        }
    }
}

/// Zones for the YouTube player: share/watch-later cluster, logo, and control bar.
pub(crate) fn youtube_zones(branding: Option<&Url>) -> Vec<ProtectionZone> {
    vec![
        ProtectionZone::blocking(Anchor::TopRight, Extent::Percent(30), Extent::Pixels(60)),
        ProtectionZone::logo(
            Anchor::BottomRight,
            Extent::Pixels(110),
            Extent::Pixels(48),
            branding,
        ),
        ProtectionZone::blocking(Anchor::BottomLeft, Extent::Percent(80), Extent::Pixels(48)),
    ]
}

/// Zones for the Drive previewer: pop-out button and the provider mark.
pub(crate) fn drive_zones(branding: Option<&Url>) -> Vec<ProtectionZone> {
    vec![
        ProtectionZone::blocking(Anchor::TopRight, Extent::Pixels(80), Extent::Pixels(60)),
        ProtectionZone::logo(
            Anchor::BottomRight,
            Extent::Pixels(110),
            Extent::Pixels(48),
            branding,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logo_zone_links_out_when_branding_configured() {
        let url = Url::parse("https://academy.example/").unwrap();
        let zones = youtube_zones(Some(&url));
        let logo = zones
            .iter()
            .find(|z| z.anchor == Anchor::BottomRight)
            .unwrap();
        assert!(!logo.blocks_interaction);
        assert_eq!(logo.action, ZoneAction::ExternalLink(url));
    }

    #[test]
    fn logo_zone_blocks_without_branding() {
        let zones = drive_zones(None);
        assert!(zones.iter().all(|z| z.blocks_interaction));
        assert!(zones.iter().all(|z| z.action == ZoneAction::None));
    }
}
