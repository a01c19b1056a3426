//! Media reference resolution.
//!
//! Turns raw third-party video/document URLs into embeddable configurations,
//! plus the overlay zones a host places above the embedded frame.

mod resolver;
mod settings;
mod zones;

pub use resolver::{MediaResolver, Provider, ResolvedMedia, extract_drive_id, extract_youtube_id};
pub use settings::{ResolverSettings, ResolverSettingsDraft, ResolverSettingsError};
pub use zones::{Anchor, Extent, ProtectionZone, ZoneAction};
