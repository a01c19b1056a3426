#![forbid(unsafe_code)]

pub mod entitlement;
pub mod error;
pub mod media;
pub mod model;
pub mod time;

pub use entitlement::{ContentKind, EntitlementRequest, PlanTier};
pub use error::Error;
pub use media::{MediaResolver, Provider, ResolvedMedia, ResolverSettings};
pub use time::Clock;
