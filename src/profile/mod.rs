//! Volume profile construction, landmark derivation and session caching

mod builder;
mod cache;
mod zones;

pub use builder::VolumeProfile;
pub use cache::{ProfilePack, SessionProfileCache};
pub use zones::{extract_zones, Zone, ZoneKind};
