// ── Domain model ──
//
// The in-memory tree one account client maintains: systems, each owning
// zones, each zone merging sparse update fragments into a consistent
// picture. Pure data + merge logic; no I/O lives here.

pub mod system;
pub mod zone;

pub use system::System;
pub use zone::{Zone, ZoneConfig, ZoneKey, ZonePeriod, ZoneStatus};
