//! Audio volume monitoring.

mod volume;

pub use volume::{TriggerZone, VolumeMonitor};
