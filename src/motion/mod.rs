//! Motion detection and accumulation.
//!
//! A stream of RGBA frames flows through the [`MotionDetector`], which
//! scores per-region activity by frame differencing and emits confidence
//! events into a [`MotionSink`]. The [`HotspotMotionAccumulator`] is the
//! engine's sink: it integrates confidence over time per named hotspot,
//! with decay and mutual exclusivity, producing the charge table the spell
//! book resolves at the end of an attack or defend phase.

mod accumulator;
mod detector;
mod frame;
mod region;

pub use accumulator::HotspotMotionAccumulator;
pub use detector::{MotionDetector, MotionEvent, MotionSink};
pub use frame::FrameBuffer;
pub use region::{Hotspot, Rect, Region};
