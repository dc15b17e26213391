//! Detection regions: normalized rectangles, hotspots, and the descriptors
//! attached to motion events.

use serde::{Deserialize, Serialize};

/// A rectangle in normalized unit-square coordinates.
///
/// All fields are fractions of the frame dimensions in `[0, 1]`, so the
/// same region configuration works at any capture resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Create a new normalized rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// A named rectangular detection region.
///
/// Static configuration: hotspots are registered with the detector at
/// startup and not mutated at runtime. Mutual-exclusivity partners are a
/// property of the accumulator, not the hotspot itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub name: String,
    pub rect: Rect,
}

impl Hotspot {
    /// Create a new hotspot.
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self { name: name.into(), rect }
    }
}

/// Descriptor attached to a motion event, identifying where motion was seen.
///
/// Grid cells carry their row/column indices and no name; hotspots carry a
/// name and no indices.
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    /// A registered, named hotspot.
    Hotspot { name: String, rect: Rect },
    /// An unnamed cell of the uniform detection grid.
    GridCell { row: u32, col: u32, rect: Rect },
}

impl Region {
    /// The hotspot name, if this region is a hotspot.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Region::Hotspot { name, .. } => Some(name),
            Region::GridCell { .. } => None,
        }
    }

    /// The region rectangle.
    #[must_use]
    pub fn rect(&self) -> &Rect {
        match self {
            Region::Hotspot { rect, .. } | Region::GridCell { rect, .. } => rect,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Hotspot { name, .. } => write!(f, "hotspot '{name}'"),
            Region::GridCell { row, col, .. } => write!(f, "cell ({row}, {col})"),
        }
    }
}
