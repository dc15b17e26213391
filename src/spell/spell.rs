//! Resolved spells.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::element::Element;

/// The set of elements making up a spell, held sorted and deduplicated.
pub type ElementSet = SmallVec<[Element; 6]>;

/// A spell resolved from accumulated element charges.
///
/// Immutable once created. A fizzled cast is represented as the absence of
/// a spell (`Option<Spell>`), never as a `Spell` value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    /// The spell's name, from the spell book registry.
    pub name: String,

    /// Mean charge of the included elements, floored.
    pub intensity: u32,

    /// The elements the spell was built from, in canonical order.
    pub elements: ElementSet,
}

impl Spell {
    /// Create a spell, normalizing the element set to canonical order.
    pub fn new(name: impl Into<String>, intensity: u32, elements: impl IntoIterator<Item = Element>) -> Self {
        let mut elements: ElementSet = elements.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        Self {
            name: name.into(),
            intensity,
            elements,
        }
    }

    /// Check whether the spell contains an element.
    #[must_use]
    pub fn contains(&self, element: Element) -> bool {
        self.elements.contains(&element)
    }
}

impl std::fmt::Display for Spell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.intensity)
    }
}
