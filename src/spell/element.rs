//! The six spell-building elements.

use serde::{Deserialize, Serialize};

/// One of the six elemental primitives spells are built from.
///
/// Every element has exactly one opposing element, and opposition is an
/// involution: `e.opposing().opposing() == e`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Air,
    Fire,
    Water,
    Earth,
    Light,
    Dark,
}

impl Element {
    /// All elements, in canonical order.
    pub const ALL: [Element; 6] = [
        Element::Air,
        Element::Fire,
        Element::Water,
        Element::Earth,
        Element::Light,
        Element::Dark,
    ];

    /// The element this one opposes (and is opposed by).
    #[must_use]
    pub const fn opposing(self) -> Element {
        match self {
            Element::Air => Element::Earth,
            Element::Earth => Element::Air,
            Element::Fire => Element::Water,
            Element::Water => Element::Fire,
            Element::Light => Element::Dark,
            Element::Dark => Element::Light,
        }
    }

    /// The element's name, as used for hotspot naming and the wire format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Element::Air => "Air",
            Element::Fire => "Fire",
            Element::Water => "Water",
            Element::Earth => "Earth",
            Element::Light => "Light",
            Element::Dark => "Dark",
        }
    }

    /// Parse an element from its name. Non-element names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Element> {
        Element::ALL.into_iter().find(|e| e.name() == name)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
