//! Elements, spells, and the spell book.

mod book;
mod element;
#[allow(clippy::module_inception)]
mod spell;

pub use book::{DamageBreakdown, SpellBook, DEFAULT_CHARGE_THRESHOLD, DEFAULT_MAXIMUM_DAMAGE};
pub use element::Element;
pub use spell::{ElementSet, Spell};
