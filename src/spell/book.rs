//! The spell book: spell definitions, charge resolution, and damage.
//!
//! The book maps canonical element sets to spell names, resolves a charge
//! table into a spell (or a fizzle), and computes the damage of an
//! attack/counter pair. Intermediate damage values are retained on the book
//! for diagnostic inspection after each calculation.

use rustc_hash::FxHashMap;

use super::element::Element;
use super::spell::{ElementSet, Spell};

/// Default charge an element must reach to be included in a spell.
pub const DEFAULT_CHARGE_THRESHOLD: f64 = 10.0;

/// Default maximum damage a spell can deal.
pub const DEFAULT_MAXIMUM_DAMAGE: u32 = 40;

/// Counter-spell multiplier applied even with no opposing elements.
const BASE_INTENSITY_MULTIPLIER: f64 = 0.1;

/// Added to the multiplier for each attack element the counter opposes.
const OPPOSING_ELEMENT_BONUS: f64 = 0.4;

/// Intensity at which remaining damage saturates.
const INTENSITY_NORMALIZATION: f64 = 200.0;

/// Intermediate values of the most recent damage calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageBreakdown {
    pub intensity_multiplier: f64,
    pub remaining_intensity: f64,
    pub scaled_intensity: f64,
    pub damage: u32,
}

/// Registry of spells and the rules for resolving and countering them.
///
/// ## Example
///
/// ```
/// use incanter::spell::{Element, SpellBook};
///
/// let book = SpellBook::new();
///
/// assert_eq!(book.spell_name([Element::Fire]), Some("Fireball"));
/// assert_eq!(
///     book.spell_name([Element::Dark, Element::Light]),
///     Some("Negation"),
/// );
/// ```
#[derive(Debug)]
pub struct SpellBook {
    charge_threshold: f64,
    maximum_damage: u32,
    spells: FxHashMap<ElementSet, String>,
    last_damage: Option<DamageBreakdown>,
}

impl Default for SpellBook {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellBook {
    /// Create a spell book containing the default spells.
    #[must_use]
    pub fn new() -> Self {
        let mut book = Self {
            charge_threshold: DEFAULT_CHARGE_THRESHOLD,
            maximum_damage: DEFAULT_MAXIMUM_DAMAGE,
            spells: FxHashMap::default(),
            last_damage: None,
        };
        book.add_default_spells();
        book
    }

    /// Create an empty spell book with a custom threshold and damage cap.
    #[must_use]
    pub fn with_rules(charge_threshold: f64, maximum_damage: u32) -> Self {
        Self {
            charge_threshold,
            maximum_damage,
            spells: FxHashMap::default(),
            last_damage: None,
        }
    }

    /// The charge threshold for element inclusion.
    #[must_use]
    pub fn charge_threshold(&self) -> f64 {
        self.charge_threshold
    }

    /// The maximum damage a spell can deal.
    #[must_use]
    pub fn maximum_damage(&self) -> u32 {
        self.maximum_damage
    }

    /// Number of registered spells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }

    /// Check if the book has no spells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    /// Register a spell for an element combination.
    ///
    /// The element set is canonicalized (sorted, deduplicated), so
    /// registration order within the set is irrelevant. The first spell
    /// registered for a combination wins; later registrations for the same
    /// combination are ignored.
    pub fn add_spell(&mut self, name: impl Into<String>, elements: impl IntoIterator<Item = Element>) {
        let key = canonical_key(elements);
        self.spells.entry(key).or_insert_with(|| name.into());
    }

    /// Look up the spell name for an element combination.
    #[must_use]
    pub fn spell_name(&self, elements: impl IntoIterator<Item = Element>) -> Option<&str> {
        self.spells.get(&canonical_key(elements)).map(String::as_str)
    }

    /// Resolve a charge table into a spell.
    ///
    /// Every enumerated element whose charge meets the threshold is
    /// included; table keys that are not element names are ignored. The
    /// spell's intensity is the floored mean of the included charges.
    /// Returns `None` (a fizzle) if no elements qualify or no spell is
    /// registered for the qualifying combination.
    #[must_use]
    pub fn generate_spell(&self, charges: &FxHashMap<String, f64>) -> Option<Spell> {
        let mut included: ElementSet = ElementSet::new();
        let mut intensity = 0.0;

        for (name, &charge) in charges {
            let Some(element) = Element::from_name(name) else { continue };
            if charge >= self.charge_threshold {
                included.push(element);
                intensity += charge;
            }
        }
        if included.is_empty() {
            return None;
        }

        intensity /= included.len() as f64;
        included.sort_unstable();

        let name = self.spells.get(&included)?;
        Some(Spell {
            name: name.clone(),
            intensity: intensity.floor() as u32,
            elements: included,
        })
    }

    /// Compute the damage an attack spell deals through a counter-spell.
    ///
    /// A fizzled attack deals no damage. Otherwise each attack element
    /// opposed by a counter element raises the counter's intensity
    /// multiplier, the remaining intensity is scaled into `[0, 1]` against
    /// the normalization constant, and the result lands in
    /// `1..=maximum_damage`: a non-fizzled attack always deals at least 1.
    ///
    /// The intermediate values are retained; see
    /// [`SpellBook::last_damage_calculation`].
    pub fn calculate_damage(&mut self, attack: Option<&Spell>, counter: Option<&Spell>) -> u32 {
        let Some(attack) = attack else { return 0 };

        let mut intensity_multiplier = BASE_INTENSITY_MULTIPLIER;
        for element in &attack.elements {
            let opposing = element.opposing();
            if counter.is_some_and(|c| c.contains(opposing)) {
                intensity_multiplier += OPPOSING_ELEMENT_BONUS;
            }
        }

        let counter_intensity = counter.map_or(0.0, |c| f64::from(c.intensity));
        let remaining_intensity =
            (f64::from(attack.intensity) - counter_intensity * intensity_multiplier).max(0.0);
        let scaled_intensity = (remaining_intensity / INTENSITY_NORMALIZATION).min(1.0);
        let damage = (scaled_intensity * f64::from(self.maximum_damage))
            .min(f64::from(self.maximum_damage));
        let damage = damage.max(1.0).floor() as u32;

        self.last_damage = Some(DamageBreakdown {
            intensity_multiplier,
            remaining_intensity,
            scaled_intensity,
            damage,
        });

        damage
    }

    /// Intermediate values of the most recent damage calculation.
    #[must_use]
    pub fn last_damage_calculation(&self) -> Option<&DamageBreakdown> {
        self.last_damage.as_ref()
    }

    fn add_default_spells(&mut self) {
        use Element::*;

        // Single-element spells
        self.add_spell("Lightning Bolt", [Air]);
        self.add_spell("Fireball", [Fire]);
        self.add_spell("Water Gun", [Water]);
        self.add_spell("Earthquake", [Earth]);
        self.add_spell("Blinding Light", [Light]);
        self.add_spell("Dark Grasp", [Dark]);

        // Air-primary spells
        self.add_spell("Searing Wind", [Air, Fire]);
        self.add_spell("Cyclone", [Air, Water]);
        self.add_spell("Sandstorm", [Air, Earth]);
        self.add_spell("Prismatic Light", [Air, Light]);
        self.add_spell("Blind", [Air, Dark]);

        // Fire-primary spells
        self.add_spell("Concealing Steam", [Fire, Water]);
        self.add_spell("Meteor", [Fire, Earth]);
        self.add_spell("Sun Beam", [Fire, Light]);
        self.add_spell("Shadowflame Bolt", [Fire, Dark]);

        // Water-primary spells
        self.add_spell("Ice Shards", [Water, Earth]);
        self.add_spell("Refraction", [Water, Light]);
        self.add_spell("Drown", [Water, Dark]);

        // Earth-primary spells
        self.add_spell("Magical Aegis", [Earth, Light]);
        self.add_spell("Entomb", [Earth, Dark]);

        // Light-primary spells
        self.add_spell("Negation", [Light, Dark]);
    }
}

fn canonical_key(elements: impl IntoIterator<Item = Element>) -> ElementSet {
    let mut key: ElementSet = elements.into_iter().collect();
    key.sort_unstable();
    key.dedup();
    key
}
