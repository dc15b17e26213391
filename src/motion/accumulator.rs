//! Accumulation of motion confidence per hotspot over time.
//!
//! Charges grow by `confidence × elapsed-seconds` on each motion event and,
//! when decay is enabled, shrink by `decay_rate × elapsed-seconds` each
//! tick. Hotspots may be paired as mutually exclusive: charging one drains
//! the other by the same increment, so opposite elements cannot be charged
//! simultaneously.
//!
//! The accumulator never reads a clock. The host must call
//! [`HotspotMotionAccumulator::set_elapsed`] before any motion events are
//! delivered for the tick; until then, events are ignored.

use rustc_hash::FxHashMap;

use super::detector::MotionSink;
use super::region::Region;

/// Accumulated motion charge per named hotspot.
#[derive(Debug, Default)]
pub struct HotspotMotionAccumulator {
    accumulated: FxHashMap<String, f64>,
    exclusive_pairs: FxHashMap<String, String>,
    elapsed_ms: f64,
    decay_rate: f64,
}

impl HotspotMotionAccumulator {
    /// Create an accumulator with the given decay rate (charge per second).
    ///
    /// A decay rate of zero disables decay.
    #[must_use]
    pub fn new(decay_rate: f64) -> Self {
        Self {
            decay_rate,
            ..Self::default()
        }
    }

    /// Record the elapsed time for this tick and apply decay.
    ///
    /// Decay runs before any motion events are registered for the tick, so
    /// a tick's events are never eroded by its own decay pass.
    pub fn set_elapsed(&mut self, elapsed_ms: f64) {
        self.elapsed_ms = elapsed_ms;

        if self.decay_rate > 0.0 {
            let decrement = self.decay_rate * (elapsed_ms / 1000.0);
            for charge in self.accumulated.values_mut() {
                *charge = (*charge - decrement).max(0.0);
            }
        }
    }

    /// Clear all accumulated charges.
    pub fn reset(&mut self) {
        self.accumulated.clear();
    }

    /// Register two hotspots as mutually exclusive.
    ///
    /// Rejected (returns false) if either hotspot is already paired.
    pub fn register_exclusive_pair(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> bool {
        let a = a.into();
        let b = b.into();
        if self.exclusive_pairs.contains_key(&a) || self.exclusive_pairs.contains_key(&b) {
            return false;
        }

        self.exclusive_pairs.insert(a.clone(), b.clone());
        self.exclusive_pairs.insert(b, a);
        true
    }

    /// The mutually exclusive partner of a hotspot, if any.
    #[must_use]
    pub fn opposing_hotspot(&self, name: &str) -> Option<&str> {
        self.exclusive_pairs.get(name).map(String::as_str)
    }

    /// Current charge for a hotspot (zero if never charged).
    #[must_use]
    pub fn charge(&self, name: &str) -> f64 {
        self.accumulated.get(name).copied().unwrap_or(0.0)
    }

    /// The full charge table.
    #[must_use]
    pub fn accumulated(&self) -> &FxHashMap<String, f64> {
        &self.accumulated
    }

    fn decrement(&mut self, name: &str, by: f64) {
        if let Some(charge) = self.accumulated.get_mut(name) {
            *charge = (*charge - by).max(0.0);
        }
    }
}

impl MotionSink for HotspotMotionAccumulator {
    fn on_motion(&mut self, confidence: u32, region: &Region) {
        // Grid cells have no name and accumulate nothing; before the first
        // set_elapsed call there is no time to integrate over.
        let Some(name) = region.name() else { return };
        if self.elapsed_ms == 0.0 {
            return;
        }

        let increment = (self.elapsed_ms / 1000.0) * f64::from(confidence);
        *self.accumulated.entry(name.to_string()).or_insert(0.0) += increment;

        if let Some(partner) = self.exclusive_pairs.get(name).cloned() {
            self.decrement(&partner, increment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::region::Rect;
    use proptest::prelude::*;

    fn hotspot(name: &str) -> Region {
        Region::Hotspot {
            name: name.to_string(),
            rect: Rect::new(0.0, 0.0, 0.25, 0.25),
        }
    }

    fn grid_cell() -> Region {
        Region::GridCell {
            row: 0,
            col: 0,
            rect: Rect::new(0.0, 0.0, 0.05, 0.05),
        }
    }

    #[test]
    fn test_accumulates_confidence_times_seconds() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.set_elapsed(500.0);
        acc.on_motion(40, &hotspot("Fire"));

        assert_eq!(acc.charge("Fire"), 20.0);

        acc.on_motion(40, &hotspot("Fire"));
        assert_eq!(acc.charge("Fire"), 40.0);
    }

    #[test]
    fn test_ignores_motion_before_first_tick() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.on_motion(100, &hotspot("Fire"));

        assert_eq!(acc.charge("Fire"), 0.0);
        assert!(acc.accumulated().is_empty());
    }

    #[test]
    fn test_ignores_unnamed_grid_cells() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.set_elapsed(1000.0);
        acc.on_motion(100, &grid_cell());

        assert!(acc.accumulated().is_empty());
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let mut acc = HotspotMotionAccumulator::new(2.0);
        acc.set_elapsed(1000.0);
        acc.on_motion(10, &hotspot("Fire")); // charge 10

        acc.set_elapsed(1000.0); // decay 2
        assert_eq!(acc.charge("Fire"), 8.0);

        acc.set_elapsed(10_000.0); // decay 20, floored
        assert_eq!(acc.charge("Fire"), 0.0);
    }

    #[test]
    fn test_no_decay_when_rate_zero() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.set_elapsed(1000.0);
        acc.on_motion(10, &hotspot("Fire"));

        acc.set_elapsed(60_000.0);
        assert_eq!(acc.charge("Fire"), 10.0);
    }

    #[test]
    fn test_exclusive_pair_drains_partner() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        assert!(acc.register_exclusive_pair("Fire", "Water"));

        acc.set_elapsed(1000.0);
        acc.on_motion(10, &hotspot("Water")); // Water 10
        acc.on_motion(4, &hotspot("Fire")); // Fire 4, Water 6

        assert_eq!(acc.charge("Fire"), 4.0);
        assert_eq!(acc.charge("Water"), 6.0);

        // Draining clamps at zero
        acc.on_motion(100, &hotspot("Fire"));
        assert_eq!(acc.charge("Water"), 0.0);
    }

    #[test]
    fn test_partner_without_entry_untouched() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.register_exclusive_pair("Fire", "Water");

        acc.set_elapsed(1000.0);
        acc.on_motion(10, &hotspot("Fire"));

        // Water never charged: no entry is created by the drain
        assert!(!acc.accumulated().contains_key("Water"));
    }

    #[test]
    fn test_pair_registration_rejected_when_already_paired() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        assert!(acc.register_exclusive_pair("Fire", "Water"));
        assert!(!acc.register_exclusive_pair("Fire", "Earth"));
        assert!(!acc.register_exclusive_pair("Earth", "Water"));

        assert_eq!(acc.opposing_hotspot("Fire"), Some("Water"));
        assert_eq!(acc.opposing_hotspot("Water"), Some("Fire"));
        assert_eq!(acc.opposing_hotspot("Earth"), None);
    }

    #[test]
    fn test_reset_clears_charges_but_not_pairs() {
        let mut acc = HotspotMotionAccumulator::new(0.0);
        acc.register_exclusive_pair("Fire", "Water");
        acc.set_elapsed(1000.0);
        acc.on_motion(10, &hotspot("Fire"));

        acc.reset();

        assert!(acc.accumulated().is_empty());
        assert_eq!(acc.opposing_hotspot("Fire"), Some("Water"));
    }

    proptest! {
        /// No sequence of motion and decay ever drives a charge negative.
        #[test]
        fn prop_charges_never_negative(
            steps in proptest::collection::vec(
                (0u32..200, 0.0f64..2000.0, prop::bool::ANY),
                1..50,
            )
        ) {
            let mut acc = HotspotMotionAccumulator::new(1.5);
            acc.register_exclusive_pair("Fire", "Water");

            for (confidence, elapsed, fire_side) in steps {
                acc.set_elapsed(elapsed);
                let name = if fire_side { "Fire" } else { "Water" };
                acc.on_motion(confidence, &hotspot(name));

                for (_, charge) in acc.accumulated() {
                    prop_assert!(*charge >= 0.0);
                }
            }
        }
    }
}
