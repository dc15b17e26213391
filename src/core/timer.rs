//! Named countdown timers driven by external per-tick elapsed time.
//!
//! The registry never reads a clock: the host calls [`TimerRegistry::tick`]
//! with the elapsed milliseconds each frame. A timer that reaches zero is
//! removed from the registry that same tick and its action is returned to
//! the caller, in timer-registration order. Dispatching expiry actions as
//! data (rather than invoking stored callbacks mid-iteration) means a
//! dispatched action can freely set or cancel timers without reentering the
//! registry.

use rustc_hash::FxHashMap;

/// Reserved tag used to register tick listeners for every timer.
///
/// Not a valid timer tag.
pub const WILDCARD_TAG: &str = "*";

/// Listener invoked on every tick of a matching timer with
/// `(remaining_ms, tag)`.
pub type TickListener = Box<dyn FnMut(f64, &str)>;

struct TimerEntry<A> {
    tag: String,
    remaining_ms: f64,
    action: A,
}

/// Registry of named countdown timers.
///
/// Generic over the action type returned when a timer expires. Timers are
/// identified by tag; setting a timer with an existing tag replaces it in
/// place, keeping its position in the expiry order.
#[derive(Default)]
pub struct TimerRegistry<A> {
    timers: Vec<TimerEntry<A>>,
    tick_listeners: FxHashMap<String, Vec<TickListener>>,
}

impl<A> TimerRegistry<A> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            tick_listeners: FxHashMap::default(),
        }
    }

    /// Set a timer with the specified tag.
    ///
    /// Returns false (and registers nothing) if `tag` is the wildcard tag.
    pub fn set(&mut self, tag: impl Into<String>, duration_ms: f64, action: A) -> bool {
        let tag = tag.into();
        if tag == WILDCARD_TAG {
            return false;
        }

        if let Some(existing) = self.timers.iter_mut().find(|t| t.tag == tag) {
            existing.remaining_ms = duration_ms;
            existing.action = action;
        } else {
            self.timers.push(TimerEntry {
                tag,
                remaining_ms: duration_ms,
                action,
            });
        }
        true
    }

    /// Cancel the timer with the specified tag.
    ///
    /// Returns true if a timer was cancelled.
    pub fn cancel(&mut self, tag: &str) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.tag != tag);
        self.timers.len() != before
    }

    /// Cancel all timers.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Check if a timer with the specified tag is active.
    #[must_use]
    pub fn is_active(&self, tag: &str) -> bool {
        self.timers.iter().any(|t| t.tag == tag)
    }

    /// Get the remaining time of a timer, if active.
    #[must_use]
    pub fn remaining(&self, tag: &str) -> Option<f64> {
        self.timers.iter().find(|t| t.tag == tag).map(|t| t.remaining_ms)
    }

    /// Number of active timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Check if no timers are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Register a tick listener for the specified tag.
    ///
    /// Use [`WILDCARD_TAG`] to listen to every timer. Listeners for a tag
    /// are invoked in registration order, tag-specific listeners before
    /// wildcard listeners.
    pub fn add_tick_listener(&mut self, tag: impl Into<String>, listener: TickListener) {
        self.tick_listeners.entry(tag.into()).or_default().push(listener);
    }

    /// Advance all timers by `elapsed_ms`.
    ///
    /// Tick listeners are notified for every active timer. Expired timers
    /// are removed and their actions returned in registration order.
    pub fn tick(&mut self, elapsed_ms: f64) -> Vec<A> {
        let mut expired = Vec::new();
        let mut index = 0;

        while index < self.timers.len() {
            let entry = &mut self.timers[index];
            entry.remaining_ms = (entry.remaining_ms - elapsed_ms).max(0.0);
            let remaining = entry.remaining_ms;
            let done = remaining <= 0.0;

            // The tag is detached while listeners run so they can be held
            // mutably alongside the entry list.
            let tag = std::mem::take(&mut self.timers[index].tag);
            if let Some(listeners) = self.tick_listeners.get_mut(&tag) {
                for listener in listeners {
                    listener(remaining, &tag);
                }
            }
            if let Some(listeners) = self.tick_listeners.get_mut(WILDCARD_TAG) {
                for listener in listeners {
                    listener(remaining, &tag);
                }
            }

            if done {
                let entry = self.timers.remove(index);
                expired.push(entry.action);
            } else {
                self.timers[index].tag = tag;
                index += 1;
            }
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_set_and_expire() {
        let mut timers: TimerRegistry<&str> = TimerRegistry::new();
        timers.set("countdown", 100.0, "done");

        assert!(timers.is_active("countdown"));
        assert_eq!(timers.tick(50.0), Vec::<&str>::new());
        assert_eq!(timers.remaining("countdown"), Some(50.0));

        let expired = timers.tick(50.0);
        assert_eq!(expired, vec!["done"]);
        assert!(!timers.is_active("countdown"));
    }

    #[test]
    fn test_expiry_in_registration_order() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("b", 10.0, 2);
        timers.set("a", 10.0, 1);
        timers.set("c", 5.0, 3);

        // All expire in the same tick, in registration order
        assert_eq!(timers.tick(20.0), vec![2, 1, 3]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("first", 10.0, 1);
        timers.set("second", 10.0, 2);
        timers.set("first", 10.0, 10); // replaced, still expires first

        assert_eq!(timers.tick(10.0), vec![10, 2]);
    }

    #[test]
    fn test_cancel() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("countdown", 100.0, 1);

        assert!(timers.cancel("countdown"));
        assert!(!timers.cancel("countdown"));
        assert!(timers.tick(200.0).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("a", 10.0, 1);
        timers.set("b", 10.0, 2);

        timers.cancel_all();

        assert!(timers.is_empty());
        assert!(timers.tick(20.0).is_empty());
    }

    #[test]
    fn test_wildcard_tag_rejected() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        assert!(!timers.set(WILDCARD_TAG, 10.0, 1));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_tick_listeners() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("watched", 100.0, 1);
        timers.set("other", 100.0, 2);

        let seen: Rc<RefCell<Vec<(f64, String)>>> = Rc::default();

        let tagged = Rc::clone(&seen);
        timers.add_tick_listener(
            "watched",
            Box::new(move |remaining, tag| {
                tagged.borrow_mut().push((remaining, tag.to_string()));
            }),
        );

        let all = Rc::clone(&seen);
        timers.add_tick_listener(
            WILDCARD_TAG,
            Box::new(move |remaining, tag| {
                all.borrow_mut().push((remaining, format!("*{tag}")));
            }),
        );

        timers.tick(40.0);

        let seen = seen.borrow();
        assert_eq!(
            *seen,
            vec![
                (60.0, "watched".to_string()),
                (60.0, "*watched".to_string()),
                (60.0, "*other".to_string()),
            ]
        );
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut timers: TimerRegistry<u32> = TimerRegistry::new();
        timers.set("countdown", 10.0, 1);

        let seen: Rc<RefCell<Vec<f64>>> = Rc::default();
        let sink = Rc::clone(&seen);
        timers.add_tick_listener(
            "countdown",
            Box::new(move |remaining, _| sink.borrow_mut().push(remaining)),
        );

        timers.tick(500.0);
        assert_eq!(*seen.borrow(), vec![0.0]);
    }
}
