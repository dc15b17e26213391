//! # incanter
//!
//! A two-party, peer-synchronized, turn-based battle engine whose turn
//! actions come from real-time motion-gesture recognition instead of input
//! devices: players charge elemental spells by gesturing over camera
//! hotspots while incanting, and the resulting spells are resolved and
//! exchanged over a direct peer link with no authoritative server.
//!
//! ## Design Principles
//!
//! 1. **Host-Driven Time and I/O**: The engine never reads a clock, a
//!    camera, or a socket. The host delivers ticks (`elapsed_ms`), frames,
//!    audio samples, and transport callbacks; the engine is deterministic
//!    given those inputs.
//!
//! 2. **Closed State Space**: Match states, transition events, elements,
//!    and protocol request kinds are closed enums with exhaustive matching,
//!    so an unknown state or message kind is a compile error or a decode
//!    error, never a silent no-op.
//!
//! 3. **No Globals**: Everything hangs off an explicitly constructed
//!    [`GameEngine`]; multiple engines coexist in one process (the
//!    two-engine tests battle each other in a single thread).
//!
//! ## Modules
//!
//! - `core`: settings and the countdown timer registry
//! - `motion`: frame differencing, hotspots, and motion accumulation
//! - `spell`: elements, spells, the spell book, and damage
//! - `state`: the match state machine and player records
//! - `net`: the four-message peer protocol and the peer client
//! - `audio`: microphone volume gating
//! - `engine`: the turn orchestrator and the top-level context object

pub mod audio;
pub mod core;
pub mod engine;
pub mod motion;
pub mod net;
pub mod spell;
pub mod state;

// Re-export commonly used types
pub use crate::core::{GameSettings, TimerRegistry, WILDCARD_TAG};

pub use crate::motion::{
    FrameBuffer, Hotspot, HotspotMotionAccumulator, MotionDetector, MotionEvent, MotionSink, Rect,
    Region,
};

pub use crate::spell::{DamageBreakdown, Element, ElementSet, Spell, SpellBook};

pub use crate::state::{
    MatchState, Player, StateError, StateMachine, TransitionEvent, TransitionTarget,
    DEFAULT_HEALTH,
};

pub use crate::net::{Connection, Envelope, NetError, PeerClient, PeerEvent, RequestKind};

pub use crate::audio::{TriggerZone, VolumeMonitor};

pub use crate::engine::{
    default_hotspots, EngineError, GameEngine, MatchOutcome, TurnOrchestrator,
    STATE_COUNTDOWN_TAG,
};
