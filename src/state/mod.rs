//! Match state: the turn/phase state machine and both player records.

mod machine;
mod player;

pub use machine::{
    MatchState, StateError, StateMachine, StateObserver, TransitionEvent, TransitionObserver,
    TransitionRule, TransitionTarget,
};
pub use player::{Player, DEFAULT_HEALTH};
