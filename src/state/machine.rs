//! The match state machine.
//!
//! States and transition events are closed enums; the transition table is
//! an exhaustive match, so an unknown transition is unrepresentable and the
//! only runtime failure is attempting a transition from a state outside its
//! prerequisite set. Events whose target depends on context (`StartGame`,
//! `NextTurn`) are marked [`TransitionTarget::Dynamic`] and take the target
//! as an argument.
//!
//! Observer contract: transition observers fire *before* the state changes;
//! state observers fire after, with `(previous, current)`. Both are
//! delivered in registration order.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::player::Player;

/// The phase the match is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    /// Waiting for the host to acquire media streams.
    AwaitingMedia,
    /// A fatal condition occurred; the session is over.
    Error,
    /// In the lobby, no match running.
    Idle,
    /// Counting down to the local player's attack phase.
    ReadyUp,
    /// The local player is gesturing an attack spell.
    Attacking,
    /// The local player is gesturing a counter-spell.
    Defending,
    /// Waiting for the opponent's attack to arrive.
    WaitingToDefend,
    /// Waiting for the opponent to finish defending.
    WaitingForDefence,
    /// Both phases of the turn are complete.
    EndOfTurn,
    /// The match has been decided.
    GameOver,
}

impl MatchState {
    /// States in which no match is in progress.
    ///
    /// A peer disconnect in any other state is fatal.
    #[must_use]
    pub fn is_out_of_match(self) -> bool {
        matches!(
            self,
            MatchState::AwaitingMedia | MatchState::Idle | MatchState::Error
        )
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatchState::AwaitingMedia => "AwaitingMedia",
            MatchState::Error => "Error",
            MatchState::Idle => "Idle",
            MatchState::ReadyUp => "ReadyUp",
            MatchState::Attacking => "Attacking",
            MatchState::Defending => "Defending",
            MatchState::WaitingToDefend => "WaitingToDefend",
            MatchState::WaitingForDefence => "WaitingForDefence",
            MatchState::EndOfTurn => "EndOfTurn",
            MatchState::GameOver => "GameOver",
        };
        f.write_str(name)
    }
}

/// A transition event the state machine can be driven by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionEvent {
    /// Leave the lobby; the argument selects the initial role.
    StartGame,
    /// Enter the attack phase.
    BeginAttack,
    /// Enter the defend phase.
    BeginDefend,
    /// Finish the attack phase.
    CompleteAttack,
    /// Finish the defend phase.
    CompleteDefend,
    /// The opponent finished their defend phase.
    TurnCompleted,
    /// Start the next turn; the argument selects the next role.
    NextTurn,
    /// Finish the match.
    EndGame,
}

impl std::fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransitionEvent::StartGame => "StartGame",
            TransitionEvent::BeginAttack => "BeginAttack",
            TransitionEvent::BeginDefend => "BeginDefend",
            TransitionEvent::CompleteAttack => "CompleteAttack",
            TransitionEvent::CompleteDefend => "CompleteDefend",
            TransitionEvent::TurnCompleted => "TurnCompleted",
            TransitionEvent::NextTurn => "NextTurn",
            TransitionEvent::EndGame => "EndGame",
        };
        f.write_str(name)
    }
}

/// Where a transition event leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionTarget {
    /// Always the same state.
    Fixed(MatchState),
    /// The caller supplies the target state as an argument.
    Dynamic,
}

/// The target and permitted source states of a transition event.
#[derive(Clone, Copy, Debug)]
pub struct TransitionRule {
    pub target: TransitionTarget,
    /// Empty means the event is permitted from any state.
    pub prerequisites: &'static [MatchState],
}

impl TransitionEvent {
    /// The transition table.
    #[must_use]
    pub fn rule(self) -> TransitionRule {
        use MatchState::*;
        use TransitionTarget::*;

        match self {
            TransitionEvent::StartGame => TransitionRule {
                target: Dynamic,
                prerequisites: &[Idle],
            },
            TransitionEvent::BeginAttack => TransitionRule {
                target: Fixed(Attacking),
                prerequisites: &[ReadyUp],
            },
            TransitionEvent::BeginDefend => TransitionRule {
                target: Fixed(Defending),
                prerequisites: &[WaitingToDefend],
            },
            TransitionEvent::CompleteAttack => TransitionRule {
                target: Fixed(WaitingForDefence),
                prerequisites: &[Attacking],
            },
            TransitionEvent::CompleteDefend => TransitionRule {
                target: Fixed(EndOfTurn),
                prerequisites: &[Defending],
            },
            TransitionEvent::TurnCompleted => TransitionRule {
                target: Fixed(EndOfTurn),
                prerequisites: &[WaitingForDefence],
            },
            TransitionEvent::NextTurn => TransitionRule {
                target: Dynamic,
                prerequisites: &[EndOfTurn],
            },
            TransitionEvent::EndGame => TransitionRule {
                target: Fixed(GameOver),
                prerequisites: &[],
            },
        }
    }
}

/// Errors from driving the state machine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The event's prerequisite set does not include the current state.
    #[error("transition {event} is not permitted from state {from}")]
    IllegalTransition {
        event: TransitionEvent,
        from: MatchState,
    },

    /// A dynamic-target event was performed without a target argument.
    #[error("transition {0} requires a caller-supplied target state")]
    MissingTarget(TransitionEvent),
}

/// Observer of state changes, called with `(previous, current)`.
pub type StateObserver = Box<dyn FnMut(MatchState, MatchState)>;

/// Observer of a specific transition event, called before the state changes.
pub type TransitionObserver = Box<dyn FnMut()>;

/// The canonical turn/phase state of a match, and both player records.
pub struct StateMachine {
    previous: MatchState,
    current: MatchState,
    local_player: Player,
    remote_player: Player,
    state_observers: Vec<StateObserver>,
    transition_observers: FxHashMap<TransitionEvent, Vec<TransitionObserver>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a state machine in the `Idle` state with two fresh players.
    #[must_use]
    pub fn new() -> Self {
        Self {
            previous: MatchState::Idle,
            current: MatchState::Idle,
            local_player: Player::new(),
            remote_player: Player::new(),
            state_observers: Vec::new(),
            transition_observers: FxHashMap::default(),
        }
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> MatchState {
        self.current
    }

    /// The state before the most recent change.
    #[must_use]
    pub fn previous(&self) -> MatchState {
        self.previous
    }

    /// The local player record.
    #[must_use]
    pub fn local_player(&self) -> &Player {
        &self.local_player
    }

    /// The local player record, mutably.
    pub fn local_player_mut(&mut self) -> &mut Player {
        &mut self.local_player
    }

    /// The remote player record.
    #[must_use]
    pub fn remote_player(&self) -> &Player {
        &self.remote_player
    }

    /// Replace the remote player record wholesale (from a peer message).
    pub fn replace_remote_player(&mut self, player: Player) {
        self.remote_player = player;
    }

    /// Register a state observer.
    ///
    /// Observers are notified after every state change, in registration
    /// order, with `(previous, current)`.
    pub fn add_state_observer(&mut self, observer: StateObserver) {
        self.state_observers.push(observer);
    }

    /// Register an observer for a specific transition event.
    ///
    /// Transition observers run when the event is performed and permitted,
    /// before the state changes.
    pub fn add_transition_observer(&mut self, event: TransitionEvent, observer: TransitionObserver) {
        self.transition_observers.entry(event).or_default().push(observer);
    }

    /// Check that an event is permitted from the current state.
    pub fn ensure_permitted(&self, event: TransitionEvent) -> Result<(), StateError> {
        let rule = event.rule();
        if !rule.prerequisites.is_empty() && !rule.prerequisites.contains(&self.current) {
            return Err(StateError::IllegalTransition {
                event,
                from: self.current,
            });
        }
        Ok(())
    }

    /// Drive the state machine with a transition event.
    ///
    /// `arg` supplies the target state for dynamic-target events and is
    /// ignored otherwise. On success, returns `(previous, current)`.
    /// On failure the state is unchanged and no observers run.
    pub fn perform_transition(
        &mut self,
        event: TransitionEvent,
        arg: Option<MatchState>,
    ) -> Result<(MatchState, MatchState), StateError> {
        self.ensure_permitted(event)?;

        let target = match event.rule().target {
            TransitionTarget::Fixed(state) => state,
            TransitionTarget::Dynamic => arg.ok_or(StateError::MissingTarget(event))?,
        };

        // Transition observers run before the state changes
        if let Some(observers) = self.transition_observers.get_mut(&event) {
            for observer in observers {
                observer();
            }
        }

        debug!(%event, from = %self.current, to = %target, "state transition");
        Ok(self.set_state(target))
    }

    /// Set the current state directly, bypassing the transition table.
    ///
    /// This is the primitive mutator, used for lifecycle states that no
    /// event leads to (`AwaitingMedia`, `Idle`, `Error`). State observers
    /// are notified. Returns `(previous, current)`.
    pub fn set_state(&mut self, new_state: MatchState) -> (MatchState, MatchState) {
        self.previous = self.current;
        self.current = new_state;

        for observer in &mut self.state_observers {
            observer(self.previous, self.current);
        }

        (self.previous, self.current)
    }
}
