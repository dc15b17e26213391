//! The turn orchestrator.
//!
//! The only component that knows "what happens when": it owns the state
//! machine, the countdown timers, the motion table, the spell book, and the
//! peer client, and reacts to state changes and peer events. Time-bound
//! phases (`ReadyUp`, `Attacking`, `Defending`, `EndOfTurn`) run on a named
//! countdown; network-bound phases (`WaitingToDefend`,
//! `WaitingForDefence`) sit until the corresponding peer message arrives.

use tracing::debug;

use super::EngineError;
use crate::core::{GameSettings, TickListener, TimerRegistry};
use crate::motion::HotspotMotionAccumulator;
use crate::net::{Connection, PeerClient, PeerEvent};
use crate::spell::{Spell, SpellBook};
use crate::state::{MatchState, Player, StateMachine, TransitionEvent};

/// Tag of the per-phase countdown timer.
pub const STATE_COUNTDOWN_TAG: &str = "state-countdown";

/// How the match ended, from the local player's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Victory,
    Defeat,
}

/// A transition scheduled to run when a countdown expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransition {
    pub event: TransitionEvent,
    pub arg: Option<MatchState>,
}

/// Coordinator for the turn cycle of one match.
pub struct TurnOrchestrator {
    settings: GameSettings,
    machine: StateMachine,
    timers: TimerRegistry<PendingTransition>,
    accumulator: HotspotMotionAccumulator,
    spellbook: SpellBook,
    client: PeerClient,
    outcome: Option<MatchOutcome>,
}

impl TurnOrchestrator {
    /// Wire the orchestrator together from its parts.
    #[must_use]
    pub fn new(
        settings: GameSettings,
        machine: StateMachine,
        spellbook: SpellBook,
        accumulator: HotspotMotionAccumulator,
        client: PeerClient,
    ) -> Self {
        Self {
            settings,
            machine,
            timers: TimerRegistry::new(),
            accumulator,
            spellbook,
            client,
            outcome: None,
        }
    }

    // === State access ===

    /// The current match state.
    #[must_use]
    pub fn state(&self) -> MatchState {
        self.machine.current()
    }

    /// The state machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// The state machine, mutably (for registering observers).
    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    /// The local player record.
    #[must_use]
    pub fn local_player(&self) -> &Player {
        self.machine.local_player()
    }

    /// The local player record, mutably.
    pub fn local_player_mut(&mut self) -> &mut Player {
        self.machine.local_player_mut()
    }

    /// The remote player record.
    #[must_use]
    pub fn remote_player(&self) -> &Player {
        self.machine.remote_player()
    }

    /// The spell cast in the local player's most recent completed phase.
    #[must_use]
    pub fn last_spell_cast(&self) -> Option<&Spell> {
        self.machine.local_player().last_spell.as_ref()
    }

    /// How the match ended, once `EndOfTurn` has found a defeated player.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// The accumulated motion table.
    #[must_use]
    pub fn accumulator(&self) -> &HotspotMotionAccumulator {
        &self.accumulator
    }

    /// The accumulated motion table, mutably (the motion detector's sink).
    pub fn accumulator_mut(&mut self) -> &mut HotspotMotionAccumulator {
        &mut self.accumulator
    }

    /// The spell book.
    #[must_use]
    pub fn spellbook(&self) -> &SpellBook {
        &self.spellbook
    }

    /// The peer client.
    #[must_use]
    pub fn client(&self) -> &PeerClient {
        &self.client
    }

    /// The peer client, mutably (for the host's transport callbacks).
    pub fn client_mut(&mut self) -> &mut PeerClient {
        &mut self.client
    }

    /// Remaining milliseconds of the active phase countdown, if any.
    #[must_use]
    pub fn countdown_remaining(&self) -> Option<f64> {
        self.timers.remaining(STATE_COUNTDOWN_TAG)
    }

    /// Register a timer tick listener (e.g. a countdown display).
    pub fn add_tick_listener(&mut self, tag: impl Into<String>, listener: TickListener) {
        self.timers.add_tick_listener(tag, listener);
    }

    // === Lobby actions ===

    /// Initiate a battle with a peer over the given connection.
    ///
    /// The battle request itself is sent once the transport reports the
    /// link open (`client_mut().on_open`).
    pub fn request_battle(&mut self, connection: Box<dyn Connection>) {
        self.client.connect(connection);
    }

    /// The transport reports our outgoing connection is open; transmit the
    /// battle request.
    pub fn on_transport_open(&mut self) -> Result<(), EngineError> {
        let local = self.machine.local_player().clone();
        self.client.on_open(&local)?;
        Ok(())
    }

    /// Accept the most recently received battle request.
    ///
    /// The match starts (with us defending) when the resulting event is
    /// processed on the next update.
    pub fn accept_battle(&mut self) -> Result<(), EngineError> {
        let local = self.machine.local_player().clone();
        self.client.accept_battle(&local)?;
        Ok(())
    }

    /// Decline the most recently received battle request.
    pub fn decline_battle(&mut self) {
        self.client.decline_battle();
    }

    // === In-match actions ===

    /// Cast immediately as a result of the player's incantation, instead of
    /// waiting for the phase countdown.
    ///
    /// Outside the attack and defend phases this does nothing.
    pub fn cast_now(&mut self) -> Result<(), EngineError> {
        let event = match self.machine.current() {
            MatchState::Attacking => TransitionEvent::CompleteAttack,
            MatchState::Defending => TransitionEvent::CompleteDefend,
            _ => return Ok(()),
        };

        self.timers.cancel(STATE_COUNTDOWN_TAG);
        self.perform(event, None)
    }

    /// Enter a state directly, bypassing the transition table.
    ///
    /// Used for the lifecycle states no event leads to (`AwaitingMedia`,
    /// `Idle`, `Error`). State-change reactions (timer setup/cancellation,
    /// motion reset) run exactly as for table-driven transitions.
    pub fn set_state(&mut self, state: MatchState) {
        let (previous, current) = self.machine.set_state(state);
        self.apply_state_change(previous, current);
    }

    /// Advance the orchestrator by one tick.
    ///
    /// Drains queued peer events, then expired countdowns, dispatching the
    /// transitions they drive. Returns the processed peer events so the
    /// host can react to them (render the remote stream, show a battle
    /// request prompt, ...).
    pub fn update(&mut self, elapsed_ms: f64) -> Result<Vec<PeerEvent>, EngineError> {
        let mut processed = Vec::new();

        while let Some(event) = self.client.poll_event() {
            let result = self.handle_peer_event(&event);
            processed.push(event);
            result?;
        }

        for pending in self.timers.tick(elapsed_ms) {
            self.perform(pending.event, pending.arg)?;
        }

        Ok(processed)
    }

    /// Drive the state machine with a transition event, running the
    /// transition's side effects first.
    ///
    /// Completing an attack resolves the motion table into a spell and
    /// announces it; completing a defend applies the opponent's spell
    /// against our counter and announces the end of the turn. Both happen
    /// before the state changes, while the motion table is still intact.
    pub fn perform(
        &mut self,
        event: TransitionEvent,
        arg: Option<MatchState>,
    ) -> Result<(), EngineError> {
        self.machine.ensure_permitted(event)?;

        match event {
            TransitionEvent::CompleteAttack => {
                let spell = self.spellbook.generate_spell(self.accumulator.accumulated());
                match &spell {
                    Some(spell) => debug!(%spell, "attack resolved"),
                    None => debug!("attack fizzled"),
                }
                self.machine.local_player_mut().set_last_spell(spell);
                let local = self.machine.local_player().clone();
                self.client.send_cast_spell(&local)?;
            }
            TransitionEvent::CompleteDefend => {
                let attack = self.machine.remote_player().last_spell.clone();
                let counter = self.machine.local_player().last_spell.clone();
                let damage = self.spellbook.calculate_damage(attack.as_ref(), counter.as_ref());
                debug!(damage, "defend resolved");
                self.machine.local_player_mut().inflict_damage(damage);
                let local = self.machine.local_player().clone();
                self.client.send_turn_over(&local)?;
            }
            _ => {}
        }

        let (previous, current) = self.machine.perform_transition(event, arg)?;
        self.apply_state_change(previous, current);
        Ok(())
    }

    /// React to entering a new state.
    fn apply_state_change(&mut self, previous: MatchState, current: MatchState) {
        // A fresh phase starts from an empty motion table
        self.accumulator.reset();

        match current {
            MatchState::Idle | MatchState::Error => {
                self.timers.cancel_all();
            }
            MatchState::ReadyUp => {
                self.set_completion_timer(
                    self.settings.duration_ready_up,
                    TransitionEvent::BeginAttack,
                    None,
                );
            }
            MatchState::Attacking => {
                self.set_completion_timer(
                    self.settings.duration_attacking,
                    TransitionEvent::CompleteAttack,
                    None,
                );
            }
            MatchState::Defending => {
                self.set_completion_timer(
                    self.settings.duration_defending,
                    TransitionEvent::CompleteDefend,
                    None,
                );
            }
            // Network-bound: the peer's next message drives the transition
            MatchState::WaitingToDefend | MatchState::WaitingForDefence => {}
            MatchState::EndOfTurn => {
                let local = self.machine.local_player().health;
                let remote = self.machine.remote_player().health;

                if local == 0 || remote == 0 {
                    self.outcome = Some(if local > remote {
                        MatchOutcome::Victory
                    } else {
                        MatchOutcome::Defeat
                    });
                    self.set_completion_timer(
                        self.settings.duration_turn_over,
                        TransitionEvent::EndGame,
                        None,
                    );
                } else {
                    // Whoever just defended attacks next turn
                    let next = if previous == MatchState::Defending {
                        MatchState::ReadyUp
                    } else {
                        MatchState::WaitingToDefend
                    };
                    self.set_completion_timer(
                        self.settings.duration_turn_over,
                        TransitionEvent::NextTurn,
                        Some(next),
                    );
                }
            }
            MatchState::AwaitingMedia | MatchState::GameOver => {}
        }
    }

    fn set_completion_timer(
        &mut self,
        duration_ms: f64,
        event: TransitionEvent,
        arg: Option<MatchState>,
    ) {
        self.timers.set(STATE_COUNTDOWN_TAG, duration_ms, PendingTransition { event, arg });
    }

    fn handle_peer_event(&mut self, event: &PeerEvent) -> Result<(), EngineError> {
        match event {
            // Surfaced to the host; nothing for the turn cycle to do
            PeerEvent::Connected
            | PeerEvent::BattleRequestSent
            | PeerEvent::RemoteStreamAvailable => {}

            // The request carries the challenger's state; the host decides
            // whether to accept
            PeerEvent::BattleRequestReceived(player) => {
                self.machine.replace_remote_player(player.clone());
            }

            // We accepted their request: we defend first
            PeerEvent::AcceptedPeerRequest => {
                self.perform(TransitionEvent::StartGame, Some(MatchState::WaitingToDefend))?;
            }

            // They accepted our request: we attack first
            PeerEvent::PeerAcceptedRequest(player) => {
                self.machine.replace_remote_player(player.clone());
                self.perform(TransitionEvent::StartGame, Some(MatchState::ReadyUp))?;
            }

            PeerEvent::PeerCastSpell(player) => {
                self.machine.replace_remote_player(player.clone());
                self.perform(TransitionEvent::BeginDefend, None)?;
            }

            PeerEvent::TurnOver(player) => {
                self.machine.replace_remote_player(player.clone());
                self.perform(TransitionEvent::TurnCompleted, None)?;
            }

            PeerEvent::Disconnected => {
                if !self.machine.current().is_out_of_match() {
                    return Err(EngineError::PeerDisconnected);
                }
            }
        }
        Ok(())
    }
}
