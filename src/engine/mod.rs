//! The assembled engine: turn orchestration and the top-level context.

#[allow(clippy::module_inception)]
mod engine;
mod turn;

pub use engine::{default_hotspots, GameEngine};
pub use turn::{MatchOutcome, PendingTransition, TurnOrchestrator, STATE_COUNTDOWN_TAG};

use crate::net::NetError;
use crate::state::StateError;

/// Errors surfaced by the engine.
///
/// All of these are fatal to the session: the engine records the message
/// and converges on [`crate::state::MatchState::Error`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A transition was driven from a state outside its prerequisites.
    #[error(transparent)]
    State(#[from] StateError),

    /// The peer client could not send a protocol message.
    #[error(transparent)]
    Net(#[from] NetError),

    /// The peer disconnected during an active match phase.
    #[error("peer disconnected during turn")]
    PeerDisconnected,

    /// The host could not acquire its media streams.
    #[error("failed to acquire media streams")]
    MediaUnavailable,
}
