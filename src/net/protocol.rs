//! The peer wire protocol.
//!
//! Peers exchange exactly one message shape: an [`Envelope`] naming one of
//! the four request kinds and carrying the sender's serialized [`Player`].
//! Messages are JSON on the wire; the transport is assumed to deliver them
//! whole, in order.

use serde::{Deserialize, Serialize};

use crate::state::Player;

/// The four request kinds peers exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Ask the peer for a battle.
    BattleRequest,
    /// Accept the peer's battle request.
    BattleAccepted,
    /// Announce the spell cast in the completed attack phase.
    CastSpell,
    /// Announce completion of the defend phase, ending the turn.
    TurnOver,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestKind::BattleRequest => "BattleRequest",
            RequestKind::BattleAccepted => "BattleAccepted",
            RequestKind::CastSpell => "CastSpell",
            RequestKind::TurnOver => "TurnOver",
        };
        f.write_str(name)
    }
}

/// One protocol message: a request kind plus the sender's player state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub request: RequestKind,
    pub player: Player,
}

impl Envelope {
    /// Create a message carrying a snapshot of the sender's player state.
    #[must_use]
    pub fn new(request: RequestKind, player: &Player) -> Self {
        Self {
            request,
            player: player.clone(),
        }
    }

    /// Encode for the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from the wire.
    ///
    /// Fails on malformed payloads and on unrecognized request kinds.
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
