//! Player records.

use serde::{Deserialize, Serialize};

use crate::spell::Spell;

/// Health every player starts a match with.
pub const DEFAULT_HEALTH: u32 = 100;

/// One side of a match.
///
/// Two instances exist per match (local and remote), both owned by the
/// state machine. They are mutated only through performed or received
/// actions: damage via [`Player::inflict_damage`], spells via
/// [`Player::set_last_spell`], and the remote record replaced wholesale
/// from peer messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Transport-assigned identifier; `None` until the transport reports one.
    pub id: Option<String>,

    /// Remaining health, floored at zero.
    pub health: u32,

    /// The spell cast in the player's most recent attack or defend phase.
    /// `None` if the cast fizzled (or no phase has completed yet).
    pub last_spell: Option<Spell>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Create a player at full health with no id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: None,
            health: DEFAULT_HEALTH,
            last_spell: None,
        }
    }

    /// Set the transport-assigned identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Record the most recently cast spell (or fizzle).
    pub fn set_last_spell(&mut self, spell: Option<Spell>) {
        self.last_spell = spell;
    }

    /// Apply damage, saturating at zero health.
    pub fn inflict_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Check whether the player's health has reached zero.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}
