//! Battle state tracking
//!
//! Per-turn facts read off the screen and the little state that survives
//! between turns of the same battle.

use serde::{Deserialize, Serialize};

/// Number of move buttons on the battle screen
pub const MOVE_SLOTS: usize = 4;

/// Facts read from the battle screen for one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Opponent name, never empty once a turn gets past perception
    pub enemy_name: String,
    /// Active own creature, may be empty when it could not be read
    pub own_name: String,
    /// Visible move labels in slot order, empty where OCR failed
    pub moves: [String; MOVE_SLOTS],
}

impl BattleSnapshot {
    /// Whether at least one move label was read
    pub fn has_moves(&self) -> bool {
        self.moves.iter().any(|m| !m.is_empty())
    }
}

/// What to do this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleDecision {
    /// Run from the battle
    Flee,
    /// Send out the roster member at this list position
    Switch(usize),
    /// Use the move in this 0-based slot
    Attack(usize),
}

/// State kept across turns of one battle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleTracker {
    /// Last opponent successfully read
    pub current_enemy: Option<String>,
    /// Turns taken against the current opponent
    pub turn_count: u32,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the opponent read this turn. Returns true if it differs from
    /// the previous one, in which case the turn counter restarts.
    pub fn observe_enemy(&mut self, name: &str) -> bool {
        if self.current_enemy.as_deref() == Some(name) {
            return false;
        }
        self.current_enemy = Some(name.to_string());
        self.turn_count = 0;
        true
    }

    /// Count a dispatched action
    pub fn record_turn(&mut self) {
        self.turn_count += 1;
    }

    /// Forget everything about the current battle
    pub fn reset(&mut self) {
        self.current_enemy = None;
        self.turn_count = 0;
    }
}
