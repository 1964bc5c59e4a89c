//! Game state representation
//!
//! Tracks which phase the game is in and the transitions between phases.

use serde::{Deserialize, Serialize};

/// Game phase classified from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Walking around the overworld
    Exploring,
    /// Battle menu is on screen
    InBattle,
    /// Shiny marker on screen
    ShinyFound,
    /// Nothing could be classified
    Unknown,
}

impl GameState {
    /// Check if this is a battle-related state
    pub fn is_battle(&self) -> bool {
        matches!(self, GameState::InBattle)
    }

    /// Whether the loop should stop on this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::ShinyFound)
    }
}

/// Turn engine progress within one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Outside cooldown, ready to act
    Idle,
    /// Reading names and moves off the screen
    Perceiving,
    /// Waiting on the decision policy
    Deciding,
    /// Dispatching the chosen action
    Acting,
}

/// Transition observed between two consecutive classified frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    /// Same state as the previous frame
    Unchanged,
    /// A battle menu appeared
    BattleStarted,
    /// The battle menu went away
    BattleEnded,
    /// Any other change
    Changed,
}

/// Tracks the classified state across loop iterations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTracker {
    /// Current state
    pub current: GameState,
    /// Previous state (for transition detection)
    pub previous: GameState,
    /// Number of frames in current state
    pub frames_in_state: u32,
    /// Battles entered since start
    pub battles_seen: u32,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            current: GameState::Unknown,
            previous: GameState::Unknown,
            frames_in_state: 0,
            battles_seen: 0,
        }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state of a new frame
    pub fn update(&mut self, new_state: GameState) -> StateTransition {
        if new_state == self.current {
            self.frames_in_state += 1;
            return StateTransition::Unchanged;
        }

        self.previous = self.current;
        self.current = new_state;
        self.frames_in_state = 0;

        match (self.previous.is_battle(), new_state.is_battle()) {
            (false, true) => {
                self.battles_seen += 1;
                StateTransition::BattleStarted
            }
            (true, false) => StateTransition::BattleEnded,
            _ => StateTransition::Changed,
        }
    }
}
