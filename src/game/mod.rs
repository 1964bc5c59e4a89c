//! Game state and memory module
//!
//! This module contains the game phase model, per-battle tracking and the
//! move/roster memory shared with the decision policy.

pub mod battle;
pub mod memory;
pub mod state;

pub use battle::{BattleDecision, BattleSnapshot, BattleTracker, MOVE_SLOTS};
pub use memory::{BattleMemory, MemoryError, MoveMemory, Roster};
pub use state::{GameState, StateTracker, StateTransition, TurnPhase};
