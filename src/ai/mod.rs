//! Battle decision policy
//!
//! The turn engine asks a [`BattlePolicy`] three questions in a fixed order
//! and acts on the first one that yields a decision.

pub mod strategy;

pub use strategy::BattleStrategy;

use crate::game::battle::BattleDecision;
use crate::game::memory::BattleMemory;

/// Decides what to do on a battle turn.
///
/// Implementations are queries: they must not depend on being called, or on
/// being called a particular number of times. `own` may be empty when the
/// active creature could not be identified.
pub trait BattlePolicy {
    /// Whether to run from this opponent
    fn should_flee(&self, own: &str, enemy: &str, memory: &BattleMemory) -> bool;

    /// Roster position to switch to, if any
    fn choose_switch_target(&self, enemy: &str, memory: &BattleMemory) -> Option<usize>;

    /// Move slot (0-based) to attack with
    fn best_move(&self, own: &str, enemy: &str, memory: &BattleMemory) -> usize;
}

/// Query the policy in priority order: flee, then switch, then attack
pub fn decide(
    policy: &dyn BattlePolicy,
    own: &str,
    enemy: &str,
    memory: &BattleMemory,
) -> BattleDecision {
    if policy.should_flee(own, enemy, memory) {
        return BattleDecision::Flee;
    }
    if let Some(index) = policy.choose_switch_target(enemy, memory) {
        return BattleDecision::Switch(index);
    }
    BattleDecision::Attack(policy.best_move(own, enemy, memory))
}
