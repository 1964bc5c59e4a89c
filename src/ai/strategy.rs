//! Table-driven battle strategy
//!
//! Flees from listed opponents, switches to a counter creature when the
//! opponent has an entry in the switch table, and otherwise attacks with the
//! most preferred known move.

use std::collections::{BTreeMap, BTreeSet};

use super::BattlePolicy;
use crate::config::settings::StrategySettings;
use crate::game::memory::{normalize_name, BattleMemory};

/// Battle strategy configuration
#[derive(Debug, Clone, Default)]
pub struct BattleStrategy {
    flee_all: bool,
    flee_from: BTreeSet<String>,
    /// Opponent -> own creature, both normalized
    switch_on: BTreeMap<String, String>,
    /// Preferred move labels, lowercased, best first
    preferred_moves: Vec<String>,
}

impl BattleStrategy {
    /// Create a new strategy
    pub fn new(settings: &StrategySettings) -> Self {
        Self {
            flee_all: settings.flee_all,
            flee_from: settings.flee_from.iter().map(|n| normalize_name(n)).collect(),
            switch_on: settings
                .switch_on
                .iter()
                .map(|(enemy, own)| (normalize_name(enemy), normalize_name(own)))
                .collect(),
            preferred_moves: settings
                .preferred_moves
                .iter()
                .map(|m| normalize_name(m))
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }
}

impl BattlePolicy for BattleStrategy {
    fn should_flee(&self, _own: &str, enemy: &str, _memory: &BattleMemory) -> bool {
        self.flee_all || self.flee_from.contains(&normalize_name(enemy))
    }

    fn choose_switch_target(&self, enemy: &str, memory: &BattleMemory) -> Option<usize> {
        let target = self.switch_on.get(&normalize_name(enemy))?;
        match memory.roster.position_of(target) {
            // The active creature heads the switch menu
            Some(0) => None,
            Some(index) => Some(index),
            None => {
                log::debug!("Switch target {} not in roster {:?}", target, memory.roster.names());
                None
            }
        }
    }

    fn best_move(&self, own: &str, _enemy: &str, memory: &BattleMemory) -> usize {
        let known = memory.moves.moves_for(own);

        let preferred = self.preferred_moves.iter().find_map(|wanted| {
            known
                .iter()
                .position(|label| normalize_name(label) == *wanted)
        });

        preferred
            .or_else(|| known.iter().position(|label| !label.is_empty()))
            .unwrap_or(0)
    }
}
