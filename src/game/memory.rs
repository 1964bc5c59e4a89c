//! Battle memory
//!
//! Move Memory maps creature names to the move labels last seen on their
//! move buttons and is persisted as pretty-printed JSON. The Current Roster
//! is the team as last read from the switch menu and only lives in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::battle::MOVE_SLOTS;

/// Largest team size
pub const MAX_ROSTER: usize = 6;

/// Case-normalized lookup key for a creature name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Persistent creature name -> move labels mapping
#[derive(Debug, Default)]
pub struct MoveMemory {
    path: Option<PathBuf>,
    moves: BTreeMap<String, Vec<String>>,
}

impl MoveMemory {
    /// In-memory only, never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file starts an empty memory that will be
    /// created on the first write.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        let moves = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        log::info!(
            "Loaded moves for {} creatures from {}",
            moves.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            moves,
        })
    }

    /// Known moves of a creature, in slot order
    pub fn moves_for(&self, name: &str) -> &[String] {
        self.moves
            .get(&normalize_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of creatures with known moves
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Replace the stored slots for `name` with a fresh read.
    ///
    /// Nothing is written when the name is empty or every slot is empty, so
    /// a failed read never erases what was learned before. Otherwise all
    /// slots are overwritten together. Returns whether the entry changed.
    pub fn record(
        &mut self,
        name: &str,
        slots: &[String; MOVE_SLOTS],
    ) -> Result<bool, MemoryError> {
        let key = normalize_name(name);
        if key.is_empty() || slots.iter().all(|s| s.is_empty()) {
            return Ok(false);
        }

        let entry: Vec<String> = slots.iter().map(|s| s.trim().to_string()).collect();
        if self.moves.get(&key) == Some(&entry) {
            return Ok(false);
        }

        log::debug!("Learned moves for {}: {:?}", key, entry);
        let previous = self.moves.insert(key.clone(), entry);
        if let Err(e) = self.save() {
            // Memory never runs ahead of the file
            match previous {
                Some(old) => self.moves.insert(key, old),
                None => self.moves.remove(&key),
            };
            return Err(e);
        }
        Ok(true)
    }

    /// Rewrite the whole file
    fn save(&self) -> Result<(), MemoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.moves)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// The team as last seen in the switch menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with names read from the screen, keeping at most
    /// six non-empty entries
    pub fn update(&mut self, names: &[String]) {
        self.names = names
            .iter()
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .take(MAX_ROSTER)
            .collect();
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First listed member
    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// List position of a member
    pub fn position_of(&self, name: &str) -> Option<usize> {
        let key = normalize_name(name);
        self.names.iter().position(|n| *n == key)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything the turn engine remembers for the decision policy
#[derive(Debug, Default)]
pub struct BattleMemory {
    pub moves: MoveMemory,
    pub roster: Roster,
}

impl BattleMemory {
    pub fn new(moves: MoveMemory) -> Self {
        Self {
            moves,
            roster: Roster::new(),
        }
    }

    /// Start with a known team, e.g. from settings
    pub fn with_team(moves: MoveMemory, team: &[String]) -> Self {
        let mut memory = Self::new(moves);
        memory.roster.update(team);
        memory
    }
}

/// Move memory persistence errors
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Failed to access move memory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed move memory: {0}")]
    Format(#[from] serde_json::Error),
}
