//! User settings
//!
//! Defines all configurable options for the automation. Every section has
//! defaults so a settings file only needs to list what it changes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::stealth::StealthConfig;
use crate::vision::geometry::Region;
use crate::vision::matching::TemplateKind;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Main loop behaviour
    pub bot: BotSettings,
    /// Template thresholds and search areas
    pub detection: DetectionSettings,
    /// Screen regions of text fields and buttons
    pub regions: RegionSettings,
    /// Battle timing
    pub battle: BattleSettings,
    /// Overworld behaviour
    pub exploration: ExplorationSettings,
    /// Pointer behaviour
    pub input: InputSettings,
    /// Template image files
    pub assets: AssetSettings,
    /// Move memory storage
    pub memory: MemorySettings,
    /// OCR engine
    pub ocr: OcrSettings,
    /// Timing humanization
    pub stealth: StealthConfig,
    /// Built-in decision policy
    pub strategy: StrategySettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// General loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Sleep between loop iterations (ms)
    pub loop_interval_ms: u64,
    /// Sleep after a failed iteration (ms)
    pub error_backoff_ms: u64,
    /// Verbose logging
    pub debug: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            loop_interval_ms: 1000,
            error_backoff_ms: 5000,
            debug: false,
        }
    }
}

/// Template similarity thresholds and search areas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub shiny_threshold: f32,
    /// Shared by the four battle menu buttons during classification
    pub battle_button_threshold: f32,
    pub talk_threshold: f32,
    pub goto_threshold: f32,
    /// Thresholds for template-guided clicks on battle buttons
    pub fight_threshold: f32,
    pub roster_threshold: f32,
    pub run_threshold: f32,
    /// Restrict battle button search to this area
    pub battle_area: Option<Region>,
    /// Restrict dialogue indicator search to this area
    pub talk_search_area: Option<Region>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            shiny_threshold: 0.85,
            battle_button_threshold: 0.75,
            talk_threshold: 0.95,
            goto_threshold: 0.8,
            fight_threshold: 0.85,
            roster_threshold: 0.85,
            run_threshold: 0.85,
            battle_area: None,
            talk_search_area: None,
        }
    }
}

impl DetectionSettings {
    /// Click threshold for a template
    pub fn threshold_for(&self, kind: TemplateKind) -> f32 {
        match kind {
            TemplateKind::Shiny => self.shiny_threshold,
            TemplateKind::Talk => self.talk_threshold,
            TemplateKind::Goto => self.goto_threshold,
            TemplateKind::Fight => self.fight_threshold,
            TemplateKind::Items => self.battle_button_threshold,
            TemplateKind::Roster => self.roster_threshold,
            TemplateKind::Run => self.run_threshold,
        }
    }
}

/// Screen regions, each `[x1, y1, x2, y2]` or `[x, y, w, h]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    /// Opponent name plate
    pub enemy_name: Option<Region>,
    /// Own creature name plate
    pub player_name: Option<Region>,
    /// The four move buttons, slot 1 first
    pub moves: [Option<Region>; 4],
    /// Run button
    pub btn_run: Option<Region>,
    /// Button opening the switch menu
    pub btn_roster: Option<Region>,
    /// Switch menu list
    pub switch_menu: Option<SwitchMenu>,
}

/// Switch menu layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchMenu {
    /// Area holding the list rows
    pub container: Region,
    /// Height of one row in pixels
    #[serde(default = "default_row_height")]
    pub row_height: i32,
}

fn default_row_height() -> i32 {
    30
}

/// Battle timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Base cooldown after flee (ms), also the base for switches
    pub action_cooldown_ms: u64,
    /// Cooldown after an attack, covering its animation (ms)
    pub attack_cooldown_ms: u64,
    /// Extra cooldown added on top of the base after a switch (ms)
    pub switch_extra_cooldown_ms: u64,
    /// Wait for the switch menu to open (ms)
    pub roster_settle_ms: u64,
    /// Click the fight button and recapture before reading moves
    pub open_fight_menu: bool,
    /// Wait for the move menu after clicking fight (ms)
    pub fight_to_moves_delay_ms: u64,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            action_cooldown_ms: 1500,
            attack_cooldown_ms: 4000,
            switch_extra_cooldown_ms: 2000,
            roster_settle_ms: 1000,
            open_fight_menu: false,
            fight_to_moves_delay_ms: 1200,
        }
    }
}

/// Overworld settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSettings {
    /// Minimum time between two clicks on the goto button (ms)
    pub goto_cooldown_ms: u64,
    /// Wait after clicking goto while the character walks (ms)
    pub goto_walk_ms: u64,
    /// Margin kept from the goto button's edges
    pub goto_margin: f32,
    /// Key advancing dialogue
    pub advance_key: String,
}

impl Default for ExplorationSettings {
    fn default() -> Self {
        Self {
            goto_cooldown_ms: 15_000,
            goto_walk_ms: 2000,
            goto_margin: 0.1,
            advance_key: "space".to_string(),
        }
    }
}

/// Pointer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Glide duration before each click, 0 clicks in place (ms)
    pub mouse_move_duration_ms: u64,
    /// Margin kept from the edges of template-matched buttons
    pub template_click_margin: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            mouse_move_duration_ms: 0,
            template_click_margin: 0.2,
        }
    }
}

/// Template image locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub templates_dir: String,
    pub shiny_image: String,
    pub talk_image: String,
    pub goto_image: String,
    pub fight_image: String,
    pub items_image: String,
    pub roster_image: String,
    pub run_image: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            templates_dir: "assets/templates".to_string(),
            shiny_image: "shiny.png".to_string(),
            talk_image: "talk.png".to_string(),
            goto_image: "goto.png".to_string(),
            fight_image: "fight.png".to_string(),
            items_image: "bag.png".to_string(),
            roster_image: "roster.png".to_string(),
            run_image: "run.png".to_string(),
        }
    }
}

impl AssetSettings {
    /// Configured file name of a template
    pub fn file_name(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Shiny => &self.shiny_image,
            TemplateKind::Talk => &self.talk_image,
            TemplateKind::Goto => &self.goto_image,
            TemplateKind::Fight => &self.fight_image,
            TemplateKind::Items => &self.items_image,
            TemplateKind::Roster => &self.roster_image,
            TemplateKind::Run => &self.run_image,
        }
    }
}

/// Move memory storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub path: String,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            path: "data/known_moves.json".to_string(),
        }
    }
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Path or name of the tesseract executable
    pub tesseract_path: String,
    /// Tesseract language code
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

/// Tables for the built-in battle strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    /// Opponents to run from
    pub flee_from: Vec<String>,
    /// Run from every opponent (pure shiny hunting)
    pub flee_all: bool,
    /// Opponent name -> own creature to switch to
    pub switch_on: BTreeMap<String, String>,
    /// Move labels to prefer, best first
    pub preferred_moves: Vec<String>,
    /// Team in switch-menu order, lead first. Seeds the roster until the
    /// switch menu is first read.
    pub team: Vec<String>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
