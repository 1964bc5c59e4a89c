//! Game state classification
//!
//! Decides which phase the game is in by looking for known markers in the
//! frame. The shiny marker wins over everything, any battle button means we
//! are in a battle, and anything else is treated as exploring.

use std::rc::Rc;

use super::capture::Frame;
use super::matching::{TemplateKind, TemplateLibrary};
use super::region::crop_rect;
use crate::config::settings::DetectionSettings;
use crate::game::state::GameState;

/// Template-based state classifier
pub struct StateClassifier {
    templates: Rc<TemplateLibrary>,
    detection: DetectionSettings,
}

impl StateClassifier {
    /// Create a classifier over a shared template library
    pub fn new(templates: Rc<TemplateLibrary>, detection: DetectionSettings) -> Self {
        Self {
            templates,
            detection,
        }
    }

    /// Classify one frame
    pub fn classify(&self, frame: &Frame) -> GameState {
        if frame.width() == 0 || frame.height() == 0 {
            return GameState::Unknown;
        }

        if self.detect_shiny(frame) {
            return GameState::ShinyFound;
        }

        if self.detect_battle_buttons(frame) {
            return GameState::InBattle;
        }

        GameState::Exploring
    }

    fn detect_shiny(&self, frame: &Frame) -> bool {
        let Some(found) = self.templates.find(TemplateKind::Shiny, frame) else {
            return false;
        };

        let threshold = self.detection.shiny_threshold;
        log::debug!("Shiny score {:.3} (threshold {})", found.score, threshold);

        if found.score >= threshold {
            log::info!(
                "Shiny marker detected with score {:.3} (threshold {})",
                found.score,
                threshold
            );
            return true;
        }
        false
    }

    fn detect_battle_buttons(&self, frame: &Frame) -> bool {
        // Search only the battle area when one is configured
        let area = self
            .detection
            .battle_area
            .as_ref()
            .and_then(|r| r.rect())
            .and_then(|rect| crop_rect(frame, rect));
        let haystack = area.as_ref().unwrap_or(frame);

        let threshold = self.detection.battle_button_threshold;

        TemplateKind::BATTLE_BUTTONS.iter().any(|&kind| {
            let Some(found) = self.templates.find(kind, haystack) else {
                return false;
            };
            if found.score >= threshold {
                log::debug!(
                    "Battle button {:?} detected with score {:.3} (threshold {})",
                    kind,
                    found.score,
                    threshold
                );
                return true;
            }
            false
        })
    }
}
