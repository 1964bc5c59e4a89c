//! Action dispatcher
//!
//! Turns battle decisions and exploration clicks into input actions, using
//! the configured screen regions and template matches. It also owns the
//! action cooldown that rate-limits battle turns.

use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{InputAction, InputError, InputSink};
use crate::config::settings::{BattleSettings, DetectionSettings, InputSettings, RegionSettings};
use crate::config::Settings;
use crate::stealth::Humanizer;
use crate::vision::capture::Frame;
use crate::vision::geometry::{Rect, Region};
use crate::vision::matching::{TemplateKind, TemplateLibrary};
use crate::vision::region::{crop_origin, crop_safe};

/// Sends clicks, key presses and settle waits to an [`InputSink`]
pub struct ActionDispatcher {
    sink: Box<dyn InputSink>,
    humanizer: Humanizer,
    templates: Rc<TemplateLibrary>,
    regions: RegionSettings,
    detection: DetectionSettings,
    battle: BattleSettings,
    input: InputSettings,
    /// No battle action before this instant
    cooldown_until: Option<Instant>,
}

impl ActionDispatcher {
    pub fn new(
        sink: Box<dyn InputSink>,
        templates: Rc<TemplateLibrary>,
        settings: &Settings,
    ) -> Self {
        Self {
            sink,
            humanizer: Humanizer::new(settings.stealth.clone()),
            templates,
            regions: settings.regions.clone(),
            detection: settings.detection.clone(),
            battle: settings.battle.clone(),
            input: settings.input.clone(),
            cooldown_until: None,
        }
    }

    /// Whether the last battle action is still settling
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining() > Duration::ZERO
    }

    pub fn cooldown_remaining(&self) -> Duration {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    fn start_cooldown(&mut self, duration_ms: u64) {
        self.cooldown_until = Some(Instant::now() + Duration::from_millis(duration_ms));
    }

    /// Click a screen coordinate, gliding there first when configured
    pub fn click(&mut self, x: i32, y: i32) -> Result<(), InputError> {
        if self.input.mouse_move_duration_ms > 0 {
            self.sink.perform(&InputAction::MoveTo {
                x,
                y,
                duration_ms: self.input.mouse_move_duration_ms,
            })?;
        }
        log::debug!("Click at ({}, {})", x, y);
        self.sink.perform(&InputAction::Click { x, y })
    }

    /// Click a random point inside `rect`, away from its edges
    pub fn click_within(&mut self, rect: Rect, margin: f32) -> Result<(), InputError> {
        let (x, y) = self.humanizer.random_point(rect, margin);
        self.click(x, y)
    }

    pub fn press(&mut self, key: &str) -> Result<(), InputError> {
        log::debug!("Press {}", key);
        self.sink.perform(&InputAction::Press {
            key: key.to_string(),
        })
    }

    /// Wait for an animation to settle, with humanized variance
    pub fn settle(&mut self, base_delay_ms: u64) -> Result<(), InputError> {
        let duration_ms = self.humanizer.settle_delay(base_delay_ms);
        self.sink.perform(&InputAction::Wait { duration_ms })
    }

    /// Click a template if it is visible in `frame`.
    ///
    /// Searches the whole frame, or only `area` when given. Returns whether
    /// a click happened so callers can chain fallbacks.
    pub fn click_template(
        &mut self,
        frame: &Frame,
        kind: TemplateKind,
        area: Option<&Region>,
    ) -> Result<bool, InputError> {
        let threshold = self.detection.threshold_for(kind);
        let (offset, found) = match area {
            Some(region) => {
                let haystack = crop_safe(frame, region);
                (crop_origin(frame, region), self.templates.find(kind, &haystack))
            }
            None => ((0, 0), self.templates.find(kind, frame)),
        };

        let Some(found) = found else {
            log::debug!("Template {:?} not available", kind);
            return Ok(false);
        };
        if found.score < threshold {
            log::debug!(
                "Template {:?} score {:.3} below {:.2}",
                kind,
                found.score,
                threshold
            );
            return Ok(false);
        }

        self.click_within(found.bounds(offset), self.input.template_click_margin)?;
        Ok(true)
    }

    /// Click the center of a move slot. Slots are 0-based.
    pub fn attack(&mut self, slot: usize) -> Result<bool, InputError> {
        let slot_region = self.regions.moves.get(slot).and_then(Option::as_ref);
        let Some(rect) = slot_region.and_then(Region::rect) else {
            log::warn!("Move slot {} region not configured, cannot attack", slot + 1);
            return Ok(false);
        };

        let (x, y) = rect.center();
        log::info!("Attack with move {} at ({}, {})", slot + 1, x, y);
        self.click(x, y)?;
        self.start_cooldown(self.battle.attack_cooldown_ms);
        Ok(true)
    }

    /// Click the run button, or the run template when no region is set
    pub fn flee(&mut self, frame: &Frame) -> Result<bool, InputError> {
        let clicked = match self.regions.btn_run.as_ref().and_then(Region::rect) {
            Some(rect) => {
                let (x, y) = rect.center();
                log::info!("Flee at ({}, {})", x, y);
                self.click(x, y)?;
                true
            }
            None => {
                let clicked = self.click_template(frame, TemplateKind::Run, None)?;
                if clicked {
                    log::info!("Flee via run button template");
                } else {
                    log::warn!("Run button not configured and not found, cannot flee");
                }
                clicked
            }
        };

        if clicked {
            self.start_cooldown(self.battle.action_cooldown_ms);
        }
        Ok(clicked)
    }

    /// First half of a switch: open the switch menu and let it settle.
    ///
    /// Does nothing unless both the roster button and the switch menu are
    /// configured, so an opened menu can always be completed by
    /// [`pick_roster_row`](Self::pick_roster_row).
    pub fn open_roster(&mut self) -> Result<bool, InputError> {
        let button = self.regions.btn_roster.as_ref().and_then(Region::rect);
        let container = self.roster_container();
        let (Some(button), Some(_)) = (button, container) else {
            log::warn!("Roster button or switch menu not configured, cannot switch");
            return Ok(false);
        };

        let (x, y) = button.center();
        log::debug!("Open roster at ({}, {})", x, y);
        self.click(x, y)?;
        self.start_cooldown(self.battle.action_cooldown_ms);
        self.settle(self.battle.roster_settle_ms)?;
        Ok(true)
    }

    /// Second half of a switch: click a row of the open switch menu.
    ///
    /// The click is not verified; a confirmation dialog after the click is
    /// left for the next turn to deal with.
    pub fn pick_roster_row(&mut self, index: usize) -> Result<bool, InputError> {
        let Some((container, row_height)) = self.roster_container() else {
            log::warn!("Switch menu not configured, cannot pick roster row");
            return Ok(false);
        };

        let (x, y) = roster_row_point(container, row_height, index);
        log::info!("Switch to roster position {} at ({}, {})", index + 1, x, y);
        self.click(x, y)?;
        self.start_cooldown(self.battle.action_cooldown_ms + self.battle.switch_extra_cooldown_ms);
        Ok(true)
    }

    fn roster_container(&self) -> Option<(Rect, i32)> {
        let menu = self.regions.switch_menu.as_ref()?;
        let rect = menu.container.rect()?;
        Some((rect, menu.row_height))
    }
}

/// Center of row `index` of a list starting at the container's top edge
fn roster_row_point(container: Rect, row_height: i32, index: usize) -> (i32, i32) {
    let (x, _) = container.center();
    let y = container.y1 + index as i32 * row_height + row_height / 2;
    (x, y)
}
