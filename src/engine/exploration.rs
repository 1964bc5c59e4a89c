//! Overworld handling
//!
//! Outside battle the bot advances dialogue and follows the quest "go to"
//! button, which walks the character until the next encounter.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::settings::{DetectionSettings, ExplorationSettings};
use crate::game::state::GameState;
use crate::input::ActionDispatcher;
use crate::vision::capture::{Frame, FrameSource};
use crate::vision::matching::{TemplateKind, TemplateLibrary};
use crate::vision::recognition::StateClassifier;
use crate::vision::region::crop_safe;

use super::BotError;

/// What the exploration handler did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationOutcome {
    /// A dialogue was advanced
    Dialogue,
    /// The goto button was clicked
    Goto,
    /// Nothing recognizable, the advance key was pressed
    Advanced,
    /// A battle started before the goto click
    BattleDetected,
    /// No goto template is loaded
    NoGotoTemplate,
}

pub struct ExplorationHandler {
    templates: Rc<TemplateLibrary>,
    detection: DetectionSettings,
    exploration: ExplorationSettings,
    last_goto: Option<Instant>,
}

impl ExplorationHandler {
    pub fn new(
        templates: Rc<TemplateLibrary>,
        detection: DetectionSettings,
        exploration: ExplorationSettings,
    ) -> Self {
        Self {
            templates,
            detection,
            exploration,
            last_goto: None,
        }
    }

    fn goto_ready(&self) -> bool {
        let cooldown = Duration::from_millis(self.exploration.goto_cooldown_ms);
        self.last_goto.is_none_or(|at| at.elapsed() >= cooldown)
    }

    /// Handle one Exploring frame
    pub fn handle(
        &mut self,
        frame: &Frame,
        classifier: &StateClassifier,
        frames: &mut dyn FrameSource,
        dispatcher: &mut ActionDispatcher,
    ) -> Result<ExplorationOutcome, BotError> {
        let talk = match &self.detection.talk_search_area {
            Some(area) => self.templates.find(TemplateKind::Talk, &crop_safe(frame, area)),
            None => self.templates.find(TemplateKind::Talk, frame),
        };
        if let Some(talk) = talk {
            log::debug!("Talk indicator score {:.3}", talk.score);
            if talk.score > self.detection.talk_threshold {
                log::info!("Advancing dialogue");
                dispatcher.press(&self.exploration.advance_key)?;
                return Ok(ExplorationOutcome::Dialogue);
            }
        }

        if !self.templates.has(TemplateKind::Goto) {
            log::warn!("Goto template not loaded, cannot explore");
            return Ok(ExplorationOutcome::NoGotoTemplate);
        }
        let goto = self.templates.find(TemplateKind::Goto, frame);

        // An encounter may have started while matching
        let latest = frames.capture()?;
        if classifier.classify(&latest) == GameState::InBattle {
            log::info!("Battle started, skipping goto");
            return Ok(ExplorationOutcome::BattleDetected);
        }

        if let Some(goto) = goto {
            log::debug!("Goto button score {:.3}", goto.score);
            if goto.score > self.detection.goto_threshold && self.goto_ready() {
                log::info!("Following quest marker");
                dispatcher.click_within(goto.bounds((0, 0)), self.exploration.goto_margin)?;
                self.last_goto = Some(Instant::now());
                dispatcher.settle(self.exploration.goto_walk_ms)?;
                return Ok(ExplorationOutcome::Goto);
            }
        }

        dispatcher.press(&self.exploration.advance_key)?;
        Ok(ExplorationOutcome::Advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    use crate::config::Settings;
    use crate::input::tests::RecordingSink;
    use crate::input::InputAction;
    use crate::stealth::StealthConfig;
    use crate::vision::geometry::Rect;
    use crate::vision::recognition::tests::{scripted_library, ScriptedMatcher};
    use crate::vision::VisionError;

    struct StillFrames(Frame);

    impl FrameSource for StillFrames {
        fn capture(&mut self) -> Result<Frame, VisionError> {
            Ok(self.0.clone())
        }
    }

    fn frame() -> Frame {
        ImageBuffer::from_pixel(320, 240, Rgba([60, 120, 60, 255]))
    }

    struct Harness {
        handler: ExplorationHandler,
        classifier: StateClassifier,
        dispatcher: ActionDispatcher,
        sink: RecordingSink,
    }

    impl Harness {
        fn handle(&mut self) -> ExplorationOutcome {
            self.handler
                .handle(
                    &frame(),
                    &self.classifier,
                    &mut StillFrames(frame()),
                    &mut self.dispatcher,
                )
                .unwrap()
        }
    }

    fn harness(library: TemplateLibrary) -> Harness {
        let mut settings = Settings::default();
        settings.stealth = StealthConfig::disabled();
        let templates = Rc::new(library);
        let sink = RecordingSink::new();
        Harness {
            handler: ExplorationHandler::new(
                templates.clone(),
                settings.detection.clone(),
                settings.exploration.clone(),
            ),
            classifier: StateClassifier::new(templates.clone(), settings.detection.clone()),
            dispatcher: ActionDispatcher::new(Box::new(sink.clone()), templates, &settings),
            sink,
        }
    }

    fn space() -> InputAction {
        InputAction::Press {
            key: "space".to_string(),
        }
    }

    #[test]
    fn test_dialogue_advanced() {
        let mut h = harness(scripted_library(&[
            (TemplateKind::Talk, 0.97),
            (TemplateKind::Goto, 0.9),
        ]));

        assert_eq!(h.handle(), ExplorationOutcome::Dialogue);
        assert_eq!(*h.sink.actions.borrow(), vec![space()]);
    }

    #[test]
    fn test_goto_clicked_then_cooling_down() {
        let mut h = harness(scripted_library(&[
            (TemplateKind::Talk, 0.95),
            (TemplateKind::Goto, 0.9),
        ]));

        assert_eq!(h.handle(), ExplorationOutcome::Goto);
        {
            let actions = h.sink.actions.borrow();
            let InputAction::Click { x, y } = actions[0] else {
                panic!("expected a click, got {:?}", actions);
            };
            assert!(Rect::from_origin_size(10, 20, 40, 20).contains(x, y));
            assert_eq!(actions[1], InputAction::Wait { duration_ms: 2000 });
        }

        // Goto cooldown: falls through to the advance key
        assert_eq!(h.handle(), ExplorationOutcome::Advanced);
        assert_eq!(h.sink.actions.borrow().last(), Some(&space()));
    }

    #[test]
    fn test_weak_goto_presses_advance() {
        let mut h = harness(scripted_library(&[(TemplateKind::Goto, 0.8)]));

        assert_eq!(h.handle(), ExplorationOutcome::Advanced);
        assert_eq!(*h.sink.actions.borrow(), vec![space()]);
    }

    #[test]
    fn test_battle_aborts_goto() {
        let mut h = harness(scripted_library(&[
            (TemplateKind::Goto, 0.9),
            (TemplateKind::Run, 0.8),
        ]));

        assert_eq!(h.handle(), ExplorationOutcome::BattleDetected);
        assert!(h.sink.actions.borrow().is_empty());
    }

    #[test]
    fn test_missing_goto_template() {
        let mut library = TemplateLibrary::new(Box::new(ScriptedMatcher::new(&[(
            TemplateKind::Talk,
            0.2,
        )])));
        library.insert(TemplateKind::Talk, ImageBuffer::new(20, 10));
        let mut h = harness(library);

        assert_eq!(h.handle(), ExplorationOutcome::NoGotoTemplate);
        assert!(h.sink.actions.borrow().is_empty());
    }
}
