//! Main automation loop
//!
//! Polls frames, classifies them and routes each one to the exploration
//! handler or the turn engine. Runs until a shiny is found, the running flag
//! is cleared or an iteration limit is reached.

pub mod exploration;
pub mod turn;

pub use exploration::{ExplorationHandler, ExplorationOutcome};
pub use turn::{TurnEngine, TurnOutcome};

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ai::BattlePolicy;
use crate::config::settings::BotSettings;
use crate::config::Settings;
use crate::game::memory::{BattleMemory, MemoryError, MoveMemory};
use crate::game::state::{GameState, StateTracker, StateTransition};
use crate::input::{ActionDispatcher, InputError, InputSink};
use crate::vision::capture::FrameSource;
use crate::vision::matching::{NccMatcher, TemplateLibrary};
use crate::vision::ocr::{FieldReader, OcrError, TextRecognizer};
use crate::vision::recognition::StateClassifier;
use crate::vision::VisionError;

/// Errors that end a loop iteration
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("Move memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// Result of one loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    Explored(ExplorationOutcome),
    Battled(TurnOutcome),
    /// The frame could not be classified
    Idle,
    /// Terminal: a shiny was found
    ShinyFound,
}

/// Totals of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub failed_iterations: u64,
    pub battles: u32,
    pub shiny_found: bool,
}

/// The capture -> classify -> handle loop
pub struct BotLoop {
    frames: Box<dyn FrameSource>,
    classifier: StateClassifier,
    dispatcher: ActionDispatcher,
    engine: TurnEngine,
    explorer: ExplorationHandler,
    tracker: StateTracker,
    settings: BotSettings,
    running: Arc<AtomicBool>,
}

impl BotLoop {
    pub fn new(
        frames: Box<dyn FrameSource>,
        classifier: StateClassifier,
        dispatcher: ActionDispatcher,
        engine: TurnEngine,
        explorer: ExplorationHandler,
        settings: BotSettings,
    ) -> Self {
        Self {
            frames,
            classifier,
            dispatcher,
            engine,
            explorer,
            tracker: StateTracker::new(),
            settings,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Wire up every component from settings.
    ///
    /// Loads the template images and the move memory file named in
    /// `settings` and seeds the roster with the configured team. Missing
    /// templates only produce warnings; an unreadable memory file is an
    /// error.
    pub fn from_settings(
        settings: &Settings,
        frames: Box<dyn FrameSource>,
        sink: Box<dyn InputSink>,
        recognizer: Box<dyn TextRecognizer>,
        policy: Box<dyn BattlePolicy>,
    ) -> Result<Self, BotError> {
        let templates = Rc::new(TemplateLibrary::load(&settings.assets, Box::new(NccMatcher)));
        let moves = MoveMemory::load(&settings.memory.path)?;

        let classifier = StateClassifier::new(Rc::clone(&templates), settings.detection.clone());
        let dispatcher = ActionDispatcher::new(sink, Rc::clone(&templates), settings);
        let reader = FieldReader::new(recognizer, settings.regions.clone());
        let engine = TurnEngine::new(
            reader,
            policy,
            BattleMemory::with_team(moves, &settings.strategy.team),
            settings.battle.clone(),
        );
        let explorer = ExplorationHandler::new(
            templates,
            settings.detection.clone(),
            settings.exploration.clone(),
        );

        Ok(Self::new(
            frames,
            classifier,
            dispatcher,
            engine,
            explorer,
            settings.bot.clone(),
        ))
    }

    /// Flag that stops the loop at the start of the next iteration when
    /// cleared. May be handed to another thread.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Run one iteration
    pub fn step(&mut self) -> Result<LoopOutcome, BotError> {
        let frame = self.frames.capture()?;
        let state = self.classifier.classify(&frame);

        match self.tracker.update(state) {
            StateTransition::BattleStarted => {
                log::info!("Battle #{} started", self.tracker.battles_seen);
            }
            StateTransition::BattleEnded => {
                log::info!("Battle ended, back to {:?}", state);
                self.engine.reset_battle_state();
            }
            StateTransition::Changed => log::debug!("State changed to {:?}", state),
            StateTransition::Unchanged => {}
        }

        match state {
            GameState::ShinyFound => {
                log::error!("SHINY FOUND! Stopping automation.");
                self.stop();
                Ok(LoopOutcome::ShinyFound)
            }
            GameState::InBattle => {
                let outcome = self
                    .engine
                    .execute_turn(&frame, self.frames.as_mut(), &mut self.dispatcher)?;
                Ok(LoopOutcome::Battled(outcome))
            }
            GameState::Exploring => {
                let outcome = self.explorer.handle(
                    &frame,
                    &self.classifier,
                    self.frames.as_mut(),
                    &mut self.dispatcher,
                )?;
                Ok(LoopOutcome::Explored(outcome))
            }
            GameState::Unknown => Ok(LoopOutcome::Idle),
        }
    }

    /// Loop until stopped, sleeping between iterations.
    ///
    /// A failed iteration is logged and followed by a longer pause; it never
    /// ends the run.
    pub fn run(&mut self, max_iterations: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();
        log::info!("Automation started");

        while self.is_running() {
            if max_iterations.is_some_and(|max| summary.iterations >= max) {
                log::info!("Reached {} iterations", summary.iterations);
                break;
            }
            summary.iterations += 1;

            let pause = match self.step() {
                Ok(LoopOutcome::ShinyFound) => {
                    summary.shiny_found = true;
                    break;
                }
                Ok(outcome) => {
                    log::debug!("Iteration {}: {:?}", summary.iterations, outcome);
                    self.settings.loop_interval_ms
                }
                Err(e) => {
                    log::error!("Iteration {} failed: {}", summary.iterations, e);
                    summary.failed_iterations += 1;
                    self.settings.error_backoff_ms
                }
            };
            std::thread::sleep(Duration::from_millis(pause));
        }

        summary.battles = self.tracker.battles_seen;
        log::info!(
            "Automation stopped after {} iterations ({} battles)",
            summary.iterations,
            summary.battles
        );
        summary
    }
}
