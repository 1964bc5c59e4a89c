//! Battle turn engine
//!
//! One call to [`TurnEngine::execute_turn`] reads the battle screen, refreshes
//! move memory, asks the decision policy and dispatches at most one action.

use crate::ai::{self, BattlePolicy};
use crate::config::settings::BattleSettings;
use crate::game::battle::{BattleDecision, BattleSnapshot, BattleTracker};
use crate::game::memory::BattleMemory;
use crate::game::state::TurnPhase;
use crate::input::ActionDispatcher;
use crate::vision::capture::{Frame, FrameSource};
use crate::vision::matching::TemplateKind;
use crate::vision::ocr::{FieldKey, FieldReader};

use super::BotError;

/// What a turn ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The previous action is still settling
    CoolingDown,
    /// The opponent name could not be read
    NoOpponent,
    /// The decision was dispatched
    Acted(BattleDecision),
    /// The decision could not be carried out, e.g. a missing region
    NotDispatched(BattleDecision),
}

/// Orchestrates battle turns
pub struct TurnEngine {
    reader: FieldReader,
    policy: Box<dyn BattlePolicy>,
    memory: BattleMemory,
    tracker: BattleTracker,
    phase: TurnPhase,
    battle: BattleSettings,
}

impl TurnEngine {
    pub fn new(
        reader: FieldReader,
        policy: Box<dyn BattlePolicy>,
        memory: BattleMemory,
        battle: BattleSettings,
    ) -> Self {
        Self {
            reader,
            policy,
            memory,
            tracker: BattleTracker::new(),
            phase: TurnPhase::Idle,
            battle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn memory(&self) -> &BattleMemory {
        &self.memory
    }

    pub fn tracker(&self) -> &BattleTracker {
        &self.tracker
    }

    /// Forget the current opponent and turn count. Memory is kept.
    pub fn reset_battle_state(&mut self) {
        self.tracker.reset();
        self.phase = TurnPhase::Idle;
    }

    /// Play one turn on `frame`.
    ///
    /// `frames` supplies fresh frames for sub-steps that change the screen
    /// (opening the move or switch menu). Perception misses end the turn
    /// without an action; only recognizer, input and storage failures are
    /// errors.
    pub fn execute_turn(
        &mut self,
        frame: &Frame,
        frames: &mut dyn FrameSource,
        dispatcher: &mut ActionDispatcher,
    ) -> Result<TurnOutcome, BotError> {
        if dispatcher.is_cooling_down() {
            log::debug!(
                "Cooling down for another {}ms",
                dispatcher.cooldown_remaining().as_millis()
            );
            return Ok(TurnOutcome::CoolingDown);
        }

        self.phase = TurnPhase::Perceiving;
        let outcome = self.play(frame, frames, dispatcher);
        self.phase = TurnPhase::Idle;
        outcome
    }

    fn play(
        &mut self,
        frame: &Frame,
        frames: &mut dyn FrameSource,
        dispatcher: &mut ActionDispatcher,
    ) -> Result<TurnOutcome, BotError> {
        // Checked before the fight pre-step so an empty read never clicks
        let enemy_name = self.reader.read_field(frame, FieldKey::EnemyName)?;
        if enemy_name.is_empty() {
            log::debug!("Opponent name not readable, skipping turn");
            return Ok(TurnOutcome::NoOpponent);
        }

        let moves_frame;
        let frame = if self.battle.open_fight_menu
            && dispatcher.click_template(frame, TemplateKind::Fight, None)?
        {
            dispatcher.settle(self.battle.fight_to_moves_delay_ms)?;
            moves_frame = frames.capture()?;
            &moves_frame
        } else {
            frame
        };

        let snapshot = self.perceive(frame, enemy_name)?;

        self.phase = TurnPhase::Deciding;
        let decision = ai::decide(
            self.policy.as_ref(),
            &snapshot.own_name,
            &snapshot.enemy_name,
            &self.memory,
        );
        log::info!(
            "{} vs {} (turn {}): {:?}",
            display_name(&snapshot.own_name),
            snapshot.enemy_name,
            self.tracker.turn_count + 1,
            decision
        );

        self.phase = TurnPhase::Acting;
        let dispatched = match decision {
            BattleDecision::Flee => dispatcher.flee(frame)?,
            BattleDecision::Switch(index) => self.switch(index, frames, dispatcher)?,
            BattleDecision::Attack(slot) => dispatcher.attack(slot)?,
        };

        if dispatched {
            self.tracker.record_turn();
            Ok(TurnOutcome::Acted(decision))
        } else {
            Ok(TurnOutcome::NotDispatched(decision))
        }
    }

    /// Read our side and the moves, and update move memory
    fn perceive(
        &mut self,
        frame: &Frame,
        enemy_name: String,
    ) -> Result<BattleSnapshot, BotError> {
        if self.tracker.observe_enemy(&enemy_name) {
            log::info!("New opponent: {}", enemy_name);
        }

        let mut own_name = self.reader.read_field(frame, FieldKey::PlayerName)?;
        if own_name.is_empty() {
            own_name = self.memory.roster.first().unwrap_or_default().to_string();
            log::debug!("Own name not readable, assuming {:?}", own_name);
        }

        let mut snapshot = BattleSnapshot {
            enemy_name,
            own_name,
            ..Default::default()
        };
        for (slot, label) in snapshot.moves.iter_mut().enumerate() {
            *label = self.reader.read_field(frame, FieldKey::MoveSlot(slot))?;
        }

        if snapshot.has_moves() {
            self.memory.moves.record(&snapshot.own_name, &snapshot.moves)?;
        }
        Ok(snapshot)
    }

    /// Open the switch menu, refresh the roster from it and pick a row
    fn switch(
        &mut self,
        index: usize,
        frames: &mut dyn FrameSource,
        dispatcher: &mut ActionDispatcher,
    ) -> Result<bool, BotError> {
        if !dispatcher.open_roster()? {
            return Ok(false);
        }

        let menu = frames.capture()?;
        let names = self.reader.read_roster(&menu)?;
        if names.is_empty() {
            log::debug!("Switch menu unreadable, keeping roster {:?}", self.memory.roster.names());
        } else {
            self.memory.roster.update(&names);
            log::info!("Roster: {:?}", self.memory.roster.names());
        }

        Ok(dispatcher.pick_roster_row(index)?)
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<unknown>"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use image::{ImageBuffer, Rgba};

    use crate::ai::tests::FixedPolicy;
    use crate::ai::BattleStrategy;
    use crate::config::settings::SwitchMenu;
    use crate::config::Settings;
    use crate::game::memory::MoveMemory;
    use crate::input::tests::RecordingSink;
    use crate::input::InputAction;
    use crate::stealth::StealthConfig;
    use crate::vision::geometry::Region;
    use crate::vision::ocr::tests::ScriptedRecognizer;
    use crate::vision::recognition::tests::scripted_library;
    use crate::vision::VisionError;

    /// Hands out copies of one frame and counts captures
    struct StillFrames {
        frame: Frame,
        captures: usize,
    }

    impl FrameSource for StillFrames {
        fn capture(&mut self) -> Result<Frame, VisionError> {
            self.captures += 1;
            Ok(self.frame.clone())
        }
    }

    fn frame() -> Frame {
        ImageBuffer::from_pixel(640, 480, Rgba([200, 200, 200, 255]))
    }

    fn still() -> StillFrames {
        StillFrames {
            frame: frame(),
            captures: 0,
        }
    }

    // Region sizes are distinct so the scripted recognizer can tell them apart
    const ENEMY: (u32, u32) = (100, 20);
    const PLAYER: (u32, u32) = (90, 20);
    const MOVE_1: (u32, u32) = (81, 30);
    const MOVE_2: (u32, u32) = (82, 30);
    const MENU: (u32, u32) = (150, 180);

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.stealth = StealthConfig::disabled();
        let regions = &mut settings.regions;
        regions.enemy_name = Some(Region::corners(400, 20, 500, 40));
        regions.player_name = Some(Region::corners(20, 300, 110, 320));
        regions.moves[0] = Some(Region::corners(20, 400, 101, 430));
        regions.moves[1] = Some(Region::corners(120, 400, 202, 430));
        regions.btn_run = Some(Region::corners(500, 400, 600, 440));
        regions.btn_roster = Some(Region::corners(500, 340, 600, 380));
        regions.switch_menu = Some(SwitchMenu {
            container: Region::corners(200, 100, 350, 280),
            row_height: 30,
        });
        settings
    }

    struct Harness {
        engine: TurnEngine,
        dispatcher: ActionDispatcher,
        sink: RecordingSink,
        frames: StillFrames,
    }

    impl Harness {
        fn turn(&mut self) -> TurnOutcome {
            self.engine
                .execute_turn(&frame(), &mut self.frames, &mut self.dispatcher)
                .unwrap()
        }
    }

    fn harness(
        settings: &Settings,
        answers: &[((u32, u32), &str)],
        policy: impl BattlePolicy + 'static,
        memory: BattleMemory,
    ) -> Harness {
        let sink = RecordingSink::new();
        let templates = Rc::new(scripted_library(&[(TemplateKind::Fight, 0.9)]));
        let dispatcher = ActionDispatcher::new(Box::new(sink.clone()), templates, settings);
        let reader = FieldReader::new(
            Box::new(ScriptedRecognizer::new(answers)),
            settings.regions.clone(),
        );
        let engine = TurnEngine::new(reader, Box::new(policy), memory, settings.battle.clone());
        Harness {
            engine,
            dispatcher,
            sink,
            frames: still(),
        }
    }

    fn known_moves() -> BattleMemory {
        let mut moves = MoveMemory::in_memory();
        moves
            .record(
                "pikachu",
                &["Thunder Shock".into(), "Growl".into(), "".into(), "".into()],
            )
            .unwrap();
        BattleMemory::new(moves)
    }

    #[test]
    fn test_empty_opponent_aborts_turn() {
        let answers = [(PLAYER, "Pikachu"), (MOVE_1, "Thunderbolt")];
        let mut h = harness(&settings(), &answers, FixedPolicy::default(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::NoOpponent);
        assert!(h.sink.actions.borrow().is_empty());
        assert_eq!(
            h.engine.memory().moves.moves_for("pikachu"),
            &["Thunder Shock", "Growl", "", ""]
        );
        assert_eq!(h.engine.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_attack_records_moves() {
        let answers = [
            (ENEMY, "Rattata♂ Lv5"),
            (PLAYER, "Pikachu"),
            (MOVE_1, "Thunderbolt"),
            (MOVE_2, "Quick Attack"),
        ];
        let policy = FixedPolicy {
            attack_slot: 1,
            ..Default::default()
        };
        let mut h = harness(&settings(), &answers, policy.clone(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Attack(1)));
        assert_eq!(h.sink.visible(), vec![InputAction::Click { x: 161, y: 415 }]);
        assert_eq!(
            h.engine.memory().moves.moves_for("pikachu"),
            &["Thunderbolt", "Quick Attack", "", ""]
        );
        assert_eq!(h.engine.tracker().current_enemy.as_deref(), Some("Rattata"));
        assert_eq!(h.engine.tracker().turn_count, 1);
        assert_eq!(policy.asked.borrow()[0], "flee Pikachu Rattata");
    }

    #[test]
    fn test_all_moves_unreadable_keeps_memory() {
        let answers = [(ENEMY, "Rattata"), (PLAYER, "Pikachu")];
        let mut h = harness(&settings(), &answers, FixedPolicy::default(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Attack(0)));
        assert_eq!(
            h.engine.memory().moves.moves_for("pikachu"),
            &["Thunder Shock", "Growl", "", ""]
        );
    }

    #[test]
    fn test_cooldown_allows_one_action() {
        let answers = [(ENEMY, "Rattata"), (PLAYER, "Pikachu")];
        let mut h = harness(&settings(), &answers, FixedPolicy::default(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Attack(0)));
        assert_eq!(h.turn(), TurnOutcome::CoolingDown);
        assert_eq!(h.sink.visible().len(), 1);
    }

    #[test]
    fn test_flee_takes_priority() {
        let answers = [(ENEMY, "Geodude"), (PLAYER, "Pikachu")];
        let policy = FixedPolicy {
            flee: true,
            switch_to: Some(2),
            attack_slot: 1,
            ..Default::default()
        };
        let mut h = harness(&settings(), &answers, policy, known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Flee));
        assert_eq!(h.sink.visible(), vec![InputAction::Click { x: 550, y: 420 }]);
    }

    #[test]
    fn test_switch_refreshes_roster() {
        let answers = [
            (ENEMY, "Onix"),
            (PLAYER, "Pikachu"),
            (MENU, "Pikachu Lv12\nPidgey Lv9\nSquirtle Lv10\n"),
        ];
        let policy = FixedPolicy {
            switch_to: Some(2),
            ..Default::default()
        };
        let mut h = harness(&settings(), &answers, policy, known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Switch(2)));
        assert_eq!(
            h.sink.visible(),
            vec![
                InputAction::Click { x: 550, y: 360 },
                InputAction::Click { x: 275, y: 175 },
            ]
        );
        assert_eq!(h.frames.captures, 1);
        assert_eq!(
            h.engine.memory().roster.names(),
            &["pikachu", "pidgey", "squirtle"]
        );
    }

    #[test]
    fn test_strategy_switches_with_configured_team() {
        let mut settings = settings();
        settings.strategy.switch_on = [("Onix".to_string(), "Squirtle".to_string())].into();
        settings.strategy.team = vec!["Pikachu".into(), "Pidgey".into(), "Squirtle".into()];
        let answers = [
            (ENEMY, "Onix"),
            (PLAYER, "Pikachu"),
            (MENU, "Pikachu\nPidgey\nSquirtle\n"),
        ];
        let memory = BattleMemory::with_team(MoveMemory::in_memory(), &settings.strategy.team);
        let strategy = BattleStrategy::new(&settings.strategy);
        let mut h = harness(&settings, &answers, strategy, memory);

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Switch(2)));
        assert_eq!(
            h.sink.visible().last(),
            Some(&InputAction::Click { x: 275, y: 175 })
        );
    }

    #[test]
    fn test_own_name_falls_back_to_roster() {
        let answers = [(ENEMY, "Rattata"), (MOVE_1, "Ember")];
        let policy = FixedPolicy::default();
        let mut memory = known_moves();
        memory.roster.update(&["Charmander".into(), "Pidgey".into()]);
        let mut h = harness(&settings(), &answers, policy.clone(), memory);

        h.turn();
        assert_eq!(policy.asked.borrow()[0], "flee charmander Rattata");
        assert_eq!(h.engine.memory().moves.moves_for("charmander")[0], "Ember");
    }

    #[test]
    fn test_unknown_own_name_skips_memory() {
        let answers = [(ENEMY, "Rattata"), (MOVE_1, "Ember")];
        let mut h = harness(&settings(), &answers, FixedPolicy::default(), known_moves());

        h.turn();
        assert_eq!(h.engine.memory().moves.len(), 1);
    }

    #[test]
    fn test_missing_region_is_not_dispatched() {
        let mut settings = settings();
        settings.regions.moves[1] = None;
        let answers = [(ENEMY, "Rattata"), (PLAYER, "Pikachu")];
        let policy = FixedPolicy {
            attack_slot: 1,
            ..Default::default()
        };
        let mut h = harness(&settings, &answers, policy, known_moves());

        assert_eq!(h.turn(), TurnOutcome::NotDispatched(BattleDecision::Attack(1)));
        assert!(h.sink.actions.borrow().is_empty());
        assert_eq!(h.engine.tracker().turn_count, 0);
    }

    #[test]
    fn test_fight_menu_pre_step() {
        let mut settings = settings();
        settings.battle.open_fight_menu = true;
        let answers = [(ENEMY, "Rattata"), (PLAYER, "Pikachu")];
        let mut h = harness(&settings, &answers, FixedPolicy::default(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::Acted(BattleDecision::Attack(0)));
        let actions = h.sink.actions.borrow();
        assert!(matches!(actions[0], InputAction::Click { .. }));
        assert_eq!(actions[1], InputAction::Wait { duration_ms: 1200 });
        assert_eq!(actions[2], InputAction::Click { x: 60, y: 415 });
        assert_eq!(h.frames.captures, 1);
    }

    #[test]
    fn test_fight_menu_untouched_without_opponent() {
        let mut settings = settings();
        settings.battle.open_fight_menu = true;
        let answers = [(PLAYER, "Pikachu")];
        let mut h = harness(&settings, &answers, FixedPolicy::default(), known_moves());

        assert_eq!(h.turn(), TurnOutcome::NoOpponent);
        assert_eq!(h.turn(), TurnOutcome::NoOpponent);
        assert!(h.sink.actions.borrow().is_empty());
        assert_eq!(h.frames.captures, 0);
    }

    #[test]
    fn test_reset_battle_state() {
        let answers = [(ENEMY, "Rattata"), (PLAYER, "Pikachu")];
        let mut h = harness(&settings(), &answers, FixedPolicy::default(), known_moves());

        h.turn();
        h.engine.reset_battle_state();
        assert_eq!(h.engine.tracker().current_enemy, None);
        assert_eq!(h.engine.tracker().turn_count, 0);
        assert_eq!(h.engine.memory().moves.len(), 1);
    }
}
