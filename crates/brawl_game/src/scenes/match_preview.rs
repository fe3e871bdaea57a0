//! The fighting scene: two fighters, a countdown and the HUD.

use brawl_core::{
    Action, CreateOptions, Environment, Initialization, InputSnapshot, Scene, ScenePayload,
    SharedContext,
};
use brawl_render::Canvas;

use crate::config::{MatchMeta, MatchSetup};
use crate::entities::{self, GameEntity, NPC, PLAYER};
use crate::fighter::{Fighter, FighterIntent};
use crate::rendering;
use crate::scenes::pause_overlay::PAUSE_OVERLAY;
use crate::sim::{HudCallback, HudSnapshot, MatchSim};
use crate::tuning::Tuning;

pub const MATCH_PREVIEW: &str = "match-preview";

/// Everything the host hands over when pushing the preview.
pub struct MatchPreviewPayload {
    pub setup: MatchSetup,
    pub tuning: Tuning,
    /// P2 stands still instead of running the CPU brain.
    pub training: bool,
    pub show_hitboxes: bool,
    pub on_hud: Option<HudCallback>,
}

impl Default for MatchPreviewPayload {
    fn default() -> Self {
        Self {
            setup: MatchSetup::default(),
            tuning: Tuning::default(),
            training: false,
            show_hitboxes: true,
            on_hud: None,
        }
    }
}

impl MatchPreviewPayload {
    pub fn new(setup: MatchSetup, tuning: Tuning) -> Self {
        Self {
            setup,
            tuning,
            ..Self::default()
        }
    }

    pub fn training(mut self) -> Self {
        self.training = true;
        self
    }

    pub fn with_hud_callback(mut self, callback: impl FnMut(&HudSnapshot) + 'static) -> Self {
        self.on_hud = Some(Box::new(callback));
        self
    }
}

/// Keyboard and gamepad are already merged into the action set; jump also
/// answers to Up.
pub fn intent_from_input(input: &InputSnapshot) -> FighterIntent {
    FighterIntent {
        left: input.held(Action::Left),
        right: input.held(Action::Right),
        jump_pressed: input.pressed(Action::Jump) || input.pressed(Action::Up),
        jump_held: input.held(Action::Jump) || input.held(Action::Up),
        dash_pressed: input.pressed(Action::Dash),
        attack_pressed: input.pressed(Action::Attack),
    }
}

struct FighterIds {
    p1: String,
    p2: String,
}

pub struct MatchPreviewScene {
    meta: MatchMeta,
    sim: MatchSim,
    intent: FighterIntent,
    ids: Option<FighterIds>,
    hud: Option<HudSnapshot>,
    show_hitboxes: bool,
}

impl MatchPreviewScene {
    pub fn new(payload: MatchPreviewPayload) -> Self {
        let MatchPreviewPayload {
            setup,
            tuning,
            training,
            show_hitboxes,
            on_hud,
        } = payload;
        let mut sim = if training {
            MatchSim::training(setup.config, tuning)
        } else {
            MatchSim::new(setup.config, tuning, setup.ai_seed)
        };
        if let Some(callback) = on_hud {
            sim.set_hud_callback(callback);
        }
        Self {
            meta: setup.meta,
            sim,
            intent: FighterIntent::default(),
            ids: None,
            hud: None,
            show_hitboxes,
        }
    }

    pub fn sim(&self) -> &MatchSim {
        &self.sim
    }

    fn fighters(&self, shared: &SharedContext<GameEntity>) -> Option<(Fighter, Fighter)> {
        let ids = self.ids.as_ref()?;
        match (
            entities::fighter(&shared.entities, &ids.p1),
            entities::fighter(&shared.entities, &ids.p2),
        ) {
            (Ok(p1), Ok(p2)) => Some((p1, p2)),
            (Err(err), _) | (_, Err(err)) => {
                log::warn!("Match preview lost a fighter: {err}");
                None
            }
        }
    }

    fn spawn(&mut self, shared: &mut SharedContext<GameEntity>) -> Result<(), String> {
        self.sim.fit_arena(shared.width, shared.height);
        let floor = self.sim.floor();
        let (p1, p2) = self.sim.spawn_fighters();

        let p1_id = shared
            .entities
            .create(
                PLAYER,
                GameEntity::Fighter(p1),
                CreateOptions::default()
                    .with_tags(&["player", "controllable"])
                    .with_meta("slot", "p1")
                    .with_meta("name", self.meta.p1_name.as_str()),
            )
            .map_err(|e| format!("Failed to create P1: {e}"))?;
        let p2_id = match shared.entities.create(
            NPC,
            GameEntity::Fighter(p2),
            CreateOptions::default()
                .with_tags(&["npc", "opponent"])
                .with_meta("slot", "p2")
                .with_meta("name", self.meta.p2_name.as_str()),
        ) {
            Ok(id) => id,
            Err(e) => {
                shared.entities.remove(&p1_id);
                return Err(format!("Failed to create P2: {e}"));
            }
        };

        shared.environment = Environment {
            floor,
            stage: Some(self.meta.stage.clone()),
        };
        self.ids = Some(FighterIds {
            p1: p1_id,
            p2: p2_id,
        });
        self.hud = Some(self.sim.emit_hud(&p1, &p2));
        log::info!(
            "Match preview initialized: {} vs {} on '{}'",
            self.meta.p1_name,
            self.meta.p2_name,
            self.meta.stage
        );
        Ok(())
    }
}

impl Scene<GameEntity> for MatchPreviewScene {
    fn id(&self) -> &str {
        MATCH_PREVIEW
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "stage": self.meta.stage })
    }

    fn initialize(&mut self, shared: &mut SharedContext<GameEntity>) -> Initialization {
        match self.spawn(shared) {
            Ok(()) => Initialization::Ready,
            Err(err) => Initialization::Failed(err),
        }
    }

    fn on_exit(&mut self, shared: &mut SharedContext<GameEntity>) {
        if let Some(ids) = self.ids.take() {
            shared.entities.remove(&ids.p1);
            shared.entities.remove(&ids.p2);
        }
    }

    fn handle_input(&mut self, input: &InputSnapshot, shared: &mut SharedContext<GameEntity>) {
        self.intent = intent_from_input(input);
        if input.pressed(Action::Pause) {
            shared.push_scene(PAUSE_OVERLAY, ScenePayload::none());
            shared.set_paused(true);
        }
    }

    fn update(&mut self, dt: f32, _input: &InputSnapshot, shared: &mut SharedContext<GameEntity>) {
        let Some((mut p1, mut p2)) = self.fighters(shared) else {
            return;
        };
        self.hud = Some(self.sim.step(&mut p1, &mut p2, &self.intent, dt));

        let Some(ids) = self.ids.as_ref() else {
            return;
        };
        for (id, fighter) in [(&ids.p1, p1), (&ids.p2, p2)] {
            if let Err(err) = entities::put_fighter(&mut shared.entities, id, fighter) {
                log::warn!("Match preview failed to store fighter '{id}': {err}");
            }
        }
    }

    fn render(&self, canvas: &mut dyn Canvas, shared: &SharedContext<GameEntity>) {
        rendering::draw_background(canvas, self.sim.floor());
        let Some((p1, p2)) = self.fighters(shared) else {
            return;
        };

        rendering::draw_fighter(canvas, &p1);
        rendering::draw_fighter(canvas, &p2);
        let spark_life = self.sim.tuning().combat.spark_duration;
        for spark in [p1.spark, p2.spark].iter().flatten() {
            rendering::draw_spark(canvas, spark, spark_life);
        }
        if self.show_hitboxes {
            if let Some(frame) = self.sim.hitboxes() {
                rendering::draw_hitboxes(canvas, frame);
            }
        }

        let hud = self.hud.unwrap_or_else(|| self.sim.hud(&p1, &p2));
        rendering::draw_hud(
            canvas,
            &hud,
            (&self.meta.p1_name, p1.color),
            (&self.meta.p2_name, p2.color),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::scenes::new_scene_manager;
    use brawl_core::{Key, ManagerConfig, SceneManager};
    use brawl_render::DrawList;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME_MS: f64 = 20.0;

    struct Harness {
        manager: SceneManager<GameEntity>,
        now: f64,
    }

    impl Harness {
        fn start(payload: MatchPreviewPayload) -> Self {
            Self::start_on(ManagerConfig::default(), payload)
        }

        fn start_on(config: ManagerConfig, payload: MatchPreviewPayload) -> Self {
            let mut manager = new_scene_manager(config).expect("build manager");
            manager
                .start(MATCH_PREVIEW, ScenePayload::new(payload))
                .expect("start match preview");
            let mut harness = Self {
                manager,
                now: 1000.0,
            };
            // First frame measures zero.
            harness.frame();
            harness
        }

        fn frame(&mut self) {
            self.manager.frame(self.now, None);
            self.now += FRAME_MS;
        }

        fn tap(&mut self, key: Key) {
            self.manager.input_mut().key_down(key);
            self.manager.input_mut().key_up(key);
            self.frame();
        }

        fn fighters(&self) -> (Fighter, Fighter) {
            let p1 = self.manager.entities().find_by_tag("player")[0].state.clone();
            let p2 = self.manager.entities().find_by_tag("opponent")[0].state.clone();
            match (p1, p2) {
                (GameEntity::Fighter(p1), GameEntity::Fighter(p2)) => (p1, p2),
                other => panic!("unexpected entities {other:?}"),
            }
        }
    }

    fn training_payload() -> MatchPreviewPayload {
        MatchPreviewPayload::default().training()
    }

    #[test]
    fn initialize_spawns_tagged_fighters_and_sets_environment() {
        let mut harness = Harness::start(training_payload());
        let store = harness.manager.entities();
        assert_eq!(store.len(), 2);

        let p1 = &store.find_by_tag("controllable")[0];
        assert_eq!(p1.kind, PLAYER);
        assert!(p1.has_tag("character"));
        assert_eq!(p1.meta["slot"], "p1");
        let p2 = &store.find_by_tag("opponent")[0];
        assert_eq!(p2.kind, NPC);
        assert!(p2.has_tag("ai") && p2.has_tag("npc"));

        let env = harness.manager.debug_snapshot().environment;
        assert_eq!(env.floor, 360.0);
        assert_eq!(env.stage.as_deref(), Some("Dojo Dusk"));
    }

    #[test]
    fn hud_callback_sees_initial_and_stepped_values() {
        let seen: Rc<RefCell<Vec<HudSnapshot>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let payload =
            training_payload().with_hud_callback(move |hud| sink.borrow_mut().push(*hud));
        let mut harness = Harness::start(payload);
        for _ in 0..5 {
            harness.frame();
        }
        let seen = seen.borrow();
        assert_eq!(seen[0].timer, 99.0);
        assert!(seen.len() > 5);
        assert!(seen.last().expect("stepped").timer < 99.0);
    }

    #[test]
    fn walking_right_moves_player_one() {
        let mut harness = Harness::start(training_payload());
        harness.manager.input_mut().key_down(Key::D);
        for _ in 0..10 {
            harness.frame();
        }
        let (p1, p2) = harness.fighters();
        assert!(p1.pos.x > 200.0);
        assert_eq!(p2.pos.x, 760.0);
    }

    #[test]
    fn pause_key_freezes_match_until_resumed() {
        let mut harness = Harness::start(training_payload());
        harness.manager.input_mut().key_down(Key::D);
        harness.frame();
        harness.tap(Key::P);

        assert!(harness.manager.is_paused());
        assert_eq!(harness.manager.top_id(), Some(PAUSE_OVERLAY));
        let frozen = harness.fighters();
        for _ in 0..10 {
            harness.frame();
        }
        assert_eq!(harness.fighters(), frozen);

        harness.tap(Key::P);
        assert!(!harness.manager.is_paused());
        assert_eq!(harness.manager.top_id(), Some(MATCH_PREVIEW));
        for _ in 0..3 {
            harness.frame();
        }
        assert!(harness.fighters().0.pos.x > frozen.0.pos.x);
    }

    #[test]
    fn arena_follows_the_host_canvas() {
        let config = ManagerConfig {
            width: 640.0,
            height: 300.0,
            ..ManagerConfig::default()
        };
        let mut harness = Harness::start_on(config, training_payload());
        let (_, p2) = harness.fighters();
        assert_eq!((p2.pos.x, p2.pos.y), (440.0, 240.0));
        assert_eq!(harness.manager.debug_snapshot().environment.floor, 240.0);

        harness.manager.input_mut().key_down(Key::D);
        for _ in 0..200 {
            harness.frame();
        }
        let (p1, _) = harness.fighters();
        assert!(p1.pos.x <= 600.0, "P1 stopped at x={}", p1.pos.x);
        assert!(p1.pos.x > 400.0);
    }

    #[test]
    fn exit_removes_fighters() {
        let mut harness = Harness::start(training_payload());
        assert_eq!(harness.manager.pop().as_deref(), Some(MATCH_PREVIEW));
        assert!(harness.manager.entities().is_empty());
    }

    #[test]
    fn render_draws_world_then_hud() {
        let payload = MatchPreviewPayload::new(
            MatchSetup {
                config: MatchConfig {
                    time_limit: 45.0,
                    ..MatchConfig::default()
                },
                ..MatchSetup::default()
            },
            Tuning::default(),
        );
        let harness = Harness::start(payload);
        let mut list = DrawList::new(960.0, 420.0);
        harness.manager.render(&mut list);
        assert_eq!(
            list.texts().collect::<Vec<_>>(),
            vec!["Rhea 100 HP", "Kato 100 HP", "45"]
        );
    }

    #[test]
    fn intent_merges_up_into_jump() {
        let mut input = brawl_core::InputController::new();
        input.attach();
        input.key_down(Key::W);
        let intent = intent_from_input(&input.snapshot());
        assert!(intent.jump_pressed && intent.jump_held);
        assert!(!intent.left && !intent.attack_pressed);
    }
}
