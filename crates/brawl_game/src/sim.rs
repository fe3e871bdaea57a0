//! One match worth of simulation state, advanced one fixed step at a time.
//!
//! [`MatchSim`] owns everything about a match that is not a fighter record:
//! the countdown, the simulation clock that drives coyote / buffer windows,
//! who pilots each side, and the boxes from the latest hit check. Fighters
//! live in the entity store; the scene copies them out, calls
//! [`MatchSim::step`], and writes them back.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ai::AiBrain;
use crate::combat::{self, HitboxFrame};
use crate::config::{ControlMethod, MatchConfig};
use crate::fighter::{Facing, Fighter, FighterIntent, P1_COLOR, P2_COLOR};
use crate::tuning::Tuning;

/// Distance of each spawn point from its side of the arena.
const SPAWN_INSET: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Slot {
    P1,
    P2,
}

/// Who drives a fighter.
#[derive(Debug, Clone)]
pub enum Pilot {
    /// Full movement pipeline fed by the frame's intent.
    Human,
    Cpu(AiBrain),
    /// Full movement pipeline with no input; a training dummy.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundStatus {
    InProgress,
    KnockOut { winner: Option<Slot> },
    TimeUp { winner: Option<Slot> },
}

/// What the host UI shows outside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub timer: f32,
    pub p1_hp: u32,
    pub p2_hp: u32,
    pub status: RoundStatus,
}

pub type HudCallback = Box<dyn FnMut(&HudSnapshot)>;

pub struct MatchSim {
    tuning: Tuning,
    config: MatchConfig,
    timer: f32,
    clock: f64,
    steps: u64,
    p1: Pilot,
    p2: Pilot,
    status: RoundStatus,
    hitboxes: Option<HitboxFrame>,
    on_hud: Option<HudCallback>,
}

impl MatchSim {
    /// P2 is always the CPU; P1 is human unless the match is set to AI
    /// control, in which case it gets its own brain on a derived seed.
    pub fn new(config: MatchConfig, tuning: Tuning, ai_seed: u64) -> Self {
        let p1 = match config.control {
            ControlMethod::Ai => Pilot::Cpu(AiBrain::new(
                config.difficulty,
                ai_seed.wrapping_add(1),
            )),
            ControlMethod::Keyboard | ControlMethod::Gamepad => Pilot::Human,
        };
        let p2 = Pilot::Cpu(AiBrain::new(config.difficulty, ai_seed));
        Self::with_pilots(config, tuning, p1, p2)
    }

    /// Human P1 against a dummy that never acts on its own.
    pub fn training(config: MatchConfig, tuning: Tuning) -> Self {
        Self::with_pilots(config, tuning, Pilot::Human, Pilot::Idle)
    }

    pub fn with_pilots(config: MatchConfig, tuning: Tuning, p1: Pilot, p2: Pilot) -> Self {
        Self {
            timer: config.time_limit.max(0.0),
            tuning,
            config,
            clock: 0.0,
            steps: 0,
            p1,
            p2,
            status: RoundStatus::InProgress,
            hitboxes: None,
            on_hud: None,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Simulation seconds elapsed; the time base for coyote and buffer windows.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn floor(&self) -> f32 {
        self.tuning.arena.floor()
    }

    /// Resizes the playfield to the host canvas. Walls and floor both follow,
    /// the floor keeping its offset from the bottom edge.
    pub fn fit_arena(&mut self, width: f32, height: f32) {
        self.tuning.arena.width = width;
        self.tuning.arena.height = height;
    }

    pub fn pilot(&self, slot: Slot) -> &Pilot {
        match slot {
            Slot::P1 => &self.p1,
            Slot::P2 => &self.p2,
        }
    }

    /// Boxes captured by the latest hit check, for debug outlines.
    pub fn hitboxes(&self) -> Option<&HitboxFrame> {
        self.hitboxes.as_ref()
    }

    pub fn set_hud_callback(&mut self, callback: impl FnMut(&HudSnapshot) + 'static) {
        self.on_hud = Some(Box::new(callback));
    }

    /// Both fighters at rest on the floor, facing each other.
    pub fn spawn_fighters(&self) -> (Fighter, Fighter) {
        let physics = &self.tuning.physics;
        let width = self.tuning.arena.width;
        (
            Fighter::new(SPAWN_INSET, self.floor(), Facing::Right, P1_COLOR, physics),
            Fighter::new(width - SPAWN_INSET, self.floor(), Facing::Left, P2_COLOR, physics),
        )
    }

    pub fn hud(&self, p1: &Fighter, p2: &Fighter) -> HudSnapshot {
        HudSnapshot {
            timer: self.timer,
            p1_hp: p1.hp,
            p2_hp: p2.hp,
            status: self.status,
        }
    }

    /// Advances both fighters by `dt`. `intent` drives whichever side has a
    /// human pilot. A non-positive `dt` (paused) leaves everything untouched.
    pub fn step(
        &mut self,
        p1: &mut Fighter,
        p2: &mut Fighter,
        intent: &FighterIntent,
        dt: f32,
    ) -> HudSnapshot {
        if dt > 0.0 {
            self.advance(p1, p2, intent, dt);
        }
        self.emit_hud(p1, p2)
    }

    /// Builds the HUD snapshot and hands it to the host callback, if any.
    pub fn emit_hud(&mut self, p1: &Fighter, p2: &Fighter) -> HudSnapshot {
        let hud = self.hud(p1, p2);
        if let Some(callback) = self.on_hud.as_mut() {
            callback(&hud);
        }
        hud
    }

    fn advance(&mut self, p1: &mut Fighter, p2: &mut Fighter, intent: &FighterIntent, dt: f32) {
        self.clock += f64::from(dt);
        self.steps += 1;
        self.timer = (self.timer - dt).max(0.0);

        let step = StepContext {
            tuning: &self.tuning,
            floor: self.floor(),
            now: self.clock,
            dt,
        };
        drive(&mut self.p1, p1, p2, intent, &step);
        drive(&mut self.p2, p2, p1, intent, &step);

        let (frame, exchange) = combat::resolve_hits(p1, p2, &self.tuning.combat);
        if exchange.p1_landed || exchange.p2_landed {
            log::debug!(
                "Hit exchange at t={:.3}: p1_landed={} p2_landed={} hp={}/{}",
                self.clock,
                exchange.p1_landed,
                exchange.p2_landed,
                p1.hp,
                p2.hp
            );
        }
        self.hitboxes = Some(frame);
        self.update_status(p1, p2);
    }

    fn update_status(&mut self, p1: &Fighter, p2: &Fighter) {
        if self.status != RoundStatus::InProgress {
            return;
        }
        let leader = match p1.hp.cmp(&p2.hp) {
            std::cmp::Ordering::Greater => Some(Slot::P1),
            std::cmp::Ordering::Less => Some(Slot::P2),
            std::cmp::Ordering::Equal => None,
        };
        self.status = if p1.is_ko() || p2.is_ko() {
            RoundStatus::KnockOut { winner: leader }
        } else if self.timer <= 0.0 {
            RoundStatus::TimeUp { winner: leader }
        } else {
            return;
        };
        log::info!(
            "Round over after {} steps: {:?} (hp {}/{})",
            self.steps,
            self.status,
            p1.hp,
            p2.hp
        );
    }
}

struct StepContext<'a> {
    tuning: &'a Tuning,
    floor: f32,
    now: f64,
    dt: f32,
}

fn drive(
    pilot: &mut Pilot,
    me: &mut Fighter,
    opponent: &Fighter,
    intent: &FighterIntent,
    step: &StepContext<'_>,
) {
    match pilot {
        Pilot::Human => movement_pipeline(me, opponent, intent, step),
        Pilot::Idle => movement_pipeline(me, opponent, &FighterIntent::default(), step),
        Pilot::Cpu(brain) => {
            brain.think(me, opponent, step.dt, step.tuning);
            let physics = &step.tuning.physics;
            combat::tick_timers(me, step.dt);
            me.integrate(step.dt, physics);
            me.land(step.floor, step.now, physics);
            me.clamp_to_arena(step.tuning.arena.width, physics);
            me.face(opponent.pos.x);
        }
    }
}

fn movement_pipeline(
    me: &mut Fighter,
    opponent: &Fighter,
    intent: &FighterIntent,
    step: &StepContext<'_>,
) {
    let physics = &step.tuning.physics;
    let width = step.tuning.arena.width;

    me.update_dash(intent, step.dt, physics);
    if intent.attack_pressed {
        combat::start_attack(me, &step.tuning.combat);
    }
    combat::tick_timers(me, step.dt);
    me.run(intent, step.dt, physics);
    me.jump(intent, step.now, physics);
    me.integrate(step.dt, physics);
    me.wall(intent, width, physics);
    me.land(step.floor, step.now, physics);
    me.clamp_to_arena(width, physics);
    me.face(opponent.pos.x);
}

/// Hex SHA-256 of the serialised fighter pair.
pub fn digest(p1: &Fighter, p2: &Fighter) -> String {
    let bytes = serde_json::to_vec(&(p1, p2)).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 120.0;

    fn training() -> (MatchSim, Fighter, Fighter) {
        let sim = MatchSim::training(MatchConfig::default(), Tuning::default());
        let (p1, p2) = sim.spawn_fighters();
        (sim, p1, p2)
    }

    fn idle() -> FighterIntent {
        FighterIntent::default()
    }

    #[test]
    fn spawn_matches_arena_layout() {
        let (sim, p1, p2) = training();
        assert_eq!(sim.floor(), 360.0);
        assert_eq!((p1.pos.x, p1.pos.y), (200.0, 360.0));
        assert_eq!((p2.pos.x, p2.pos.y), (760.0, 360.0));
        assert_eq!(p1.facing, Facing::Right);
        assert_eq!(p2.facing, Facing::Left);
    }

    #[test]
    fn one_second_of_idle_steps_does_not_drift() {
        let (mut sim, mut p1, mut p2) = training();
        let mut hud = sim.hud(&p1, &p2);
        for _ in 0..120 {
            hud = sim.step(&mut p1, &mut p2, &idle(), DT);
        }
        assert!(p1.grounded && p2.grounded);
        assert_eq!(p1.pos.x, 200.0);
        assert_eq!(p2.pos.x, 760.0);
        assert_eq!(p1.pos.y, 360.0);
        assert_eq!((hud.p1_hp, hud.p2_hp), (100, 100));
        assert!((hud.timer - 98.0).abs() < 1e-3, "timer was {}", hud.timer);
        assert!((sim.clock() - 1.0).abs() < 1e-6);
        assert_eq!(hud.status, RoundStatus::InProgress);
    }

    #[test]
    fn short_time_limit_clamps_at_zero() {
        let config = MatchConfig {
            time_limit: 0.5,
            ..MatchConfig::default()
        };
        let mut sim = MatchSim::training(config, Tuning::default());
        let (mut p1, mut p2) = sim.spawn_fighters();
        let mut hud = sim.hud(&p1, &p2);
        for _ in 0..120 {
            hud = sim.step(&mut p1, &mut p2, &idle(), DT);
        }
        assert_eq!(hud.timer, 0.0);
        assert_eq!(hud.status, RoundStatus::TimeUp { winner: None });
    }

    #[test]
    fn paused_steps_change_nothing() {
        let (mut sim, mut p1, mut p2) = training();
        let run_right = FighterIntent {
            right: true,
            jump_pressed: true,
            jump_held: true,
            ..FighterIntent::default()
        };
        for _ in 0..10 {
            sim.step(&mut p1, &mut p2, &run_right, DT);
        }
        p1.attack_t = 0.1;
        p1.hitstun_t = 0.05;
        let (before1, before2) = (p1, p2);
        let (timer, clock) = (sim.timer(), sim.clock());

        for _ in 0..50 {
            sim.step(&mut p1, &mut p2, &run_right, 0.0);
        }
        assert_eq!(p1, before1);
        assert_eq!(p2, before2);
        assert_eq!(sim.timer(), timer);
        assert_eq!(sim.clock(), clock);
    }

    #[test]
    fn jab_lands_on_training_dummy() {
        let (mut sim, mut p1, mut p2) = training();
        p1.pos.x = 400.0;
        p2.pos.x = 440.0;
        let jab = FighterIntent {
            attack_pressed: true,
            ..FighterIntent::default()
        };
        sim.step(&mut p1, &mut p2, &jab, DT);

        let mut steps = 1;
        while p2.hp == Fighter::MAX_HP {
            sim.step(&mut p1, &mut p2, &idle(), DT);
            steps += 1;
            assert!(steps < 40, "jab never connected");
        }

        assert_eq!(p2.hp, 92);
        assert_eq!(p2.hitstun_t, 0.25);
        assert_eq!(p2.invuln_t, 0.12);
        assert!(p1.spark.is_some_and(|spark| spark.t > 0.0));
        let boxes = sim.hitboxes().expect("hit check ran");
        assert!(boxes.p1_attack.is_some());
    }

    #[test]
    fn knockout_is_reported_once() {
        let (mut sim, mut p1, mut p2) = training();
        p1.pos.x = 400.0;
        p2.pos.x = 440.0;
        p2.hp = 8;
        let jab = FighterIntent {
            attack_pressed: true,
            ..FighterIntent::default()
        };
        sim.step(&mut p1, &mut p2, &jab, DT);
        for _ in 0..40 {
            sim.step(&mut p1, &mut p2, &idle(), DT);
        }
        assert_eq!(p2.hp, 0);
        assert_eq!(
            sim.status(),
            RoundStatus::KnockOut {
                winner: Some(Slot::P1)
            }
        );
    }

    #[test]
    fn hud_callback_fires_every_step() {
        let (mut sim, mut p1, mut p2) = training();
        let seen: Rc<RefCell<Vec<HudSnapshot>>> = Rc::default();
        let sink = Rc::clone(&seen);
        sim.set_hud_callback(move |hud| sink.borrow_mut().push(*hud));
        for _ in 0..3 {
            sim.step(&mut p1, &mut p2, &idle(), DT);
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].timer > seen[2].timer);
    }

    #[test]
    fn ai_control_puts_cpu_on_both_sides() {
        let config = MatchConfig {
            control: ControlMethod::Ai,
            difficulty: Difficulty::Hard,
            ..MatchConfig::default()
        };
        let sim = MatchSim::new(config, Tuning::default(), 7);
        assert!(matches!(sim.pilot(Slot::P1), Pilot::Cpu(_)));
        assert!(matches!(sim.pilot(Slot::P2), Pilot::Cpu(brain) if brain.difficulty() == Difficulty::Hard));

        let keyboard = MatchSim::new(MatchConfig::default(), Tuning::default(), 7);
        assert!(matches!(keyboard.pilot(Slot::P1), Pilot::Human));
    }

    #[test]
    fn cpu_closes_distance() {
        let mut sim = MatchSim::new(MatchConfig::default(), Tuning::default(), 11);
        let (mut p1, mut p2) = sim.spawn_fighters();
        for _ in 0..240 {
            sim.step(&mut p1, &mut p2, &idle(), DT);
        }
        assert!(p2.pos.x < 760.0);
    }

    #[test]
    fn digest_tracks_state() {
        let (_, p1, p2) = training();
        let a = digest(&p1, &p2);
        assert_eq!(a.len(), 64);
        assert_eq!(a, digest(&p1, &p2));
        let mut moved = p1;
        moved.pos.x += 1.0;
        assert_ne!(a, digest(&moved, &p2));
    }

    #[test]
    fn arena_narrower_than_wall_margins_still_steps() {
        let mut tuning = Tuning::default();
        tuning.arena.width = 60.0;
        let mut sim = MatchSim::training(MatchConfig::default(), tuning);
        let (mut p1, mut p2) = sim.spawn_fighters();
        sim.step(&mut p1, &mut p2, &idle(), DT);
        assert_eq!(p1.pos.x, 30.0);
        assert_eq!(p2.pos.x, 30.0);
    }

    #[test]
    fn fit_arena_moves_walls_and_floor() {
        let mut sim = MatchSim::training(MatchConfig::default(), Tuning::default());
        sim.fit_arena(640.0, 300.0);
        assert_eq!(sim.floor(), 240.0);
        let (mut p1, mut p2) = sim.spawn_fighters();
        assert_eq!((p2.pos.x, p2.pos.y), (440.0, 240.0));

        p1.pos.x = 900.0;
        sim.step(&mut p1, &mut p2, &idle(), DT);
        assert_eq!(p1.pos.x, 600.0);
    }
}
