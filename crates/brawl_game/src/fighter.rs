//! Fighter record and its per-step kinematics.
//!
//! Positions are canvas pixels with +y down; `pos` is the centre of the feet.
//! Each method here is one stage of the fixed-step pipeline. The order they
//! run in lives in [`crate::sim`], since later stages read what earlier ones
//! wrote. Times passed as `now` come from the simulation clock, never from
//! the wall clock, so a replay produces identical coyote / buffer decisions.

use brawl_render::Color;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::PhysicsTuning;

pub const BODY_SIZE: Vec2 = Vec2::new(40.0, 80.0);
pub const P1_COLOR: Color = Color::hex(0xa5b4fc);
pub const P2_COLOR: Color = Color::hex(0xfca5a5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Direction from `from_x` toward `to_x`; equal positions face left.
    pub fn toward(from_x: f32, to_x: f32) -> Facing {
        if to_x > from_x {
            Facing::Right
        } else {
            Facing::Left
        }
    }
}

/// Hit flash owned by the attacker that landed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub pos: Vec2,
    /// Seconds left before the spark disappears.
    pub t: f32,
}

/// One fixed step worth of control for a single fighter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterIntent {
    pub left: bool,
    pub right: bool,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub dash_pressed: bool,
    pub attack_pressed: bool,
}

impl FighterIntent {
    /// -1, 0 or +1. Holding both directions cancels out.
    pub fn desired(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub size: Vec2,
    pub color: Color,
    pub hp: u32,

    pub grounded: bool,
    /// Simulation time of the latest grounded step.
    pub last_grounded: f64,
    pub jumps_left: u8,
    pub jump_buffered_at: Option<f64>,

    pub dashing: bool,
    pub dash_t: f32,
    pub dash_cd: f32,
    pub attack_t: f32,
    pub hitstun_t: f32,
    pub invuln_t: f32,

    pub wall_slide: bool,
    /// Points away from the wall being slid on.
    pub wall_normal: Option<Facing>,

    pub spark: Option<Spark>,
}

impl Fighter {
    pub const MAX_HP: u32 = 100;

    /// Standing at rest on `floor`.
    pub fn new(x: f32, floor: f32, facing: Facing, color: Color, physics: &PhysicsTuning) -> Self {
        Self {
            pos: Vec2::new(x, floor),
            vel: Vec2::ZERO,
            facing,
            size: BODY_SIZE,
            color,
            hp: Self::MAX_HP,
            grounded: true,
            last_grounded: 0.0,
            jumps_left: physics.max_jumps,
            jump_buffered_at: None,
            dashing: false,
            dash_t: 0.0,
            dash_cd: 0.0,
            attack_t: 0.0,
            hitstun_t: 0.0,
            invuln_t: 0.0,
            wall_slide: false,
            wall_normal: None,
            spark: None,
        }
    }

    pub fn in_hitstun(&self) -> bool {
        self.hitstun_t > 0.0
    }

    pub fn is_ko(&self) -> bool {
        self.hp == 0
    }

    /// Dash bookkeeping plus dash start. Returns true when a dash began.
    pub fn update_dash(&mut self, intent: &FighterIntent, dt: f32, physics: &PhysicsTuning) -> bool {
        if self.dash_cd > 0.0 {
            self.dash_cd = (self.dash_cd - dt).max(0.0);
        }
        if self.dashing {
            self.dash_t = (self.dash_t - dt).max(0.0);
            if self.dash_t <= 0.0 {
                self.dashing = false;
            }
        }

        if !intent.dash_pressed || self.dash_cd > 0.0 || self.dashing || self.in_hitstun() {
            return false;
        }
        let dir = if intent.right {
            1.0
        } else if intent.left {
            -1.0
        } else {
            self.facing.sign()
        };
        self.dashing = true;
        self.dash_t = physics.dash_time;
        self.dash_cd = physics.dash_cooldown;
        self.vel = Vec2::new(dir * physics.dash_speed, 0.0);
        self.wall_slide = false;
        self.wall_normal = None;
        true
    }

    /// Horizontal run acceleration and ground friction.
    pub fn run(&mut self, intent: &FighterIntent, dt: f32, physics: &PhysicsTuning) {
        if self.dashing || self.in_hitstun() {
            return;
        }
        let accel = if self.grounded {
            physics.ground_accel
        } else {
            physics.air_accel
        };
        let desired = intent.desired();
        self.vel.x = move_towards(self.vel.x, desired * physics.max_run, accel * dt);

        if desired == 0.0 && self.grounded {
            self.vel.x = move_towards(self.vel.x, 0.0, physics.ground_friction * dt);
        }
    }

    /// Ground jump (coyote + buffer), air jump, and short-hop release.
    /// Returns true when a jump was performed.
    pub fn jump(&mut self, intent: &FighterIntent, now: f64, physics: &PhysicsTuning) -> bool {
        if intent.jump_pressed {
            self.jump_buffered_at = Some(now);
        }

        let in_coyote = now - self.last_grounded <= f64::from(physics.coyote_time);
        let buffered = self
            .jump_buffered_at
            .is_some_and(|at| now - at <= f64::from(physics.jump_buffer));

        let ground_jump = in_coyote && buffered && self.jumps_left == physics.max_jumps;
        let air_jump =
            intent.jump_pressed && self.jumps_left > 0 && !self.grounded && !self.wall_slide;

        let jumped = ground_jump || air_jump;
        if jumped {
            self.vel.y = -physics.jump_vel;
            self.grounded = false;
            self.jump_buffered_at = None;
            self.jumps_left = self.jumps_left.saturating_sub(1);
        }

        if !intent.jump_held && self.vel.y < -physics.min_jump_release {
            self.vel.y = -physics.min_jump_release;
        }
        jumped
    }

    /// Semi-implicit Euler: gravity into velocity, then velocity into position.
    pub fn integrate(&mut self, dt: f32, physics: &PhysicsTuning) {
        self.vel.y += physics.gravity * dt;
        self.pos += self.vel * dt;
    }

    /// Wall slide and wall jump against either arena edge. Returns true when
    /// a wall jump was performed; it overrides any jump resolved earlier in
    /// the same step.
    pub fn wall(&mut self, intent: &FighterIntent, arena_width: f32, physics: &PhysicsTuning) -> bool {
        self.wall_slide = false;
        self.wall_normal = None;
        if self.grounded || self.dashing {
            return false;
        }

        let near_left = self.pos.x <= physics.wall_margin;
        let near_right = self.pos.x >= arena_width - physics.wall_margin;
        let normal = if near_left && intent.left {
            Facing::Right
        } else if near_right && intent.right {
            Facing::Left
        } else {
            return false;
        };

        self.wall_slide = true;
        self.wall_normal = Some(normal);
        self.vel.y = self.vel.y.min(physics.wall_slide_max);

        if !intent.jump_pressed {
            return false;
        }
        self.vel = Vec2::new(
            physics.wall_jump_vx * normal.sign(),
            -physics.wall_jump_vy,
        );
        self.facing = normal;
        self.wall_slide = false;
        self.wall_normal = None;
        self.jumps_left = physics.max_jumps.saturating_sub(1);
        self.jump_buffered_at = None;
        true
    }

    /// Floor contact. Every grounded step refreshes `last_grounded`, so the
    /// coyote window always measures from the last step spent on the floor.
    /// Returns true on the step the fighter lands.
    pub fn land(&mut self, floor: f32, now: f64, physics: &PhysicsTuning) -> bool {
        if self.pos.y < floor {
            self.grounded = false;
            return false;
        }
        let landed = !self.grounded;
        self.pos.y = floor;
        self.vel.y = 0.0;
        self.grounded = true;
        self.jumps_left = physics.max_jumps;
        self.last_grounded = now;
        landed
    }

    /// Keeps the body between the wall margins. An arena too narrow for both
    /// margins pins the fighter to its centre line.
    pub fn clamp_to_arena(&mut self, arena_width: f32, physics: &PhysicsTuning) {
        let min_x = physics.wall_margin;
        let max_x = arena_width - physics.wall_margin;
        self.pos.x = if min_x <= max_x {
            self.pos.x.clamp(min_x, max_x)
        } else {
            arena_width * 0.5
        };
    }

    /// Turns toward the opponent unless stunned.
    pub fn face(&mut self, opponent_x: f32) {
        if !self.in_hitstun() {
            self.facing = Facing::toward(self.pos.x, opponent_x);
        }
    }
}

/// Moves `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}
