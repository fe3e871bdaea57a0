//! Gameplay constants, loadable from JSON.
//!
//! Every field has a default matching the shipped feel, so a tuning file only
//! needs the values it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub max_run: f32,
    pub air_accel: f32,
    pub ground_accel: f32,
    pub ground_friction: f32,
    pub jump_vel: f32,
    /// Upward speed a released jump is clamped to (short hop).
    pub min_jump_release: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub dash_speed: f32,
    pub dash_time: f32,
    pub dash_cooldown: f32,
    pub max_jumps: u8,
    pub wall_slide_max: f32,
    pub wall_jump_vx: f32,
    pub wall_jump_vy: f32,
    /// Distance from either arena edge that counts as touching the wall.
    pub wall_margin: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 2600.0,
            max_run: 380.0,
            air_accel: 2200.0,
            ground_accel: 4200.0,
            ground_friction: 5200.0,
            jump_vel: 880.0,
            min_jump_release: 420.0,
            coyote_time: 0.12,
            jump_buffer: 0.12,
            dash_speed: 700.0,
            dash_time: 0.12,
            dash_cooldown: 0.35,
            max_jumps: 2,
            wall_slide_max: 180.0,
            wall_jump_vx: 520.0,
            wall_jump_vy: 900.0,
            wall_margin: 40.0,
        }
    }
}

/// What a landed jab does to the defender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitProfile {
    pub damage: u32,
    pub knockback_x: f32,
    pub knockback_y: f32,
    pub hitstun: f32,
    pub invuln: f32,
}

impl HitProfile {
    pub const PLAYER_JAB: HitProfile = HitProfile {
        damage: 8,
        knockback_x: 220.0,
        knockback_y: -180.0,
        hitstun: 0.25,
        invuln: 0.12,
    };

    pub const NPC_JAB: HitProfile = HitProfile {
        damage: 6,
        knockback_x: 200.0,
        knockback_y: -140.0,
        hitstun: 0.20,
        invuln: 0.10,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub startup: f32,
    pub active: f32,
    pub recovery: f32,
    pub spark_duration: f32,
    pub hitbox_w: f32,
    pub hitbox_h: f32,
    /// Gap between the body edge and the hitbox centre, along facing.
    pub hitbox_reach: f32,
    /// Hitbox centre height as a fraction of body height above the feet.
    pub hitbox_height: f32,
    pub player: HitProfile,
    pub npc: HitProfile,
}

impl CombatTuning {
    pub fn attack_total(&self) -> f32 {
        self.startup + self.active + self.recovery
    }
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            startup: 0.06,
            active: 0.06,
            recovery: 0.18,
            spark_duration: 0.12,
            hitbox_w: 32.0,
            hitbox_h: 22.0,
            hitbox_reach: 18.0,
            hitbox_height: 0.65,
            player: HitProfile::PLAYER_JAB,
            npc: HitProfile::NPC_JAB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub think_easy: f32,
    pub think_normal: f32,
    pub think_hard: f32,
    pub attack_chance: f32,
    pub jump_chance: f32,
    pub aggro_distance: f32,
    /// Chase speed as a fraction of `max_run`.
    pub chase_speed: f32,
    /// Hop strength as a fraction of `jump_vel`.
    pub hop_strength: f32,
    /// Horizontal jitter amplitude (px/s per second of step) when close.
    pub jitter: f32,
}

impl AiTuning {
    pub fn think_interval(&self, difficulty: Difficulty) -> f32 {
        match difficulty {
            Difficulty::Easy => self.think_easy,
            Difficulty::Normal => self.think_normal,
            Difficulty::Hard => self.think_hard,
        }
    }
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            think_easy: 0.60,
            think_normal: 0.40,
            think_hard: 0.25,
            attack_chance: 0.15,
            jump_chance: 0.25,
            aggro_distance: 180.0,
            chase_speed: 0.75,
            hop_strength: 0.9,
            jitter: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub floor_offset: f32,
}

impl Arena {
    pub fn floor(&self) -> f32 {
        self.height - self.floor_offset
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 420.0,
            floor_offset: 60.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub combat: CombatTuning,
    pub ai: AiTuning,
    pub arena: Arena,
}

pub fn load_tuning_from_path(path: &Path) -> Result<Tuning, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let tuning: Tuning = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse tuning JSON {}: {e}", path.display()))?;
    validate_tuning(&tuning)?;
    Ok(tuning)
}

pub fn validate_tuning(tuning: &Tuning) -> Result<(), String> {
    let p = &tuning.physics;
    let positive = [
        ("physics.gravity", p.gravity),
        ("physics.max_run", p.max_run),
        ("physics.air_accel", p.air_accel),
        ("physics.ground_accel", p.ground_accel),
        ("physics.jump_vel", p.jump_vel),
        ("physics.dash_speed", p.dash_speed),
        ("physics.dash_time", p.dash_time),
        ("combat.active", tuning.combat.active),
        ("combat.hitbox_w", tuning.combat.hitbox_w),
        ("combat.hitbox_h", tuning.combat.hitbox_h),
        ("ai.think_easy", tuning.ai.think_easy),
        ("ai.think_normal", tuning.ai.think_normal),
        ("ai.think_hard", tuning.ai.think_hard),
        ("arena.width", tuning.arena.width),
        ("arena.height", tuning.arena.height),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(format!("Tuning validation failed: {name} must be > 0 (got {value})"));
        }
    }

    let non_negative = [
        ("physics.ground_friction", p.ground_friction),
        ("physics.min_jump_release", p.min_jump_release),
        ("physics.coyote_time", p.coyote_time),
        ("physics.jump_buffer", p.jump_buffer),
        ("physics.dash_cooldown", p.dash_cooldown),
        ("physics.wall_slide_max", p.wall_slide_max),
        ("physics.wall_margin", p.wall_margin),
        ("combat.startup", tuning.combat.startup),
        ("combat.recovery", tuning.combat.recovery),
        ("combat.spark_duration", tuning.combat.spark_duration),
        ("arena.floor_offset", tuning.arena.floor_offset),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(format!("Tuning validation failed: {name} must be >= 0 (got {value})"));
        }
    }

    if p.max_jumps == 0 {
        return Err("Tuning validation failed: physics.max_jumps must be >= 1".to_string());
    }
    for (name, chance) in [
        ("ai.attack_chance", tuning.ai.attack_chance),
        ("ai.jump_chance", tuning.ai.jump_chance),
    ] {
        if !(0.0..=1.0).contains(&chance) {
            return Err(format!(
                "Tuning validation failed: {name} must be within 0..=1 (got {chance})"
            ));
        }
    }
    if tuning.arena.width <= p.wall_margin * 2.0 {
        return Err("Tuning validation failed: arena narrower than both wall margins".to_string());
    }
    if tuning.arena.floor_offset >= tuning.arena.height {
        return Err("Tuning validation failed: floor_offset must be < arena height".to_string());
    }
    Ok(())
}
