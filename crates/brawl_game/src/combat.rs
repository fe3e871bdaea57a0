//! Jab timing, hit boxes and hit resolution.

use glam::Vec2;
use serde::Serialize;

use crate::collision::Aabb;
use crate::fighter::{Fighter, Spark};
use crate::tuning::{CombatTuning, HitProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttackPhase {
    Idle,
    Startup,
    Active,
    Recovery,
}

/// Phase derived from the remaining attack countdown.
pub fn attack_phase(fighter: &Fighter, combat: &CombatTuning) -> AttackPhase {
    let t = fighter.attack_t;
    if t <= 0.0 {
        AttackPhase::Idle
    } else if t <= combat.recovery {
        AttackPhase::Recovery
    } else if t <= combat.active + combat.recovery {
        AttackPhase::Active
    } else {
        AttackPhase::Startup
    }
}

/// Arms a jab unless one is already running or the fighter is stunned.
pub fn start_attack(fighter: &mut Fighter, combat: &CombatTuning) -> bool {
    if fighter.attack_t > 0.0 || fighter.in_hitstun() {
        return false;
    }
    fighter.attack_t = combat.attack_total();
    true
}

fn count_down(timer: &mut f32, dt: f32) {
    if *timer > 0.0 {
        *timer = (*timer - dt).max(0.0);
    }
}

pub fn tick_timers(fighter: &mut Fighter, dt: f32) {
    count_down(&mut fighter.attack_t, dt);
    count_down(&mut fighter.hitstun_t, dt);
    count_down(&mut fighter.invuln_t, dt);
    if let Some(spark) = fighter.spark.as_mut() {
        spark.t -= dt;
        if spark.t <= 0.0 {
            fighter.spark = None;
        }
    }
}

pub fn hurtbox(fighter: &Fighter) -> Aabb {
    Aabb::from_center_size(
        Vec2::new(fighter.pos.x, fighter.pos.y - fighter.size.y * 0.5),
        fighter.size,
    )
}

/// The jab's hitbox; only present during the active window.
pub fn hitbox(fighter: &Fighter, combat: &CombatTuning) -> Option<Aabb> {
    if attack_phase(fighter, combat) != AttackPhase::Active {
        return None;
    }
    let center = Vec2::new(
        fighter.pos.x + fighter.facing.sign() * (fighter.size.x * 0.5 + combat.hitbox_reach),
        fighter.pos.y - fighter.size.y * combat.hitbox_height,
    );
    Some(Aabb::from_center_size(
        center,
        Vec2::new(combat.hitbox_w, combat.hitbox_h),
    ))
}

/// Boxes for both fighters as they stood when hits were resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitboxFrame {
    pub p1_attack: Option<Aabb>,
    pub p2_attack: Option<Aabb>,
    pub p1_hurt: Aabb,
    pub p2_hurt: Aabb,
}

impl HitboxFrame {
    pub fn capture(p1: &Fighter, p2: &Fighter, combat: &CombatTuning) -> Self {
        Self {
            p1_attack: hitbox(p1, combat),
            p2_attack: hitbox(p2, combat),
            p1_hurt: hurtbox(p1),
            p2_hurt: hurtbox(p2),
        }
    }
}

/// Which sides connected this step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exchange {
    pub p1_landed: bool,
    pub p2_landed: bool,
}

fn apply_hit(
    attacker: &mut Fighter,
    defender: &mut Fighter,
    attack: &Aabb,
    hurt: &Aabb,
    profile: &HitProfile,
    spark_duration: f32,
) -> bool {
    if !attack.overlaps(hurt) || defender.invuln_t > 0.0 {
        return false;
    }
    defender.hp = defender.hp.saturating_sub(profile.damage);
    defender.vel = Vec2::new(
        profile.knockback_x * attacker.facing.sign(),
        profile.knockback_y,
    );
    defender.hitstun_t = profile.hitstun;
    defender.invuln_t = profile.invuln;
    attacker.spark = Some(Spark {
        pos: attack.midpoint(hurt),
        t: spark_duration,
    });
    true
}

/// Resolves both jabs against boxes captured before either hit applies, so a
/// trade lands for both sides in the same step.
pub fn resolve_hits(
    p1: &mut Fighter,
    p2: &mut Fighter,
    combat: &CombatTuning,
) -> (HitboxFrame, Exchange) {
    let frame = HitboxFrame::capture(p1, p2, combat);
    let mut exchange = Exchange::default();

    if let Some(attack) = frame.p1_attack {
        exchange.p1_landed = apply_hit(
            p1,
            p2,
            &attack,
            &frame.p2_hurt,
            &combat.player,
            combat.spark_duration,
        );
    }
    if let Some(attack) = frame.p2_attack {
        exchange.p2_landed = apply_hit(
            p2,
            p1,
            &attack,
            &frame.p1_hurt,
            &combat.npc,
            combat.spark_duration,
        );
    }
    (frame, exchange)
}
