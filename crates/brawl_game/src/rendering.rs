//! Stateless draw functions for the match preview.
//!
//! Everything paints in canvas pixels; nothing here reads or writes match
//! state beyond what it is handed.

use brawl_render::{Canvas, Color, Rect, TextAlign, TextStyle};
use glam::Vec2;

use crate::combat::HitboxFrame;
use crate::fighter::{Facing, Fighter, Spark};
use crate::sim::HudSnapshot;

const SKY_TOP: Color = Color::hex(0x0f172a);
const SKY_BOTTOM: Color = Color::hex(0x1e293b);
const FLOOR_SHADOW: Color = Color::hex(0x0b1220);
const FLOOR_LINE: Color = Color::hex(0x111827);
const FIGHTER_SHADOW: Color = Color::rgba(0, 0, 0, 77);
const SPARK: Color = Color::hex(0xffe08a);

const P1_ATTACK: Color = Color::hex(0x22c55e);
const P2_ATTACK: Color = Color::hex(0xef4444);
const P1_HURT: Color = Color::hex(0x60a5fa);
const P2_HURT: Color = Color::hex(0xf472b6);

const BAR_BACK: Color = Color::hex(0x111827);
const BAR_WIDTH: f32 = 360.0;
const BAR_HEIGHT: f32 = 16.0;
const BAR_INSET: f32 = 20.0;

const OVERLAY_DIM: Color = Color::rgba(0, 0, 0, 102);
const OVERLAY_LABEL: Color = Color::hex(0xe0e7ff);
const OVERLAY_HINT: Color = Color::hex(0xcbd5f5);

pub fn draw_background(canvas: &mut dyn Canvas, floor: f32) {
    let size = canvas.size();
    canvas.fill_vertical_gradient(Rect::new(0.0, 0.0, size.x, size.y), SKY_TOP, SKY_BOTTOM);
    let shadow_top = floor + 40.0;
    if shadow_top < size.y {
        canvas.fill_rect(
            Rect::new(0.0, shadow_top, size.x, size.y - shadow_top),
            FLOOR_SHADOW,
        );
    }
    canvas.fill_rect(Rect::new(0.0, floor, size.x, 4.0), FLOOR_LINE);
}

pub fn draw_fighter(canvas: &mut dyn Canvas, fighter: &Fighter) {
    let Vec2 { x, y } = fighter.pos;
    let Vec2 { x: w, y: h } = fighter.size;

    canvas.fill_ellipse(Vec2::new(x, y + 40.0), Vec2::new(28.0, 8.0), FIGHTER_SHADOW);
    canvas.fill_round_rect(Rect::new(x - w * 0.5, y - h, w, h), 10.0, fighter.color);
    canvas.fill_circle(Vec2::new(x, y - h - 18.0), 16.0, fighter.color);

    let eye_x = match fighter.facing {
        Facing::Right => x + 8.0,
        Facing::Left => x - 12.0,
    };
    canvas.fill_rect(Rect::new(eye_x, y - h + 10.0, 4.0, 14.0), Color::WHITE);
}

/// Fades out over `lifetime` seconds.
pub fn draw_spark(canvas: &mut dyn Canvas, spark: &Spark, lifetime: f32) {
    let alpha = if lifetime > 0.0 { spark.t / lifetime } else { 0.0 };
    canvas.fill_circle(spark.pos, 8.0, SPARK.with_alpha(alpha));
}

pub fn draw_hitboxes(canvas: &mut dyn Canvas, frame: &HitboxFrame) {
    if let Some(attack) = frame.p1_attack {
        canvas.stroke_rect(attack.to_rect(), P1_ATTACK, 1.0);
    }
    if let Some(attack) = frame.p2_attack {
        canvas.stroke_rect(attack.to_rect(), P2_ATTACK, 1.0);
    }
    canvas.stroke_rect(frame.p1_hurt.to_rect(), P1_HURT, 1.0);
    canvas.stroke_rect(frame.p2_hurt.to_rect(), P2_HURT, 1.0);
}

fn bar_fill(hp: u32) -> f32 {
    BAR_WIDTH * (hp.min(Fighter::MAX_HP) as f32 / Fighter::MAX_HP as f32)
}

/// Health bars, names and the countdown. P2's bar drains toward the centre.
pub fn draw_hud(
    canvas: &mut dyn Canvas,
    hud: &HudSnapshot,
    p1: (&str, Color),
    p2: (&str, Color),
) {
    let width = canvas.size().x;
    let right_x = width - BAR_INSET - BAR_WIDTH;

    canvas.fill_rect(Rect::new(BAR_INSET, BAR_INSET, BAR_WIDTH, BAR_HEIGHT), BAR_BACK);
    canvas.fill_rect(
        Rect::new(BAR_INSET, BAR_INSET, bar_fill(hud.p1_hp), BAR_HEIGHT),
        p1.1,
    );

    canvas.fill_rect(Rect::new(right_x, BAR_INSET, BAR_WIDTH, BAR_HEIGHT), BAR_BACK);
    let p2_fill = bar_fill(hud.p2_hp);
    canvas.fill_rect(
        Rect::new(right_x + (BAR_WIDTH - p2_fill), BAR_INSET, p2_fill, BAR_HEIGHT),
        p2.1,
    );

    let label = TextStyle::new(12.0, Color::WHITE);
    canvas.fill_text(
        &format!("{} {} HP", p1.0, hud.p1_hp),
        Vec2::new(24.0, 32.0),
        label,
    );
    canvas.fill_text(
        &format!("{} {} HP", p2.0, hud.p2_hp),
        Vec2::new(width - 24.0, 32.0),
        label.align(TextAlign::Right),
    );

    let clock = hud.timer.max(0.0).round() as u32;
    canvas.fill_text(
        &clock.to_string(),
        Vec2::new(width * 0.5, 36.0),
        TextStyle::new(20.0, Color::WHITE)
            .bold()
            .align(TextAlign::Center),
    );
}

/// Dims the frame and shows a label; the hint line is optional so callers
/// can blink it.
pub fn draw_pause_overlay(canvas: &mut dyn Canvas, label: &str, hint: Option<&str>) {
    let size = canvas.size();
    canvas.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), OVERLAY_DIM);
    canvas.fill_text(
        label,
        Vec2::new(size.x * 0.5, size.y * 0.5 - 10.0),
        TextStyle::new(28.0, OVERLAY_LABEL)
            .bold()
            .align(TextAlign::Center),
    );
    if let Some(hint) = hint {
        canvas.fill_text(
            hint,
            Vec2::new(size.x * 0.5, size.y * 0.5 + 20.0),
            TextStyle::new(14.0, OVERLAY_HINT).align(TextAlign::Center),
        );
    }
}
