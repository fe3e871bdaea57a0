//! Dimming overlay pushed on top of a paused match.

use brawl_core::{Action, InputSnapshot, Scene, SharedContext};
use brawl_render::Canvas;

use crate::entities::GameEntity;
use crate::rendering;

pub const PAUSE_OVERLAY: &str = "pause-overlay";

/// Update cycles per half blink of the hint line.
const BLINK_CYCLES: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PauseOverlayOptions {
    pub label: String,
    pub hint: String,
}

impl Default for PauseOverlayOptions {
    fn default() -> Self {
        Self {
            label: "Paused".to_string(),
            hint: "Press P to resume".to_string(),
        }
    }
}

pub struct PauseOverlayScene {
    options: PauseOverlayOptions,
    cycles: u32,
}

impl PauseOverlayScene {
    pub fn new(options: PauseOverlayOptions) -> Self {
        Self { options, cycles: 0 }
    }

    pub fn hint_visible(&self) -> bool {
        (self.cycles / BLINK_CYCLES) % 2 == 0
    }
}

impl Scene<GameEntity> for PauseOverlayScene {
    fn id(&self) -> &str {
        PAUSE_OVERLAY
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "label": self.options.label })
    }

    fn handle_input(&mut self, input: &InputSnapshot, shared: &mut SharedContext<GameEntity>) {
        // Only the top scene sees input, so popping removes this overlay.
        if input.pressed(Action::Pause) || input.pressed(Action::Confirm) {
            shared.pop_scene();
            shared.set_paused(false);
        }
    }

    // Runs with dt = 0 while paused, so count cycles rather than seconds.
    fn update(&mut self, _dt: f32, _input: &InputSnapshot, _shared: &mut SharedContext<GameEntity>) {
        self.cycles = self.cycles.wrapping_add(1);
    }

    fn render(&self, canvas: &mut dyn Canvas, _shared: &SharedContext<GameEntity>) {
        let hint = self.hint_visible().then_some(self.options.hint.as_str());
        rendering::draw_pause_overlay(canvas, &self.options.label, hint);
    }
}
