use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Rect, TextStyle};
use crate::color::Color;

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    FillRoundRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    FillEllipse {
        center: Vec2,
        radii: Vec2,
        color: Color,
    },
    FillVerticalGradient {
        rect: Rect,
        top: Color,
        bottom: Color,
    },
    FillText {
        text: String,
        anchor: Vec2,
        style: TextStyle,
    },
}

/// Recording [`Canvas`] backend.
///
/// `clear()` drops everything recorded so far, so after a frame has been
/// painted the list holds exactly that frame, ready to be handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawList {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::with_capacity(64),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every text string drawn this frame, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Canvas for DrawList {
    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.push(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        // Corner radius can never exceed half of either side.
        let radius = radius.min(rect.w * 0.5).min(rect.h * 0.5).max(0.0);
        self.push(DrawCommand::FillRoundRect {
            rect,
            radius,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        self.push(DrawCommand::FillEllipse {
            center,
            radii,
            color,
        });
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color) {
        self.push(DrawCommand::FillVerticalGradient { rect, top, bottom });
    }

    fn fill_text(&mut self, text: &str, anchor: Vec2, style: TextStyle) {
        if text.is_empty() {
            log::trace!("Skipping empty text draw at {anchor}");
            return;
        }
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            anchor,
            style,
        });
    }
}
