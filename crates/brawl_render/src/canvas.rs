use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Axis-aligned rectangle in canvas pixels, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `size` centred on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x * 0.5,
            y: center.y - size.y * 0.5,
            w: size.x,
            h: size.y,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size_px: f32,
    pub bold: bool,
    pub align: TextAlign,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(size_px: f32, color: Color) -> Self {
        Self {
            size_px,
            bold: false,
            align: TextAlign::Left,
            color,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// Immediate-mode 2D drawing surface.
///
/// Coordinates are logical canvas pixels with +y pointing down. Every call is
/// self-contained (no save/restore state), so draw functions can be composed
/// in any order without leaking styles into each other.
pub trait Canvas {
    /// Logical size of the surface in pixels.
    fn size(&self) -> Vec2;

    /// Wipes the whole surface.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color);

    /// Linear gradient running from the top edge of `rect` to its bottom edge.
    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color);

    /// Draws `text` with its baseline at `anchor.y`; `anchor.x` is interpreted
    /// according to `style.align`.
    fn fill_text(&mut self, text: &str, anchor: Vec2, style: TextStyle);
}
