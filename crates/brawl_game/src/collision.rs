//! Box overlap tests for hit resolution.
//!
//! Boxes are centre + half-extent in canvas pixels. Two boxes overlap when the
//! distance between their centres is strictly less than their combined half
//! extents on both axes; touching edges do not count.

use brawl_render::Rect;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w: size.x * 0.5,
            half_h: size.y * 0.5,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.half_w * 2.0, self.half_h * 2.0)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        (self.center_x - other.center_x).abs() < self.half_w + other.half_w
            && (self.center_y - other.center_y).abs() < self.half_h + other.half_h
    }

    /// Halfway point between the two centres.
    pub fn midpoint(&self, other: &Aabb) -> Vec2 {
        (self.center() + other.center()) * 0.5
    }

    pub fn to_rect(&self) -> Rect {
        Rect::centered(self.center(), self.size())
    }
}
