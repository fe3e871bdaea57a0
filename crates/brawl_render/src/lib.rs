//! 2D canvas abstraction for the fighter preview.
//!
//! Scenes never talk to a concrete backend. They paint through the [`Canvas`]
//! trait in logical canvas pixels (origin top-left, +y down). [`DrawList`] is
//! the built-in backend: it records every call as a serialisable
//! [`DrawCommand`], which a host replays onto a real surface (a browser
//! 2D context, a GPU quad batch) and which tests inspect directly.

pub mod canvas;
pub mod color;
pub mod draw_list;

pub use canvas::{Canvas, Rect, TextAlign, TextStyle};
pub use color::Color;
pub use draw_list::{DrawCommand, DrawList};
