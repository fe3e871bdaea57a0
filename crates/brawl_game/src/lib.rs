//! Fighter preview: a one-on-one fighting match hosted by the `brawl_core`
//! scene runtime.
//!
//! The fixed-step match lives in [`sim::MatchSim`]; fighters are records in
//! the runtime's entity store. [`scenes::new_scene_manager`] builds a manager
//! with the match and pause scenes registered, ready for a host to drive.

pub mod ai;
pub mod collision;
pub mod combat;
pub mod config;
pub mod entities;
pub mod fighter;
pub mod rendering;
pub mod replay;
pub mod scenes;
pub mod sim;
pub mod tuning;

pub use config::{ControlMethod, Difficulty, MatchConfig, MatchMeta, MatchSetup};
pub use fighter::{Facing, Fighter, FighterIntent};
pub use sim::{HudSnapshot, MatchSim, RoundStatus, Slot};
pub use tuning::Tuning;
