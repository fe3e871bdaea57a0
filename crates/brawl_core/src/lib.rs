//! Runtime kernel for the fighter preview: input edge detection, the entity
//! store, the fixed-timestep clock and the scene-stack manager.
//!
//! Nothing in here knows about fighters. The game crate registers its entity
//! types and scene factories and drives [`scene::SceneManager::frame`] from
//! the host's frame callback.

pub mod entity;
pub mod input;
pub mod scene;
pub mod time;

pub use entity::{CreateOptions, EntityError, EntityRecord, EntityStore, EntityType, HydrateRecord};
pub use input::{Action, InputController, InputSnapshot, Key};
pub use scene::{
    Environment, Initialization, ManagerConfig, Scene, SceneCommand, SceneError, SceneManager,
    ScenePayload, SharedContext,
};
pub use time::TimeState;
