//! Scenes this game registers with the runtime.

pub mod match_preview;
pub mod pause_overlay;

use brawl_core::{EntityError, ManagerConfig, Scene, SceneManager};

use crate::entities::{new_entity_store, GameEntity};

pub use match_preview::{MatchPreviewPayload, MatchPreviewScene, MATCH_PREVIEW};
pub use pause_overlay::{PauseOverlayOptions, PauseOverlayScene, PAUSE_OVERLAY};

pub fn register_scenes(manager: &mut SceneManager<GameEntity>) {
    manager.register(MATCH_PREVIEW, |payload| {
        let payload: MatchPreviewPayload = payload.take_or_default()?;
        Ok(Box::new(MatchPreviewScene::new(payload)) as Box<dyn Scene<GameEntity>>)
    });
    manager.register(PAUSE_OVERLAY, |payload| {
        let options: PauseOverlayOptions = payload.take_or_default()?;
        Ok(Box::new(PauseOverlayScene::new(options)) as Box<dyn Scene<GameEntity>>)
    });
}

/// Manager with the game's entity types and scenes registered.
pub fn new_scene_manager(config: ManagerConfig) -> Result<SceneManager<GameEntity>, EntityError> {
    let mut manager = SceneManager::new(config, new_entity_store()?);
    register_scenes(&mut manager);
    Ok(manager)
}
