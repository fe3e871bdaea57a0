//! Entity types stored by the runtime for this game.

use brawl_core::{EntityError, EntityRecord, EntityStore, EntityType};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::fighter::Fighter;

pub const PLAYER: &str = "player";
pub const NPC: &str = "npc";
pub const ITEM: &str = "item";

/// Loose pickup; registered for completeness, unused by the preview match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub durability: u32,
    pub owner: Option<String>,
    pub pos: Vec2,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            durability: 1,
            owner: None,
            pos: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameEntity {
    Fighter(Fighter),
    Item(Item),
}

impl GameEntity {
    pub fn as_fighter(&self) -> Option<&Fighter> {
        match self {
            GameEntity::Fighter(fighter) => Some(fighter),
            GameEntity::Item(_) => None,
        }
    }
}

fn validate_fighter(entity: &GameEntity) -> Result<(), String> {
    let GameEntity::Fighter(fighter) = entity else {
        return Err("expected a fighter".to_string());
    };
    if fighter.hp > Fighter::MAX_HP {
        return Err(format!("hp {} exceeds {}", fighter.hp, Fighter::MAX_HP));
    }
    if !(fighter.pos.is_finite() && fighter.vel.is_finite()) {
        return Err("position and velocity must be finite".to_string());
    }
    if fighter.size.min_element() <= 0.0 {
        return Err(format!("body size must be positive (got {})", fighter.size));
    }
    if fighter.dashing && fighter.wall_slide {
        return Err("cannot dash and wall slide at once".to_string());
    }
    Ok(())
}

fn validate_item(entity: &GameEntity) -> Result<(), String> {
    match entity {
        GameEntity::Item(item) if item.pos.is_finite() => Ok(()),
        GameEntity::Item(_) => Err("item position must be finite".to_string()),
        GameEntity::Fighter(_) => Err("expected an item".to_string()),
    }
}

fn log_removed(record: &EntityRecord<GameEntity>) {
    log::debug!("Entity '{}' ({}) removed", record.id, record.kind);
}

/// Store with the `player`, `npc` and `item` types registered.
pub fn new_entity_store() -> Result<EntityStore<GameEntity>, EntityError> {
    let mut store = EntityStore::new();
    store.register_type(
        PLAYER,
        EntityType::new()
            .default_tags(&["character"])
            .validator(validate_fighter)
            .on_remove(log_removed),
    )?;
    store.register_type(
        NPC,
        EntityType::new()
            .default_tags(&["character", "ai"])
            .validator(validate_fighter)
            .on_remove(log_removed),
    )?;
    store.register_type(
        ITEM,
        EntityType::new()
            .default_tags(&["item"])
            .validator(validate_item),
    )?;
    Ok(store)
}

/// Copy of the fighter stored under `id`.
pub fn fighter(store: &EntityStore<GameEntity>, id: &str) -> Result<Fighter, EntityError> {
    store
        .state(id)?
        .as_fighter()
        .copied()
        .ok_or_else(|| EntityError::Validation {
            kind: "fighter".to_string(),
            reason: format!("entity '{id}' is not a fighter"),
        })
}

/// Overwrites the fighter stored under `id`.
pub fn put_fighter(
    store: &mut EntityStore<GameEntity>,
    id: &str,
    fighter: Fighter,
) -> Result<(), EntityError> {
    store.update(id, |state| *state = GameEntity::Fighter(fighter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fighter::{Facing, P1_COLOR};
    use crate::tuning::PhysicsTuning;
    use brawl_core::{CreateOptions, HydrateRecord};

    fn rhea() -> Fighter {
        Fighter::new(200.0, 360.0, Facing::Right, P1_COLOR, &PhysicsTuning::default())
    }

    #[test]
    fn types_carry_default_tags() {
        let mut store = new_entity_store().expect("register base types");
        let p = store
            .create(PLAYER, GameEntity::Fighter(rhea()), CreateOptions::default())
            .expect("create player");
        let n = store
            .create(
                NPC,
                GameEntity::Fighter(rhea()),
                CreateOptions::default().with_tags(&["opponent"]),
            )
            .expect("create npc");
        let i = store
            .create(ITEM, GameEntity::Item(Item::default()), CreateOptions::default())
            .expect("create item");

        assert!(store.require(&p).expect("player").has_tag("character"));
        let npc = store.require(&n).expect("npc");
        assert!(npc.has_tag("ai") && npc.has_tag("opponent"));
        assert!(store.require(&i).expect("item").has_tag("item"));
        assert_eq!(store.find_by_tag("character").len(), 2);
    }

    #[test]
    fn validators_reject_bad_state() {
        let mut store = new_entity_store().expect("register base types");
        let mut broken = rhea();
        broken.hp = 140;
        let err = store
            .create(PLAYER, GameEntity::Fighter(broken), CreateOptions::default())
            .expect_err("hp over max");
        assert!(matches!(err, EntityError::Validation { .. }));

        let err = store
            .create(ITEM, GameEntity::Fighter(rhea()), CreateOptions::default())
            .expect_err("fighter is not an item");
        assert!(err.to_string().contains("expected an item"));

        let mut both = rhea();
        both.dashing = true;
        both.wall_slide = true;
        assert!(store
            .create(NPC, GameEntity::Fighter(both), CreateOptions::default())
            .is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn fighter_helpers_read_and_write() {
        let mut store = new_entity_store().expect("register base types");
        let id = store
            .create(PLAYER, GameEntity::Fighter(rhea()), CreateOptions::default())
            .expect("create player");
        let mut f = fighter(&store, &id).expect("read fighter");
        f.hp = 50;
        put_fighter(&mut store, &id, f).expect("write fighter");
        assert_eq!(fighter(&store, &id).expect("read back").hp, 50);
        assert!(matches!(
            fighter(&store, "ghost"),
            Err(EntityError::MissingEntity(_))
        ));
    }

    #[test]
    fn snapshot_survives_json() {
        let mut store = new_entity_store().expect("register base types");
        store
            .create(
                PLAYER,
                GameEntity::Fighter(rhea()),
                CreateOptions::default().with_meta("slot", "p1"),
            )
            .expect("create player");
        let json = serde_json::to_string(&store.snapshot()).expect("serialize snapshot");
        let records: Vec<HydrateRecord<GameEntity>> =
            serde_json::from_str(&json).expect("parse snapshot");

        let mut restored = new_entity_store().expect("register base types");
        restored.hydrate(records);
        assert_eq!(restored.snapshot(), store.snapshot());
    }
}
