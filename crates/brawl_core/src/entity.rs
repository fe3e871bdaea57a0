//! Typed registry of mutable entity records.
//!
//! Every record belongs to a registered type (`player`, `npc`, ...). A type
//! contributes default tags, an optional validator run on creation, and an
//! optional removal hook. Records keep insertion order so snapshots and
//! queries are deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Meta = serde_json::Map<String, serde_json::Value>;

type Validator<E> = Box<dyn Fn(&E) -> Result<(), String>>;
type RemoveHook<E> = Box<dyn Fn(&EntityRecord<E>)>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("entity type name must not be empty")]
    EmptyType,
    #[error("unknown entity type: {0}")]
    UnknownType(String),
    #[error("missing entity: {0}")]
    MissingEntity(String),
    #[error("invalid {kind} state: {reason}")]
    Validation { kind: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord<E> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: E,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub meta: Meta,
}

impl<E> EntityRecord<E> {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A record as accepted by [`EntityStore::hydrate`]; the id may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrateRecord<E> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: E,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub meta: Meta,
}

impl<E> From<EntityRecord<E>> for HydrateRecord<E> {
    fn from(record: EntityRecord<E>) -> Self {
        Self {
            id: Some(record.id),
            kind: record.kind,
            state: record.state,
            tags: record.tags,
            meta: record.meta,
        }
    }
}

pub struct EntityType<E> {
    default_tags: Vec<String>,
    validator: Option<Validator<E>>,
    on_remove: Option<RemoveHook<E>>,
}

impl<E> EntityType<E> {
    pub fn new() -> Self {
        Self {
            default_tags: Vec::new(),
            validator: None,
            on_remove: None,
        }
    }

    pub fn default_tags(mut self, tags: &[&str]) -> Self {
        self.default_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn validator(mut self, validator: impl Fn(&E) -> Result<(), String> + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn on_remove(mut self, hook: impl Fn(&EntityRecord<E>) + 'static) -> Self {
        self.on_remove = Some(Box::new(hook));
        self
    }
}

impl<E> Default for EntityType<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional extras for [`EntityStore::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub tags: Vec<String>,
    pub meta: Meta,
}

impl CreateOptions {
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

pub struct EntityStore<E> {
    registry: HashMap<String, EntityType<E>>,
    entities: HashMap<String, EntityRecord<E>>,
    order: Vec<String>,
    seq: u64,
}

impl<E> EntityStore<E> {
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
            entities: HashMap::new(),
            order: Vec::new(),
            seq: 0,
        }
    }

    /// Registers (or re-registers) a type.
    pub fn register_type(
        &mut self,
        kind: &str,
        entity_type: EntityType<E>,
    ) -> Result<(), EntityError> {
        if kind.trim().is_empty() {
            return Err(EntityError::EmptyType);
        }
        if self.registry.insert(kind.to_string(), entity_type).is_some() {
            log::debug!("Entity type '{kind}' re-registered");
        } else {
            log::debug!("Entity type '{kind}' registered");
        }
        Ok(())
    }

    fn next_id(&mut self, kind: &str) -> String {
        loop {
            self.seq += 1;
            let id = format!("{kind}-{}", self.seq);
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }

    /// Creates a record and returns its id. Default tags of the type are
    /// merged with `options.tags`.
    pub fn create(
        &mut self,
        kind: &str,
        state: E,
        options: CreateOptions,
    ) -> Result<String, EntityError> {
        let entity_type = self
            .registry
            .get(kind)
            .ok_or_else(|| EntityError::UnknownType(kind.to_string()))?;

        if let Some(validator) = &entity_type.validator {
            validator(&state).map_err(|reason| EntityError::Validation {
                kind: kind.to_string(),
                reason,
            })?;
        }

        let mut tags: BTreeSet<String> = entity_type.default_tags.iter().cloned().collect();
        tags.extend(options.tags);

        let id = self.next_id(kind);

        log::debug!("Entity created: {id} ({kind}) tags={tags:?}");
        self.order.push(id.clone());
        self.entities.insert(
            id.clone(),
            EntityRecord {
                id: id.clone(),
                kind: kind.to_string(),
                state,
                tags,
                meta: options.meta,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord<E>> {
        self.entities.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&EntityRecord<E>, EntityError> {
        self.get(id)
            .ok_or_else(|| EntityError::MissingEntity(id.to_string()))
    }

    pub fn state(&self, id: &str) -> Result<&E, EntityError> {
        self.require(id).map(|record| &record.state)
    }

    /// Runs `f` against the record's state in place.
    pub fn update<R>(&mut self, id: &str, f: impl FnOnce(&mut E) -> R) -> Result<R, EntityError> {
        let record = self
            .entities
            .get_mut(id)
            .ok_or_else(|| EntityError::MissingEntity(id.to_string()))?;
        let out = f(&mut record.state);
        log::trace!("Entity updated: {id} ({})", record.kind);
        Ok(out)
    }

    /// Removes a record, firing its type's removal hook. Returns the record,
    /// or `None` if the id was unknown.
    pub fn remove(&mut self, id: &str) -> Option<EntityRecord<E>> {
        let record = self.entities.remove(id)?;
        self.order.retain(|existing| existing != id);
        if let Some(hook) = self
            .registry
            .get(&record.kind)
            .and_then(|entity_type| entity_type.on_remove.as_ref())
        {
            hook(&record);
        }
        log::debug!("Entity removed: {id} ({})", record.kind);
        Some(record)
    }

    /// Drops every record without firing removal hooks.
    pub fn clear(&mut self) {
        if !self.entities.is_empty() {
            log::debug!("Entity store cleared ({} records)", self.entities.len());
        }
        self.entities.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord<E>> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&EntityRecord<E>> {
        self.find(|record| record.has_tag(tag))
    }

    pub fn find(&self, predicate: impl Fn(&EntityRecord<E>) -> bool) -> Vec<&EntityRecord<E>> {
        self.iter().filter(|record| predicate(record)).collect()
    }

    pub fn count_by_type(&self) -> BTreeMap<String, usize> {
        let mut totals = BTreeMap::new();
        for record in self.iter() {
            *totals.entry(record.kind.clone()).or_insert(0) += 1;
        }
        totals
    }
}

impl<E: Clone> EntityStore<E> {
    pub fn snapshot(&self) -> Vec<EntityRecord<E>> {
        self.iter().cloned().collect()
    }

    /// Replaces the whole store with `records`. Records without an id get a
    /// fresh UUID; unknown types are accepted with a warning; a repeated id
    /// overwrites the earlier record.
    pub fn hydrate(&mut self, records: impl IntoIterator<Item = HydrateRecord<E>>) {
        self.clear();
        for record in records {
            if !self.registry.contains_key(&record.kind) {
                log::warn!("Hydrating entity of unregistered type '{}'", record.kind);
            }
            let id = record
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            if self.entities.contains_key(&id) {
                log::warn!("Hydrate overwrote duplicate entity id {id}");
                self.order.retain(|existing| existing != &id);
            }
            self.order.push(id.clone());
            self.entities.insert(
                id.clone(),
                EntityRecord {
                    id,
                    kind: record.kind,
                    state: record.state,
                    tags: record.tags,
                    meta: record.meta,
                },
            );
        }
        log::info!("Entity store hydrated ({} records)", self.entities.len());
    }
}

impl<E> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}
