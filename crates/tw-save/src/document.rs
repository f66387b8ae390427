//! The textual snapshot document and its merge-on-restore semantics.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tw_core::{Entity, EntityId, SCHEMA_VERSION, VERSION_ATTRIBUTE, Value, WorldState};

use crate::error::{RestoreError, RestoreResult, SaveError, SaveResult};

/// A serialized copy of the world state graph at one instant.
///
/// Entities are stored once each, in an arena list; references between
/// them stay as ids, so cycles and shared references survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Game identifier the snapshot was saved under.
    pub game: String,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Root attributes, including the schema version marker.
    pub attributes: BTreeMap<String, Value>,
    /// Every entity reachable from the root attributes.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl SnapshotDocument {
    /// Capture the graph reachable from `world`.
    ///
    /// The version attribute is stamped with the current schema version.
    /// Non-finite floats and references to missing entities are rejected.
    pub fn capture(world: &WorldState, game: &str) -> SaveResult<Self> {
        let mut attributes = world.attributes().clone();
        attributes.insert(VERSION_ATTRIBUTE.to_string(), Value::from(SCHEMA_VERSION));

        let entities: Vec<Entity> = world.reachable_entities().into_iter().cloned().collect();

        for (key, value) in &attributes {
            check_value(world, value, || format!("attribute `{key}`"))?;
        }
        for entity in &entities {
            for (key, value) in &entity.properties {
                check_value(world, value, || {
                    format!("property `{key}` of \"{}\"", entity.name)
                })?;
            }
        }

        Ok(Self {
            game: game.to_string(),
            saved_at: Utc::now(),
            attributes,
            entities,
        })
    }

    /// The schema version marker, if present and textual.
    pub fn version(&self) -> Option<&str> {
        self.attributes.get(VERSION_ATTRIBUTE).and_then(Value::as_text)
    }

    /// Check the version marker and internal consistency.
    pub fn validate(&self) -> RestoreResult<()> {
        if self.version() != Some(SCHEMA_VERSION) {
            let found = match self.attributes.get(VERSION_ATTRIBUTE) {
                Some(value) => value.to_string(),
                None => "<missing>".to_string(),
            };
            return Err(RestoreError::IncompatibleVersion {
                found,
                expected: SCHEMA_VERSION.to_string(),
            });
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for entity in &self.entities {
            if !ids.insert(entity.id) {
                return Err(RestoreError::CorruptSnapshot(format!(
                    "duplicate entity id {}",
                    entity.id.0
                )));
            }
            if !names.insert(entity.name.to_lowercase()) {
                return Err(RestoreError::CorruptSnapshot(format!(
                    "duplicate entity name \"{}\"",
                    entity.name
                )));
            }
        }

        let dangling = |refs: Vec<EntityId>| refs.into_iter().find(|id| !ids.contains(id));
        for (key, value) in &self.attributes {
            if let Some(id) = dangling(value.references()) {
                return Err(RestoreError::CorruptSnapshot(format!(
                    "attribute `{key}` references missing entity {}",
                    id.0
                )));
            }
        }
        for entity in &self.entities {
            if let Some(id) = dangling(entity.references().collect()) {
                return Err(RestoreError::CorruptSnapshot(format!(
                    "entity \"{}\" references missing entity {}",
                    entity.name, id.0
                )));
            }
        }
        Ok(())
    }

    /// Overlay this snapshot onto `world`.
    ///
    /// Every attribute in the snapshot is installed or overwritten; live
    /// attributes the snapshot lacks are left as they are. Entities are
    /// upserted by id, and live entities the snapshot lacks are kept.
    /// Callers must [`validate`](Self::validate) first.
    pub fn merge_into(self, world: &mut WorldState) {
        for (key, value) in self.attributes {
            world.set_attribute(key, value);
        }
        for entity in self.entities {
            world.upsert_entity(entity);
        }
    }

    /// Validate and build a fresh world state from this snapshot alone.
    pub fn into_world(self) -> RestoreResult<WorldState> {
        self.validate()?;
        let mut world = WorldState::default();
        self.merge_into(&mut world);
        Ok(world)
    }
}

fn check_value(world: &WorldState, value: &Value, location: impl Fn() -> String) -> SaveResult<()> {
    if !value.is_serializable() {
        return Err(SaveError::Unserializable(location()));
    }
    if let Some(target) = value.references().into_iter().find(|id| world.entity(*id).is_none()) {
        return Err(SaveError::DanglingReference {
            from: location(),
            target,
        });
    }
    Ok(())
}
