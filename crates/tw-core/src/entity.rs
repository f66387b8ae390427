use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// Unique identifier for every entity in the world.
///
/// Identifiers are stable across save and restore; references between
/// entities are stored as ids rather than embedded copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// The kind of an entity. Extensible via `Custom(String)` for game-defined types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A place the player can be in.
    Room,
    /// An object that can be carried or examined.
    Item,
    /// A person or creature.
    Actor,
    /// A game-defined entity type not covered by built-in kinds.
    Custom(String),
}

impl EntityKind {
    /// Parse a kind from its lowercase name.
    pub fn parse(s: &str) -> Self {
        match s {
            "room" => Self::Room,
            "item" => Self::Item,
            "actor" => Self::Actor,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => write!(f, "room"),
            Self::Item => write!(f, "item"),
            Self::Actor => write!(f, "actor"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// A world entity: a room, item, actor, or anything else the game defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// The kind (type) of this entity.
    pub kind: EntityKind,
    /// Display name of the entity, unique within a world (case-insensitive).
    pub name: String,
    /// Named properties. Values may reference other entities.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Entity {
    /// Create a new entity with a random ID.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::with_id(EntityId::new(), kind, name)
    }

    /// Create an entity with a pre-assigned ID.
    pub fn with_id(id: EntityId, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Iterate over every entity this one references directly.
    pub fn references(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.properties.values().flat_map(Value::references)
    }
}
