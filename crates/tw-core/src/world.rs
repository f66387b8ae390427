use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// Root attribute carrying the schema version of the world state.
pub const VERSION_ATTRIBUTE: &str = "version";

/// Current schema version written into every new root and snapshot.
pub const SCHEMA_VERSION: &str = "1";

/// The world state root. Owns every live entity.
///
/// Root attributes map names to values; entities live in an arena keyed
/// by [`EntityId`] and are referenced from attributes or from each other
/// through [`Value::Ref`]. Only entities reachable from the attributes
/// form part of the persisted graph.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    attributes: BTreeMap<String, Value>,
    entities: HashMap<EntityId, Entity>,

    // Indexes
    by_name_lower: HashMap<String, EntityId>,

    revision: u64,
}

impl WorldState {
    /// Create an empty root carrying the current schema version.
    pub fn new() -> Self {
        let mut world = Self::default();
        world.set_attribute(VERSION_ATTRIBUTE, SCHEMA_VERSION);
        world
    }

    /// Counter bumped by every mutating call, including [`WorldState::entity_mut`].
    ///
    /// Two equal readings mean nothing changed in between.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // -----------------------------------------------------------------------
    // Root attributes
    // -----------------------------------------------------------------------

    /// Get a root attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Install or overwrite a root attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.touch();
        self.attributes.insert(name.into(), value.into())
    }

    /// Remove a root attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.touch();
        self.attributes.remove(name)
    }

    /// All root attributes, ordered by name.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    // -----------------------------------------------------------------------
    // Entity arena
    // -----------------------------------------------------------------------

    /// Add an entity to the arena. Returns the entity's ID.
    pub fn add_entity(&mut self, entity: Entity) -> CoreResult<EntityId> {
        let name_lower = entity.name.to_lowercase();
        if self.by_name_lower.contains_key(&name_lower) {
            return Err(CoreError::DuplicateName(entity.name.clone()));
        }

        let id = entity.id;
        self.touch();
        self.by_name_lower.insert(name_lower, id);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Insert an entity, replacing any entity with the same ID.
    ///
    /// A different entity already holding the same name is removed so the
    /// name index stays unique.
    pub fn upsert_entity(&mut self, entity: Entity) {
        self.touch();
        let name_lower = entity.name.to_lowercase();
        if let Some(old) = self.entities.get(&entity.id) {
            self.by_name_lower.remove(&old.name.to_lowercase());
        }
        if let Some(clash) = self.by_name_lower.get(&name_lower).copied()
            && clash != entity.id
        {
            self.entities.remove(&clash);
        }
        self.by_name_lower.insert(name_lower, entity.id);
        self.entities.insert(entity.id, entity);
    }

    /// Get a reference to an entity by ID.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    ///
    /// Renaming through this reference bypasses the name index; use
    /// [`WorldState::rename_entity`] instead.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.touch();
        self.entities.get_mut(&id)
    }

    /// Rename an entity, keeping the name index consistent.
    pub fn rename_entity(&mut self, id: EntityId, name: impl Into<String>) -> CoreResult<()> {
        let name = name.into();
        let name_lower = name.to_lowercase();
        if self.by_name_lower.get(&name_lower).is_some_and(|other| *other != id) {
            return Err(CoreError::DuplicateName(name));
        }
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::EntityNotFound(id))?;
        self.by_name_lower.remove(&entity.name.to_lowercase());
        entity.name = name;
        self.by_name_lower.insert(name_lower, id);
        self.touch();
        Ok(())
    }

    /// Find an entity by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.by_name_lower
            .get(&name.to_lowercase())
            .and_then(|id| self.entities.get(id))
    }

    /// Find an entity ID by name (case-insensitive).
    pub fn find_id_by_name(&self, name: &str) -> Option<EntityId> {
        self.by_name_lower.get(&name.to_lowercase()).copied()
    }

    /// Remove an entity from the arena.
    ///
    /// References to it elsewhere are left dangling; they render as
    /// `#<id>` and are skipped by [`WorldState::reachable_entities`].
    pub fn remove_entity(&mut self, id: EntityId) -> CoreResult<Entity> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(CoreError::EntityNotFound(id))?;
        self.by_name_lower.remove(&entity.name.to_lowercase());
        self.touch();
        Ok(entity)
    }

    /// Get all entities in the arena, reachable or not.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of entities in the arena.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read an entity property.
    pub fn property(&self, id: EntityId, key: &str) -> Option<&Value> {
        self.entities.get(&id).and_then(|e| e.properties.get(key))
    }

    /// Install or overwrite an entity property, returning the previous value.
    pub fn set_property(
        &mut self,
        id: EntityId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> CoreResult<Option<Value>> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::EntityNotFound(id))?;
        let previous = entity.properties.insert(key.into(), value.into());
        self.touch();
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // Graph traversal
    // -----------------------------------------------------------------------

    /// Every entity reachable from the root attributes, in breadth-first
    /// order. Cycles are visited once; dangling references are skipped.
    pub fn reachable_entities(&self) -> Vec<&Entity> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<EntityId> = self
            .attributes
            .values()
            .flat_map(Value::references)
            .collect();
        let mut out = Vec::new();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(entity) = self.entities.get(&id) {
                queue.extend(entity.references().filter(|r| !seen.contains(r)));
                out.push(entity);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render a value as narrative text. Entity references become the
    /// entity's name.
    pub fn describe_value(&self, value: &Value) -> String {
        value.render_with(&|id| self.entity_label(id))
    }

    /// Like [`WorldState::describe_value`], but returns `None` once the
    /// rendered text grows past `max_bytes`.
    pub fn describe_value_within(&self, value: &Value, max_bytes: usize) -> Option<String> {
        value.render_within(&|id| self.entity_label(id), max_bytes)
    }

    fn entity_label(&self, id: EntityId) -> String {
        self.entities
            .get(&id)
            .map_or_else(|| format!("#{id}"), |e| e.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn cave_world() -> (WorldState, EntityId, EntityId) {
        let mut world = WorldState::new();
        let cave = world
            .add_entity(Entity::new(EntityKind::Room, "Dark Cave"))
            .unwrap();
        let lamp = world
            .add_entity(Entity::new(EntityKind::Item, "brass lamp").with_property("location", cave))
            .unwrap();
        world
            .set_property(cave, "contents", Value::List(vec![Value::Ref(lamp)]))
            .unwrap();
        world.set_attribute("here", cave);
        (world, cave, lamp)
    }

    #[test]
    fn new_world_carries_schema_version() {
        let world = WorldState::new();
        assert_eq!(
            world.attribute(VERSION_ATTRIBUTE),
            Some(&Value::from(SCHEMA_VERSION))
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut world = WorldState::new();
        world
            .add_entity(Entity::new(EntityKind::Actor, "Troll"))
            .unwrap();
        let result = world.add_entity(Entity::new(EntityKind::Item, "troll"));
        assert!(matches!(result, Err(CoreError::DuplicateName(_))));
    }

    #[test]
    fn find_by_name_case_insensitive() {
        let (world, cave, _) = cave_world();
        assert_eq!(world.find_id_by_name("dark cave"), Some(cave));
        assert!(world.find_by_name("DARK CAVE").is_some());
        assert!(world.find_by_name("nowhere").is_none());
    }

    #[test]
    fn reachable_entities_handles_cycles() {
        let (world, cave, lamp) = cave_world();
        let ids: Vec<_> = world.reachable_entities().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![cave, lamp]);
    }

    #[test]
    fn unreachable_entities_are_excluded() {
        let (mut world, _, _) = cave_world();
        world
            .add_entity(Entity::new(EntityKind::Item, "forgotten key"))
            .unwrap();
        assert_eq!(world.entity_count(), 3);
        assert_eq!(world.reachable_entities().len(), 2);
    }

    #[test]
    fn dangling_refs_are_skipped() {
        let (mut world, _, lamp) = cave_world();
        world.remove_entity(lamp).unwrap();
        assert_eq!(world.reachable_entities().len(), 1);
        let contents = world.property(world.find_id_by_name("dark cave").unwrap(), "contents");
        let rendered = world.describe_value(contents.unwrap());
        assert_eq!(rendered, format!("[#{lamp}]"));
    }

    #[test]
    fn describe_value_uses_entity_names() {
        let (world, cave, _) = cave_world();
        assert_eq!(world.describe_value(&Value::Ref(cave)), "Dark Cave");
    }

    #[test]
    fn upsert_replaces_by_id_and_by_name() {
        let (mut world, cave, _) = cave_world();
        let mut renamed = world.entity(cave).unwrap().clone();
        renamed.name = "Lit Cave".to_string();
        world.upsert_entity(renamed);
        assert!(world.find_by_name("dark cave").is_none());
        assert_eq!(world.find_id_by_name("lit cave"), Some(cave));

        let impostor = Entity::new(EntityKind::Room, "Lit Cave");
        let impostor_id = impostor.id;
        world.upsert_entity(impostor);
        assert!(world.entity(cave).is_none());
        assert_eq!(world.find_id_by_name("lit cave"), Some(impostor_id));
    }

    #[test]
    fn rename_keeps_index_consistent() {
        let (mut world, cave, lamp) = cave_world();
        world.rename_entity(lamp, "old lamp").unwrap();
        assert_eq!(world.find_id_by_name("old lamp"), Some(lamp));
        assert!(world.find_by_name("brass lamp").is_none());
        assert!(matches!(
            world.rename_entity(lamp, "dark cave"),
            Err(CoreError::DuplicateName(_))
        ));
        assert_eq!(world.find_id_by_name("dark cave"), Some(cave));
    }

    #[test]
    fn revision_moves_on_every_mutation() {
        let (mut world, cave, lamp) = cave_world();
        let start = world.revision();
        assert!(world.attribute("here").is_some());
        assert!(world.find_by_name("brass lamp").is_some());
        assert_eq!(world.revision(), start);

        world.set_attribute("score", 1);
        let after_attribute = world.revision();
        assert_ne!(after_attribute, start);

        world.set_property(lamp, "lit", true).unwrap();
        assert_ne!(world.revision(), after_attribute);

        let before_remove = world.revision();
        world.remove_entity(cave).unwrap();
        assert_ne!(world.revision(), before_remove);
    }

    #[test]
    fn describe_value_within_stops_at_budget() {
        let (world, _, lamp) = cave_world();
        let list = Value::List(vec![Value::Ref(lamp); 100]);
        assert!(world.describe_value_within(&list, 50).is_none());
        assert_eq!(
            world.describe_value_within(&list, usize::MAX),
            Some(world.describe_value(&list))
        );
    }
}
