//! A game session: the live world plus the capabilities bound for it.

use tw_core::WorldState;

use crate::capability::{GameCapabilities, RestoreOutcome, SaveOutcome};
use crate::config::RuntimeConfig;
use crate::error::RegistryResult;
use crate::registry::CapabilityRegistry;

/// Owns the world state for one game and routes save, restore, and
/// expansion through the capability registry.
#[derive(Debug)]
pub struct GameSession {
    /// The live world state.
    world: WorldState,
    /// Bound capabilities.
    registry: CapabilityRegistry,
    /// Game identifier used for snapshots.
    game: String,
}

impl GameSession {
    /// Create a session with the standard store and expander from `config`.
    pub fn new(config: &RuntimeConfig, world: WorldState) -> Self {
        let registry = CapabilityRegistry::standard(config.store(), config.expander());
        Self {
            world,
            registry,
            game: config.game.clone(),
        }
    }

    /// Create a session around a custom registry.
    ///
    /// Fails if any slot of `registry` is unbound.
    pub fn with_registry(
        game: impl Into<String>,
        world: WorldState,
        registry: CapabilityRegistry,
    ) -> RegistryResult<Self> {
        registry.verify()?;
        Ok(Self {
            world,
            registry,
            game: game.into(),
        })
    }

    /// The game identifier.
    pub fn game(&self) -> &str {
        &self.game
    }

    /// Get the world state.
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Get a mutable reference to the world state.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Consume the session, returning the world state.
    pub fn into_world(self) -> WorldState {
        self.world
    }

    /// The capability surface, for content code.
    pub fn capabilities(&self) -> &dyn GameCapabilities {
        &self.registry
    }

    /// Save the world under this session's game identifier.
    pub fn save(&self) -> SaveOutcome {
        self.registry.save(&self.world, &self.game)
    }

    /// Merge this game's snapshot into the world.
    pub fn restore(&mut self) -> RestoreOutcome {
        self.registry.restore(&mut self.world, &self.game)
    }

    /// Expand embedded expressions in `text` against the world.
    pub fn expand(&mut self, text: &str) -> String {
        self.registry.expand(&mut self.world, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySlot;
    use crate::error::RegistryError;
    use tempfile::TempDir;
    use tw_core::{Entity, EntityKind, Value};
    use tw_save::RestoreError;

    fn session_in(dir: &TempDir) -> GameSession {
        let config = RuntimeConfig::new("cave").with_save_dir(dir.path());
        GameSession::new(&config, WorldState::new())
    }

    #[test]
    fn save_then_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        let lamp = session
            .world_mut()
            .add_entity(Entity::new(EntityKind::Item, "lamp"))
            .unwrap();
        session.world_mut().set_attribute("carried", lamp);
        session.world_mut().set_attribute("score", 10);

        let path = session.save().unwrap();
        assert!(path.ends_with("cave.save"));

        session.world_mut().set_attribute("score", 0);
        session.restore().unwrap();
        assert_eq!(session.world().attribute("score"), Some(&Value::Int(10)));
        assert_eq!(session.expand("You carry the {carried}."), "You carry the lamp.");
    }

    #[test]
    fn restore_before_any_save_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.world_mut().set_attribute("score", 5);
        assert!(matches!(session.restore(), Err(RestoreError::NotFound(_))));
        assert_eq!(session.world().attribute("score"), Some(&Value::Int(5)));
    }

    #[test]
    fn expand_updates_world() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        assert_eq!(session.expand("{turns = 3}Turn {turns}"), "Turn 3");
        assert_eq!(session.into_world().attribute("turns"), Some(&Value::Int(3)));
    }

    #[test]
    fn custom_registry_must_be_complete() {
        let mut registry = CapabilityRegistry::new();
        registry
            .bind_expand(|_: &mut WorldState, text: &str| text.to_string())
            .unwrap();
        let err = GameSession::with_registry("cave", WorldState::new(), registry).unwrap_err();
        assert_eq!(err, RegistryError::Unbound(CapabilitySlot::Save));
    }

    #[test]
    fn content_sees_only_the_capability_surface() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        let mut scratch = WorldState::new();
        let caps = session.capabilities();
        assert_eq!(caps.expand(&mut scratch, "{1+1}"), "2");
        assert_eq!(session.game(), "cave");
        session.world_mut().set_attribute("x", 1);
    }
}
