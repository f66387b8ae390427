//! Capability slots and the strategy traits that fill them.

use std::fmt;
use std::path::PathBuf;

use tw_core::WorldState;
use tw_expr::TemplateExpander;
use tw_save::{RestoreResult, SaveResult, SnapshotStore};

/// Outcome of a save through the capability surface.
pub type SaveOutcome = SaveResult<PathBuf>;

/// Outcome of a restore through the capability surface.
pub type RestoreOutcome = RestoreResult<()>;

/// A named extension point bound once by the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CapabilitySlot {
    /// Persist the world state under a game name.
    Save,
    /// Merge a persisted world state back into the live one.
    Restore,
    /// Expand embedded expressions in narrative text.
    Expand,
}

impl CapabilitySlot {
    /// Every slot, in binding order.
    pub const ALL: [Self; 3] = [Self::Save, Self::Restore, Self::Expand];
}

impl fmt::Display for CapabilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Save => "Save",
            Self::Restore => "Restore",
            Self::Expand => "Expand",
        };
        f.write_str(name)
    }
}

/// Fills the [`CapabilitySlot::Save`] slot.
pub trait SaveCapability {
    /// Persist the graph reachable from `world` under `game`.
    fn save(&self, world: &WorldState, game: &str) -> SaveOutcome;
}

/// Fills the [`CapabilitySlot::Restore`] slot.
pub trait RestoreCapability {
    /// Merge the snapshot saved under `game` into `world`.
    fn restore(&self, world: &mut WorldState, game: &str) -> RestoreOutcome;
}

/// Fills the [`CapabilitySlot::Expand`] slot.
pub trait ExpandCapability {
    /// Expand embedded expressions in `text`.
    fn expand(&self, world: &mut WorldState, text: &str) -> String;
}

impl<F> SaveCapability for F
where
    F: Fn(&WorldState, &str) -> SaveOutcome,
{
    fn save(&self, world: &WorldState, game: &str) -> SaveOutcome {
        self(world, game)
    }
}

impl<F> RestoreCapability for F
where
    F: Fn(&mut WorldState, &str) -> RestoreOutcome,
{
    fn restore(&self, world: &mut WorldState, game: &str) -> RestoreOutcome {
        self(world, game)
    }
}

impl<F> ExpandCapability for F
where
    F: Fn(&mut WorldState, &str) -> String,
{
    fn expand(&self, world: &mut WorldState, text: &str) -> String {
        self(world, text)
    }
}

impl SaveCapability for SnapshotStore {
    fn save(&self, world: &WorldState, game: &str) -> SaveOutcome {
        SnapshotStore::save(self, world, game)
    }
}

impl RestoreCapability for SnapshotStore {
    fn restore(&self, world: &mut WorldState, game: &str) -> RestoreOutcome {
        SnapshotStore::restore(self, world, game)
    }
}

impl ExpandCapability for TemplateExpander {
    fn expand(&self, world: &mut WorldState, text: &str) -> String {
        TemplateExpander::expand(self, world, text)
    }
}

/// The capability surface content code calls through.
///
/// Content depends on `&dyn GameCapabilities` only, never on the concrete
/// store or expander behind it.
pub trait GameCapabilities {
    /// Save `world` under `game`.
    fn save(&self, world: &WorldState, game: &str) -> SaveOutcome;

    /// Restore the snapshot for `game` into `world`.
    fn restore(&self, world: &mut WorldState, game: &str) -> RestoreOutcome;

    /// Expand embedded expressions in `text`.
    fn expand(&self, world: &mut WorldState, text: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names() {
        let names: Vec<String> = CapabilitySlot::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["Save", "Restore", "Expand"]);
    }

    #[test]
    fn closures_are_capabilities() {
        let shout = |_: &mut WorldState, text: &str| text.to_uppercase();
        let mut world = WorldState::new();
        assert_eq!(ExpandCapability::expand(&shout, &mut world, "hi"), "HI");
    }

    #[test]
    fn expander_is_a_capability() {
        let expander = TemplateExpander::default();
        let mut world = WorldState::new();
        assert_eq!(
            ExpandCapability::expand(&expander, &mut world, "{2+2}"),
            "4"
        );
    }
}
