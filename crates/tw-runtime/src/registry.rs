//! The capability registry: one strategy per slot, bound at startup.

use std::fmt;

use tracing::debug;
use tw_core::WorldState;
use tw_expr::TemplateExpander;
use tw_save::SnapshotStore;

use crate::capability::{
    CapabilitySlot, ExpandCapability, GameCapabilities, RestoreCapability, RestoreOutcome,
    SaveCapability, SaveOutcome,
};
use crate::error::{RegistryError, RegistryResult};

/// Holds the implementation bound to each [`CapabilitySlot`].
///
/// Each slot is bound at most once. Calling a slot that was never bound is
/// a programming error and panics; hosts call [`verify`](Self::verify)
/// after wiring to catch that at startup instead.
#[derive(Default)]
pub struct CapabilityRegistry {
    save: Option<Box<dyn SaveCapability>>,
    restore: Option<Box<dyn RestoreCapability>>,
    expand: Option<Box<dyn ExpandCapability>>,
}

impl CapabilityRegistry {
    /// Create a registry with every slot unbound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the standard implementations: `store` for Save and Restore,
    /// `expander` for Expand.
    pub fn standard(store: SnapshotStore, expander: TemplateExpander) -> Self {
        Self {
            save: Some(Box::new(store.clone())),
            restore: Some(Box::new(store)),
            expand: Some(Box::new(expander)),
        }
    }

    /// Bind the Save slot.
    pub fn bind_save(&mut self, capability: impl SaveCapability + 'static) -> RegistryResult<()> {
        let capability: Box<dyn SaveCapability> = Box::new(capability);
        bind(&mut self.save, CapabilitySlot::Save, capability)
    }

    /// Bind the Restore slot.
    pub fn bind_restore(
        &mut self,
        capability: impl RestoreCapability + 'static,
    ) -> RegistryResult<()> {
        let capability: Box<dyn RestoreCapability> = Box::new(capability);
        bind(&mut self.restore, CapabilitySlot::Restore, capability)
    }

    /// Bind the Expand slot.
    pub fn bind_expand(
        &mut self,
        capability: impl ExpandCapability + 'static,
    ) -> RegistryResult<()> {
        let capability: Box<dyn ExpandCapability> = Box::new(capability);
        bind(&mut self.expand, CapabilitySlot::Expand, capability)
    }

    /// Whether `slot` has an implementation.
    pub fn is_bound(&self, slot: CapabilitySlot) -> bool {
        match slot {
            CapabilitySlot::Save => self.save.is_some(),
            CapabilitySlot::Restore => self.restore.is_some(),
            CapabilitySlot::Expand => self.expand.is_some(),
        }
    }

    /// Check that every slot is bound.
    pub fn verify(&self) -> RegistryResult<()> {
        match CapabilitySlot::ALL.into_iter().find(|slot| !self.is_bound(*slot)) {
            Some(slot) => Err(RegistryError::Unbound(slot)),
            None => Ok(()),
        }
    }
}

fn bind<T: ?Sized>(
    target: &mut Option<Box<T>>,
    slot: CapabilitySlot,
    capability: Box<T>,
) -> RegistryResult<()> {
    if target.is_some() {
        return Err(RegistryError::AlreadyBound(slot));
    }
    *target = Some(capability);
    debug!(%slot, "capability bound");
    Ok(())
}

fn unbound(slot: CapabilitySlot) -> ! {
    panic!("capability `{slot}` invoked before it was bound")
}

impl GameCapabilities for CapabilityRegistry {
    fn save(&self, world: &WorldState, game: &str) -> SaveOutcome {
        match &self.save {
            Some(capability) => capability.save(world, game),
            None => unbound(CapabilitySlot::Save),
        }
    }

    fn restore(&self, world: &mut WorldState, game: &str) -> RestoreOutcome {
        match &self.restore {
            Some(capability) => capability.restore(world, game),
            None => unbound(CapabilitySlot::Restore),
        }
    }

    fn expand(&self, world: &mut WorldState, text: &str) -> String {
        match &self.expand {
            Some(capability) => capability.expand(world, text),
            None => unbound(CapabilitySlot::Expand),
        }
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("save", &self.save.is_some())
            .field("restore", &self.restore.is_some())
            .field("expand", &self.expand.is_some())
            .finish()
    }
}
