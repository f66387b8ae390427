//! Capability registry and session wiring for Talewright.
//!
//! The host binds one implementation into each [`CapabilitySlot`] at
//! startup. Content code calls `save`, `restore`, and `expand` through the
//! [`GameCapabilities`] trait and never names the snapshot store or
//! template expander behind it.

/// Capability slots, strategy traits, and the facade trait.
pub mod capability;
/// Runtime configuration.
pub mod config;
/// Registry errors.
pub mod error;
/// The capability registry.
pub mod registry;
/// Game session bundling world state and capabilities.
pub mod session;

pub use capability::{
    CapabilitySlot, ExpandCapability, GameCapabilities, RestoreCapability, RestoreOutcome,
    SaveCapability, SaveOutcome,
};
pub use config::RuntimeConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::CapabilityRegistry;
pub use session::GameSession;
