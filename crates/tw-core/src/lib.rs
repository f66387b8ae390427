//! Core types for Talewright: the world state root, its entity arena, and
//! the values stored in both.
//!
//! Everything the runtime persists or renders hangs off a single
//! [`WorldState`]. Entities reference each other by [`EntityId`], so the
//! object graph may contain cycles without any shared ownership.

/// Entity types and identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Dynamically typed values stored in attributes and properties.
pub mod value;
/// The world state root that owns every live entity.
pub mod world;

/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export the value type.
pub use value::Value;
/// Re-export world state types.
pub use world::{SCHEMA_VERSION, VERSION_ATTRIBUTE, WorldState};
