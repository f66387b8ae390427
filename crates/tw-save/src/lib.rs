//! World snapshot codec for Talewright.
//!
//! A [`SnapshotStore`] writes the part of a [`tw_core::WorldState`] that is
//! reachable from its root attributes to one JSON file per game, replacing
//! the previous file atomically. Restoring reads and validates the whole
//! file first and then merges it into the live state.

/// The serialized snapshot document.
pub mod document;
/// Save and restore errors.
pub mod error;
/// The file-backed store.
pub mod store;

pub use document::SnapshotDocument;
pub use error::{RestoreError, RestoreResult, SaveError, SaveResult};
pub use store::{SnapshotStore, StoreConfig, is_valid_name, read_document};
