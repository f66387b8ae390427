//! Error types for saving and restoring snapshots.

use std::path::PathBuf;

use thiserror::Error;
use tw_core::EntityId;

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Result type for restore operations.
pub type RestoreResult<T> = Result<T, RestoreError>;

/// A save could not be completed. The previous save, if any, is intact.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The game name cannot be used as a file name.
    #[error("save failed: invalid game name {0:?}")]
    InvalidName(String),

    /// A value reachable from the root cannot be written as text.
    #[error("save failed: unserializable value in {0}")]
    Unserializable(String),

    /// An entity reachable from the root references a missing entity.
    #[error("save failed: {from} references missing entity #{target}")]
    DanglingReference {
        /// Where the reference was found.
        from: String,
        /// The missing entity.
        target: EntityId,
    },

    /// Encoding the snapshot failed.
    #[error("save failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing or renaming the snapshot file failed.
    #[error("save failed: cannot write {}: {source}", path.display())]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A restore was rejected. The live world state has not been modified.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// No snapshot exists under this name.
    #[error("no saved game yet for \"{0}\"")]
    NotFound(String),

    /// The snapshot could not be decoded or is internally inconsistent.
    #[error("save file unreadable: {0}")]
    CorruptSnapshot(String),

    /// The snapshot was written by an incompatible schema version.
    #[error("save file has version {found}, expected {expected}")]
    IncompatibleVersion {
        /// Version marker found in the snapshot.
        found: String,
        /// Version this build reads.
        expected: String,
    },

    /// The game name cannot be used as a file name.
    #[error("invalid game name {0:?}")]
    InvalidName(String),

    /// Reading the snapshot file failed for a reason other than absence.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
