//! File-backed snapshot store with atomic replacement.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use tw_core::WorldState;

use crate::document::SnapshotDocument;
use crate::error::{RestoreError, RestoreResult, SaveError, SaveResult};

/// Where and how snapshots are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one file per game.
    pub dir: PathBuf,
    /// File extension for snapshot files, without the dot.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: "save".to_string(),
        }
    }
}

impl StoreConfig {
    /// Store snapshots in `dir` with the default extension.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Use a different file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Saves and restores world state snapshots keyed by game name.
///
/// A save writes the complete document to a temporary file in the target
/// directory and renames it over the previous snapshot, so a reader sees
/// either the old snapshot or the new one, never a partial write.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    config: StoreConfig,
}

impl SnapshotStore {
    /// Create a store with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The file a game's snapshot lives in.
    pub fn path_for(&self, game: &str) -> PathBuf {
        self.config
            .dir
            .join(format!("{game}.{}", self.config.extension))
    }

    /// Whether a snapshot exists for `game`.
    pub fn exists(&self, game: &str) -> bool {
        is_valid_name(game) && self.path_for(game).is_file()
    }

    /// Serialize the graph reachable from `world` under `game`.
    ///
    /// On error nothing has been renamed into place and any earlier
    /// snapshot for the same game is untouched.
    pub fn save(&self, world: &WorldState, game: &str) -> SaveResult<PathBuf> {
        if !is_valid_name(game) {
            return Err(SaveError::InvalidName(game.to_string()));
        }

        let document = SnapshotDocument::capture(world, game)?;
        let json = serde_json::to_string_pretty(&document)?;

        let dir = &self.config.dir;
        fs::create_dir_all(dir).map_err(|source| SaveError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = self.path_for(game);
        let write_err = |source: io::Error| SaveError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!(
            game,
            path = %path.display(),
            entities = document.entities.len(),
            "game saved"
        );
        Ok(path)
    }

    /// Read and validate the snapshot for `game` without applying it.
    pub fn load(&self, game: &str) -> RestoreResult<SnapshotDocument> {
        if !is_valid_name(game) {
            return Err(RestoreError::InvalidName(game.to_string()));
        }
        let path = self.path_for(game);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RestoreError::NotFound(game.to_string()));
            }
            Err(source) => return Err(RestoreError::Io { path, source }),
        };
        let document = read_document(&bytes)?;
        debug!(game, path = %path.display(), "snapshot loaded");
        Ok(document)
    }

    /// Merge the snapshot for `game` into `world`.
    ///
    /// The snapshot is fully read and validated before `world` is touched.
    /// Snapshot attributes overwrite live ones; live attributes and
    /// entities the snapshot lacks are kept.
    pub fn restore(&self, world: &mut WorldState, game: &str) -> RestoreResult<()> {
        let document = self.load(game)?;
        let entities = document.entities.len();
        document.merge_into(world);
        info!(game, entities, "game restored");
        Ok(())
    }

    /// Delete the snapshot for `game`. A missing snapshot is not an error.
    pub fn remove(&self, game: &str) -> SaveResult<()> {
        if !is_valid_name(game) {
            return Err(SaveError::InvalidName(game.to_string()));
        }
        let path = self.path_for(game);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(game, "snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SaveError::Io { path, source }),
        }
    }
}

/// Decode and validate a snapshot document from raw bytes.
pub fn read_document(bytes: &[u8]) -> RestoreResult<SnapshotDocument> {
    let document: SnapshotDocument = serde_json::from_slice(bytes)
        .map_err(|e| RestoreError::CorruptSnapshot(e.to_string()))?;
    document.validate()?;
    Ok(document)
}

/// Whether `game` can be used as a snapshot file stem.
pub fn is_valid_name(game: &str) -> bool {
    !game.is_empty()
        && game != "."
        && game != ".."
        && !game.contains(['/', '\\', '\0'])
        && Path::new(game).file_name().is_some()
}
