//! Configuration for a game session.

use std::path::PathBuf;

use tw_expr::eval::{DEFAULT_MAX_LIST_LEN, DEFAULT_MAX_TEXT_LEN};
use tw_expr::{Evaluator, ExpanderConfig, TemplateExpander};
use tw_save::{SnapshotStore, StoreConfig};

/// Configuration for a [`GameSession`](crate::GameSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Game identifier; names the snapshot file.
    pub game: String,
    /// Directory holding snapshot files.
    pub save_dir: PathBuf,
    /// Snapshot file extension, without the dot.
    pub extension: String,
    /// Maximum template splice steps.
    pub max_depth: usize,
    /// Stop template expansion when a text repeats.
    pub detect_cycles: bool,
    /// Maximum length of text built by one expression.
    pub max_text_len: usize,
    /// Maximum number of elements in a list built by one expression.
    pub max_list_len: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        let expander = ExpanderConfig::default();
        Self {
            game: "game".to_string(),
            save_dir: store.dir,
            extension: store.extension,
            max_depth: expander.max_depth,
            detect_cycles: expander.detect_cycles,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            max_list_len: DEFAULT_MAX_LIST_LEN,
        }
    }
}

impl RuntimeConfig {
    /// Create a config for the game `game` with default settings.
    pub fn new(game: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            ..Self::default()
        }
    }

    /// Set the snapshot directory.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Set the snapshot file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the template depth limit (at least 1).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Enable or disable template cycle detection.
    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    /// Set the text length limit for expression results.
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }

    /// Set the list length limit for expression results.
    pub fn with_max_list_len(mut self, max_list_len: usize) -> Self {
        self.max_list_len = max_list_len;
        self
    }

    /// Build the snapshot store this config describes.
    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(StoreConfig::new(&self.save_dir).with_extension(&self.extension))
    }

    /// Build the expression evaluator this config describes.
    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new()
            .with_max_text_len(self.max_text_len)
            .with_max_list_len(self.max_list_len)
    }

    /// Build the template expander this config describes.
    pub fn expander(&self) -> TemplateExpander {
        TemplateExpander::new(
            self.evaluator(),
            ExpanderConfig::new()
                .with_max_depth(self.max_depth)
                .with_cycle_detection(self.detect_cycles),
        )
    }
}
