pub mod eval;
pub mod expand;
pub mod new;
pub mod restore;
pub mod save;
pub mod show;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::debug;
use tw_core::WorldState;
use tw_runtime::{CapabilityRegistry, GameSession, RuntimeConfig};
use tw_save::SnapshotDocument;

/// Options shared by every subcommand.
#[derive(Args)]
pub struct WorldArgs {
    /// World file (JSON, same layout as a save file)
    #[arg(short, long, global = true, default_value = "world.json")]
    pub world: PathBuf,

    /// Game identifier; names the save file
    #[arg(short, long, global = true, default_value = "game")]
    pub game: String,

    /// Directory holding save files
    #[arg(short, long, global = true, default_value = ".")]
    pub save_dir: PathBuf,
}

impl WorldArgs {
    pub fn config(&self) -> RuntimeConfig {
        RuntimeConfig::new(&self.game).with_save_dir(&self.save_dir)
    }
}

/// Read a world file.
fn load_world(path: &Path) -> Result<WorldState> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read world file {}", path.display()))?;
    let document: SnapshotDocument = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid world file {}", path.display()))?;
    let world = document
        .into_world()
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid world file {}", path.display()))?;
    debug!(path = %path.display(), entities = world.entity_count(), "world loaded");
    Ok(world)
}

/// Read a world file, or start from an empty world if it does not exist.
fn load_world_or_new(path: &Path) -> Result<WorldState> {
    if path.exists() {
        load_world(path)
    } else {
        Ok(WorldState::new())
    }
}

/// Write the reachable part of `world` to a world file.
fn write_world(path: &Path, world: &WorldState, game: &str) -> Result<()> {
    let document = SnapshotDocument::capture(world, game).into_diagnostic()?;
    let mut json = serde_json::to_string_pretty(&document).into_diagnostic()?;
    json.push('\n');
    fs::write(path, json)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot write world file {}", path.display()))
}

/// Open a session with every capability bound and verified.
fn open_session(args: &WorldArgs, world: WorldState) -> Result<GameSession> {
    let config = args.config();
    let registry = CapabilityRegistry::standard(config.store(), config.expander());
    GameSession::with_registry(&config.game, world, registry).into_diagnostic()
}
