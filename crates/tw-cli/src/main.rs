//! Command-line host for the Talewright kernel.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::WorldArgs;

#[derive(Parser)]
#[command(
    name = "tw",
    about = "Talewright: save games and narrative templates for text adventures",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    world: WorldArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter world file
    New {
        /// Path of the world file to create
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Expand embedded {expressions} in a piece of text
    Expand {
        /// Narrative text
        text: String,

        /// Write changes made by the expressions back to the world file
        #[arg(short, long)]
        update: bool,
    },

    /// Evaluate a single expression and print its value
    Eval {
        /// Expression source
        expr: String,

        /// Write changes made by the expression back to the world file
        #[arg(short, long)]
        update: bool,
    },

    /// Save the world file's state under the game identifier
    Save,

    /// Merge the saved game back into the world file
    Restore,

    /// Show the world file's attributes and entities
    Show {
        /// Show one entity in detail (case-insensitive)
        name: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = &cli.world;

    let result = match cli.command {
        Commands::New { file, force } => commands::new::run(&file, &args.game, force),
        Commands::Expand { text, update } => commands::expand::run(args, &text, update),
        Commands::Eval { expr, update } => commands::eval::run(args, &expr, update),
        Commands::Save => commands::save::run(args),
        Commands::Restore => commands::restore::run(args),
        Commands::Show { name } => commands::show::run(args, name.as_deref()),
    };

    if let Err(report) = result {
        eprintln!("{report:?}");
        process::exit(1);
    }
}
