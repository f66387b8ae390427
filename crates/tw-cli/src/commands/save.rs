use miette::{IntoDiagnostic, Result};

use super::WorldArgs;

pub fn run(args: &WorldArgs) -> Result<()> {
    let world = super::load_world(&args.world)?;
    let session = super::open_session(args, world)?;

    let path = session.save().into_diagnostic()?;
    println!("  Saved game '{}' to {}", session.game(), path.display());

    Ok(())
}
