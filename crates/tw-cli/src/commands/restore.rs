use miette::{IntoDiagnostic, Result};

use super::WorldArgs;

pub fn run(args: &WorldArgs) -> Result<()> {
    let world = super::load_world_or_new(&args.world)?;
    let mut session = super::open_session(args, world)?;

    // The world file is only rewritten once the snapshot merged cleanly.
    session.restore().into_diagnostic()?;
    super::write_world(&args.world, session.world(), session.game())?;

    println!(
        "  Restored game '{}' into {}",
        session.game(),
        args.world.display()
    );
    Ok(())
}
