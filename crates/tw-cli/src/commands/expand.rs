use miette::Result;

use super::WorldArgs;

pub fn run(args: &WorldArgs, text: &str, update: bool) -> Result<()> {
    let world = super::load_world_or_new(&args.world)?;
    let mut session = super::open_session(args, world)?;

    println!("{}", session.expand(text));

    if update {
        super::write_world(&args.world, session.world(), session.game())?;
    }
    Ok(())
}
