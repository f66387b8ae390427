use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};
use tw_core::{Entity, EntityKind, Value, WorldState};

pub fn run(file: &Path, game: &str, force: bool) -> Result<()> {
    if file.exists() && !force {
        return Err(miette!(
            "{} already exists (use --force to overwrite)",
            file.display()
        ));
    }

    let world = starter_world()?;
    super::write_world(file, &world, game)?;

    println!("  Created world file {}", file.display());
    println!("  Try: tw -w {} expand \"{{intro}}\"", file.display());

    Ok(())
}

fn starter_world() -> Result<WorldState> {
    let mut world = WorldState::new();

    let cellar = world
        .add_entity(
            Entity::new(EntityKind::Room, "Cellar")
                .with_property("description", "A damp cellar that smells of old apples."),
        )
        .into_diagnostic()?;
    let lamp = world
        .add_entity(
            Entity::new(EntityKind::Item, "brass lamp")
                .with_property("location", cellar)
                .with_property("lit", false),
        )
        .into_diagnostic()?;
    world
        .set_property(cellar, "contents", Value::List(vec![Value::Ref(lamp)]))
        .into_diagnostic()?;

    world.set_attribute("here", cellar);
    world.set_attribute("score", 0);
    world.set_attribute("turns", 0);
    world.set_attribute(
        "intro",
        "You are in the {here}. {here.description} Score: {score}.",
    );

    Ok(world)
}
