use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use miette::{Result, miette};
use tw_core::{Entity, WorldState};

use super::WorldArgs;

pub fn run(args: &WorldArgs, name: Option<&str>) -> Result<()> {
    let world = super::load_world(&args.world)?;

    match name {
        Some(name) => {
            let entity = world
                .find_by_name(name)
                .ok_or_else(|| miette!("entity not found: \"{name}\""))?;
            show_entity(&world, entity);
        }
        None => show_world(&world),
    }
    Ok(())
}

fn show_world(world: &WorldState) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Attribute", "Value"]);
    for (key, value) in world.attributes() {
        table.add_row(vec![key.clone(), world.describe_value(value)]);
    }
    println!("{table}");
    println!();

    let mut entities: Vec<&Entity> = world.entities().collect();
    if entities.is_empty() {
        println!("  No entities.");
        return;
    }
    entities.sort_by_key(|e| e.name.to_lowercase());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Kind", "Properties"]);
    for entity in &entities {
        table.add_row(vec![
            entity.name.clone(),
            entity.kind.to_string(),
            entity.properties.len().to_string(),
        ]);
    }
    println!("{table}");
    println!();
    println!("  {} entities", entities.len());
}

fn show_entity(world: &WorldState, entity: &Entity) {
    println!("  {} [{}]", entity.name.bold(), entity.kind.to_string().dimmed());
    println!();

    if entity.properties.is_empty() {
        println!("  (no properties)");
        return;
    }
    let width = entity.properties.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in &entity.properties {
        println!("  {key:<width$}  {}", world.describe_value(value));
    }
}
