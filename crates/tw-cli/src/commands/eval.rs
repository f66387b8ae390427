use miette::{IntoDiagnostic, Result, miette};
use tw_expr::diagnostics::{check_syntax, render_diagnostics};

use super::WorldArgs;

pub fn run(args: &WorldArgs, source: &str, update: bool) -> Result<()> {
    let diagnostics = check_syntax(source);
    if !diagnostics.is_empty() {
        eprint!("{}", render_diagnostics(source, "<expr>", &diagnostics));
        return Err(miette!(
            "{} syntax error{} in expression",
            diagnostics.len(),
            if diagnostics.len() == 1 { "" } else { "s" }
        ));
    }

    let mut world = super::load_world_or_new(&args.world)?;
    let value = args
        .config()
        .evaluator()
        .try_evaluate(&mut world, source)
        .into_diagnostic()?;

    println!("{}", world.describe_value(&value));

    if update {
        super::write_world(&args.world, &world, &args.game)?;
    }
    Ok(())
}
