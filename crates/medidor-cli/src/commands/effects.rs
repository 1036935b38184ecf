//! Built-in effect listing command.

use clap::Args;

use crate::effects::CATALOG;

#[derive(Args)]
pub struct EffectsArgs {}

pub fn run(_args: EffectsArgs) -> anyhow::Result<()> {
    println!("Built-in effects (use with `medidor measure --effect <name>`):");
    for (name, description) in CATALOG {
        println!("  {name:<12} {description}");
    }
    Ok(())
}
