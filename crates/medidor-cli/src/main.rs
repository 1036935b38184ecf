//! Medidor CLI - offline driver for the medidor measurement engine.

mod commands;
mod effects;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medidor")]
#[command(author, version, about = "Audio measurement engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a measurement against a built-in effect
    Measure(commands::measure::MeasureArgs),

    /// Render a test stimulus to a WAV file
    Generate(commands::generate::GenerateArgs),

    /// List built-in effects usable as units under test
    Effects(commands::effects::EffectsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Effects(args) => commands::effects::run(args),
    }
}
