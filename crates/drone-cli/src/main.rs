//! Drone CLI - run and inspect the four-operator FM drone synthesizer.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drone")]
#[command(author, version, about = "Four-operator FM drone synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the synth on a frame clock, optionally switching algorithms midway
    Run(commands::run::RunArgs),

    /// Build an algorithm and print the resulting routing graph
    Inspect(commands::inspect::InspectArgs),

    /// List and manage routing algorithms
    Algorithms(commands::algorithms::AlgorithmsArgs),

    /// Show or initialize the settings file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Algorithms(args) => commands::algorithms::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
