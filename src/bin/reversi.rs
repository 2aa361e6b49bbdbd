//! Reversi CLI - prepare transition tables and run agent tournaments
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`, e.g.
//! `RUST_LOG=reversi_agents=debug`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use reversi_agents::{
    app::AgentRegistry,
    cli::commands::{agents, play, prepare},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "reversi")]
#[command(version, about = "Reversi engine and learning agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate a board size and save its transition table
    Prepare(prepare::PrepareArgs),

    /// Play a tournament between two agents
    Play(Box<play::PlayArgs>),

    /// List the available agents
    Agents(agents::AgentsArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare(args) => prepare::execute(args),
        Commands::Play(args) => play::execute(*args),
        Commands::Agents(args) => agents::execute(args, &AgentRegistry::builtin()),
    }
}
