//! Flappy CLI - train, evaluate and inspect tabular Q-learning agents
//!
//! Logging goes through `env_logger`; set `RUST_LOG=info` to see milestone
//! lines during training.

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flappy")]
#[command(version, about = "Tabular Q-learning for a side-scrolling game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent against the simulator
    Train(Box<flappy::cli::commands::train::TrainArgs>),

    /// Play greedy episodes with a learned table
    Evaluate(flappy::cli::commands::evaluate::EvaluateArgs),

    /// Export the policy map of a learned table
    Export(flappy::cli::commands::export::ExportArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => flappy::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => flappy::cli::commands::evaluate::execute(args),
        Commands::Export(args) => flappy::cli::commands::export::execute(args),
    }
}
