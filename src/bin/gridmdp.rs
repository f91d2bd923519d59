//! gridmdp CLI - Solve and learn stochastic grid worlds
//!
//! This CLI provides a unified interface for:
//! - Solving a grid world with value iteration
//! - Learning a grid world with tabular Q-learning
//!
//! Set `RUST_LOG=gridmdp=debug` for per-round and per-episode logging.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridmdp")]
#[command(version, about = "Value iteration and Q-learning on grid worlds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a grid world with value iteration
    ValueIteration(gridmdp::cli::commands::value_iteration::ValueIterationArgs),

    /// Learn a grid world with Q-learning
    QLearning(gridmdp::cli::commands::q_learning::QLearningArgs),
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ValueIteration(args) => gridmdp::cli::commands::value_iteration::execute(args),
        Commands::QLearning(args) => gridmdp::cli::commands::q_learning::execute(args),
    }
}
