//! Grid-world Markov decision processes
//!
//! This crate provides:
//! - A stochastic grid-world environment with slippery moves and terminal cells
//! - Value iteration over the known transition model
//! - Episodic Q-learning with ε-greedy exploration and a seedable RNG
//! - Observers for progress, metrics, JSON Lines and text trace output
//! - Settings-file parsing, rendering and CSV / MessagePack export

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod gridworld;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod render;
pub mod types;
pub mod value_iteration;

pub use error::{Error, Result};
pub use gridworld::{Action, Cell, Environment, Grid, Position, State, TransitionOutcome};
pub use q_learning::{QLearningConfig, QLearningReport, QLearningSolver, QTable};
pub use types::{Policy, ValueFunction};
pub use value_iteration::{
    StoppingRule, ValueIterationConfig, ValueIterationReport, ValueIterationSolver,
};
