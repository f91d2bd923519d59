//! Q-learning: model-free temporal difference control
//!
//! The agent learns action values from simulated episodes, never reading
//! the transition probabilities directly:
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α·(r + γ·max_a' Q(s',a') − Q(s,a))
//! ```
//!
//! Exploration is ε-greedy with a single multiplicative decay applied after
//! every action of the run. The first episode acts uniformly at random to
//! seed the table.
//!
//! ## Usage Example
//!
//! ```no_run
//! use gridmdp::{
//!     gridworld::Environment,
//!     pipeline::NoopObserver,
//!     q_learning::{QLearningConfig, QLearningSolver},
//! };
//!
//! let env = Environment::new("0001\n0302\n0000".parse()?)?;
//! let config = QLearningConfig::new(0.9, 0.1, 1000).with_epsilon_decay(0.999);
//! let mut solver = QLearningSolver::seeded(&env, config, 42)?;
//! let report = solver.train(&mut NoopObserver)?;
//! println!("{} steps simulated", report.total_steps);
//! # Ok::<(), gridmdp::Error>(())
//! ```

pub mod config;
pub mod q_table;
pub mod serialization;
pub mod solver;

// Public re-exports
pub use config::QLearningConfig;
pub use q_table::QTable;
pub use serialization::SavedQLearning;
pub use solver::{QLearningReport, QLearningSolver};
