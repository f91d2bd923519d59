//! Value iteration: model-based dynamic programming on the grid-world MDP
//!
//! Starting from `V(s) = 0`, every round applies a synchronous Bellman
//! optimality backup using the previous round's table:
//!
//! ```text
//! V'(s) = max_a Σ_{s'} p(s'|s,a) · (r(s') + γ·V(s'))
//! ```
//!
//! and accumulates `Δ = Σ_s |V'(s) − V(s)|`. Iteration stops once `Δ` drops
//! below the threshold of the configured [`StoppingRule`]; the greedy
//! policy is then read off the converged table.
//!
//! ## Usage Example
//!
//! ```no_run
//! use gridmdp::{
//!     gridworld::Environment,
//!     pipeline::NoopObserver,
//!     value_iteration::{ValueIterationConfig, ValueIterationSolver},
//! };
//!
//! let env = Environment::new("0001\n0302\n0000".parse()?)?;
//! let mut solver = ValueIterationSolver::new(&env, ValueIterationConfig::new(0.9, 1e-4))?;
//! let report = solver.solve(&mut NoopObserver)?;
//! println!("converged after {} rounds", report.rounds);
//! # Ok::<(), gridmdp::Error>(())
//! ```

pub mod config;
pub mod solver;

pub use config::{StoppingRule, ValueIterationConfig};
pub use solver::{ValueIterationReport, ValueIterationSolver};
