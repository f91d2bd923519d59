//! Subcommands of the `gridmdp` binary

pub mod q_learning;
pub mod value_iteration;
