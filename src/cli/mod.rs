//! CLI infrastructure for the grid-world solvers
//!
//! This module provides the command-line interface for solving a grid world
//! with value iteration or learning it with tabular Q-learning.

pub mod commands;
pub mod config;
pub mod output;
