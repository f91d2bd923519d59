//! Stochastic grid world: geometry, rewards and the noisy transition model

pub mod action;
pub mod environment;
pub mod grid;

pub use action::Action;
pub use environment::{
    ENTRY_PROBABILITY_EPSILON, Environment, INTENDED_PROBABILITY, SLIP_PROBABILITY, State,
    TransitionOutcome,
};
pub use grid::{Cell, Grid, Position, STEP_COST};
