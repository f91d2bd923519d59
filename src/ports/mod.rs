//! Ports (trait boundaries) between the solvers and their consumers.
//!
//! The solvers own these traits; presentation and tracing adapters in
//! [`crate::pipeline`] implement them.

pub mod observer;

pub use observer::{EpisodeSummary, Observer, StepEvent, SweepEvent};
