//! Observer adapters for the solvers
//!
//! This module provides composable sinks for:
//! - Progress reporting on the terminal
//! - Run metrics (deltas, episode lengths and returns)
//! - JSON Lines export of sweeps and episodes
//! - The append-only text trace log

pub mod observers;

pub use observers::{
    EpisodeRecord, JsonlObserver, MetricsObserver, MetricsSummary, NoopObserver, ObserverSet,
    ProgressObserver, SweepRecord, TraceLogObserver,
};

pub use crate::ports::Observer;
