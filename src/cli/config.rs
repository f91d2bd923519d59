//! Shared configuration types for CLI commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::{
    gridworld::Environment,
    pipeline::{JsonlObserver, ObserverSet, ProgressObserver, TraceLogObserver},
};

/// Output options shared by both solver commands
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Append a plain-text trace of value snapshots and the final policy
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Write per-round / per-episode records as JSON Lines
    #[arg(long, value_name = "FILE")]
    pub jsonl: Option<PathBuf>,

    /// Write a JSON summary of the run
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Export the final table as CSV
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,
}

impl OutputArgs {
    /// Observers for every output this run asked for
    pub fn observers<'a>(&self, env: &Environment) -> Result<ObserverSet<'a>> {
        let mut observers = ObserverSet::new();
        if !self.no_progress {
            observers.push(Box::new(ProgressObserver::new()));
        }
        if let Some(path) = &self.trace {
            observers.push(Box::new(TraceLogObserver::append(env, path)?));
        }
        if let Some(path) = &self.jsonl {
            observers.push(Box::new(JsonlObserver::new(path)?));
        }
        Ok(observers)
    }
}
