//! Observer pattern for solver runs
//!
//! Observers allow composable data collection during solving without coupling
//! the algorithms to specific output formats.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    gridworld::Environment,
    ports::{EpisodeSummary, Observer, StepEvent, SweepEvent},
    render,
    types::Policy,
};

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Fans every event out to a list of observers, in insertion order.
///
/// Borrowed observers (`Box::new(&mut metrics)`) can be mixed with owned
/// ones, so results stay readable after the run.
#[derive(Default)]
pub struct ObserverSet<'a> {
    observers: Vec<Box<dyn Observer + 'a>>,
}

impl<'a> ObserverSet<'a> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer to the set
    pub fn with_observer(mut self, observer: Box<dyn Observer + 'a>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn push(&mut self, observer: Box<dyn Observer + 'a>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for ObserverSet<'_> {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_sweep(event))
    }

    fn on_converged(&mut self, rounds: usize, delta: f64) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.on_converged(rounds, delta))
    }

    fn on_policy(&mut self, policy: &Policy) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_policy(policy))
    }

    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.on_training_start(total_episodes))
    }

    fn on_episode_start(&mut self, episode: usize) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.on_episode_start(episode))
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_step(event))
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.on_episode_end(summary))
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_training_end())
    }
}

/// Progress bar observer - Shows solver progress
///
/// Q-learning gets a bar over episodes; value iteration gets a spinner
/// showing the current round and delta.
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    terminal_episodes: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            terminal_episodes: 0,
        }
    }

    fn spinner() -> Result<ProgressBar> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?,
        );
        Ok(pb)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        if self.progress_bar.is_none() {
            self.progress_bar = Some(Self::spinner()?);
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("round {} (delta {:.8})", event.iteration, event.delta));
            pb.tick();
        }
        Ok(())
    }

    fn on_converged(&mut self, rounds: usize, delta: f64) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(format!("converged after {rounds} rounds (delta {delta:.8})"));
        }
        Ok(())
    }

    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        self.terminal_episodes = 0;
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if summary.reached_terminal {
            self.terminal_episodes += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.episode as u64 + 1);
            pb.set_message(format!("last return {:.2}", summary.total_reward));
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(format!("{} reached a terminal", self.terminal_episodes));
        }
        Ok(())
    }
}

/// Metrics observer - Tracks convergence and episode statistics
#[derive(Debug, Default, Clone)]
pub struct MetricsObserver {
    deltas: Vec<f64>,
    rounds: Option<usize>,
    episode_lengths: Vec<usize>,
    episode_returns: Vec<f64>,
    terminal_episodes: usize,
    explored_steps: usize,
    total_steps: usize,
}

/// Summary of run metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub rounds: Option<usize>,
    pub final_delta: Option<f64>,
    pub episodes: usize,
    pub terminal_episodes: usize,
    pub total_steps: usize,
    pub exploration_rate: f64,
    pub avg_episode_length: f64,
    pub avg_return: f64,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Deltas of every backup round (round 0 excluded)
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn episode_lengths(&self) -> &[usize] {
        &self.episode_lengths
    }

    pub fn episode_returns(&self) -> &[f64] {
        &self.episode_returns
    }

    /// Fraction of steps whose action was chosen at random
    pub fn exploration_rate(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.explored_steps as f64 / self.total_steps as f64
        }
    }

    /// Mean undiscounted return over the trailing `window` episodes
    pub fn recent_return(&self, window: usize) -> f64 {
        let start = self.episode_returns.len().saturating_sub(window);
        let recent = &self.episode_returns[start..];
        if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let episodes = self.episode_lengths.len();
        MetricsSummary {
            rounds: self.rounds,
            final_delta: self.deltas.last().copied(),
            episodes,
            terminal_episodes: self.terminal_episodes,
            total_steps: self.total_steps,
            exploration_rate: self.exploration_rate(),
            avg_episode_length: if episodes == 0 {
                0.0
            } else {
                self.episode_lengths.iter().sum::<usize>() as f64 / episodes as f64
            },
            avg_return: self.recent_return(episodes),
        }
    }
}

impl Observer for MetricsObserver {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        if event.iteration > 0 {
            self.deltas.push(event.delta);
        }
        Ok(())
    }

    fn on_converged(&mut self, rounds: usize, _delta: f64) -> Result<()> {
        self.rounds = Some(rounds);
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        self.total_steps += 1;
        if event.explored {
            self.explored_steps += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episode_lengths.push(summary.steps);
        self.episode_returns.push(summary.total_reward);
        if summary.reached_terminal {
            self.terminal_episodes += 1;
        }
        Ok(())
    }
}

/// One value-iteration round as written by [`JsonlObserver`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRecord {
    pub iteration: usize,
    pub delta: f64,
    pub values: Vec<f64>,
}

/// One Q-learning episode as written by [`JsonlObserver`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    pub reached_terminal: bool,
    pub transitions: Vec<StepEvent>,
}

/// JSONL observer - Exports sweeps and episodes to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_steps: Vec<StepEvent>,
}

impl JsonlObserver {
    /// Create a new JSONL observer, truncating `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(|source| Error::Io {
            operation: format!("create {}", path.as_ref().display()),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            current_steps: Vec::new(),
        })
    }

    fn write_line<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }
}

impl Observer for JsonlObserver {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        self.write_line(&SweepRecord {
            iteration: event.iteration,
            delta: event.delta,
            values: event.values.as_slice().to_vec(),
        })
    }

    fn on_converged(&mut self, _rounds: usize, _delta: f64) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        self.current_steps.push(*event);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let record = EpisodeRecord {
            episode: summary.episode,
            steps: summary.steps,
            total_reward: summary.total_reward,
            reached_terminal: summary.reached_terminal,
            transitions: std::mem::take(&mut self.current_steps),
        };
        self.write_line(&record)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Append-only text trace of value snapshots and the final policy.
///
/// Each round is written as a rule, `Iteration c`, the value grid and
/// `Delta: …` with eight decimals.
pub struct TraceLogObserver {
    env: Environment,
    writer: BufWriter<File>,
}

impl TraceLogObserver {
    /// Open `path` for appending, creating it if needed
    pub fn append<P: AsRef<Path>>(env: &Environment, path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|source| Error::Io {
                operation: format!("open trace log {}", path.as_ref().display()),
                source,
            })?;
        Ok(Self {
            env: env.clone(),
            writer: BufWriter::new(file),
        })
    }

    fn rule(&mut self) -> Result<()> {
        write!(self.writer, "\n{}\n\n", "=".repeat(30))?;
        Ok(())
    }
}

impl Observer for TraceLogObserver {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        self.rule()?;
        write!(self.writer, "Iteration {}\n\n", event.iteration)?;
        self.writer
            .write_all(render::values(&self.env, event.values).as_bytes())?;
        writeln!(self.writer, "\nDelta: {:.8}", event.delta)?;
        Ok(())
    }

    fn on_policy(&mut self, policy: &Policy) -> Result<()> {
        self.rule()?;
        write!(self.writer, "Optimal policy\n\n")?;
        self.writer
            .write_all(render::policy(&self.env, policy).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
