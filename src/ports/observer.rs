//! Observer port - abstraction for solver observation and tracing
//!
//! Solvers report structured events through this trait instead of writing
//! to the console or to files themselves. Observers are read-only: they see
//! each value snapshot or transition after it has been computed and can not
//! influence the numbers the solvers produce.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    gridworld::{Action, State},
    types::{Policy, ValueFunction},
};

/// One synchronous value-iteration round.
///
/// Round 0 is the all-zero initial table with a delta of 0.
#[derive(Debug, Clone, Copy)]
pub struct SweepEvent<'a> {
    pub iteration: usize,
    pub delta: f64,
    pub values: &'a ValueFunction,
}

/// One simulated Q-learning transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub episode: usize,
    pub step: usize,
    pub state: State,
    pub action: Action,
    /// Whether the action was chosen at random
    pub explored: bool,
    pub reward: f64,
    pub next_state: State,
    /// Exploration rate after this step's decay
    pub epsilon: f64,
}

/// Totals for a finished Q-learning episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    /// Undiscounted sum of rewards collected
    pub total_reward: f64,
    pub final_state: State,
    /// False when the step cap cut the episode short
    pub reached_terminal: bool,
}

/// Observer trait for monitoring the solvers
///
/// # Event Sequence
///
/// Value iteration:
/// 1. `on_sweep` for round 0 and after every round
/// 2. `on_converged(rounds, delta)` once the stopping rule holds
/// 3. `on_policy(policy)` after greedy policy extraction
///
/// Q-learning:
/// 1. `on_training_start(total_episodes)`
/// 2. For each episode: `on_episode_start`, `on_step` per transition,
///    `on_episode_end`
/// 3. `on_policy(policy)` with the final greedy policy
/// 4. `on_training_end()`
///
/// # Examples
///
/// ```no_run
/// use gridmdp::ports::{EpisodeSummary, Observer};
///
/// struct StepCounter {
///     steps: usize,
/// }
///
/// impl Observer for StepCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> gridmdp::Result<()> {
///         self.steps += summary.steps;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called with every value-iteration round, including the initial one.
    fn on_sweep(&mut self, _event: &SweepEvent<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once value iteration has met its stopping rule.
    fn on_converged(&mut self, _rounds: usize, _delta: f64) -> Result<()> {
        Ok(())
    }

    /// Called with a freshly extracted or learned policy.
    fn on_policy(&mut self, _policy: &Policy) -> Result<()> {
        Ok(())
    }

    /// Called once before the first Q-learning episode.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the Q-value update of each simulated transition.
    fn on_step(&mut self, _event: &StepEvent) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called once after the last episode.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
        (**self).on_sweep(event)
    }

    fn on_converged(&mut self, rounds: usize, delta: f64) -> Result<()> {
        (**self).on_converged(rounds, delta)
    }

    fn on_policy(&mut self, policy: &Policy) -> Result<()> {
        (**self).on_policy(policy)
    }

    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        (**self).on_training_start(total_episodes)
    }

    fn on_episode_start(&mut self, episode: usize) -> Result<()> {
        (**self).on_episode_start(episode)
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        (**self).on_step(event)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        (**self).on_episode_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        (**self).on_training_end()
    }
}
