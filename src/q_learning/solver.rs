//! Episodic Q-learning solver
//!
//! The solver simulates episodes against the environment's transition model
//! and learns action values online. All randomness (exploration choices and
//! transition sampling) comes from the injected generator, consumed in a
//! fixed order per step:
//!
//! 1. after the first episode, one uniform draw for the ε test
//! 2. one index draw when the action is chosen at random
//! 3. one uniform draw to sample the successor state

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{config::QLearningConfig, q_table::QTable};
use crate::{
    Error, Result,
    gridworld::{Action, Environment, State},
    ports::{EpisodeSummary, Observer, StepEvent},
    types::Policy,
};

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QLearningReport {
    pub episodes: usize,
    /// Transitions simulated over all episodes
    pub total_steps: usize,
    /// Exploration rate left after the last decay
    pub final_epsilon: f64,
    pub q_table: QTable,
    /// Greedy policy derived from the final Q-table
    pub policy: Policy,
}

/// Q-learning over a borrowed [`Environment`] with an injected RNG
#[derive(Debug, Clone)]
pub struct QLearningSolver<'env, R = StdRng> {
    env: &'env Environment,
    config: QLearningConfig,
    q_table: QTable,
    /// Greedy policy refreshed as states are entered
    policy: Policy,
    epsilon: f64,
    total_steps: usize,
    rng: R,
}

impl<'env> QLearningSolver<'env, StdRng> {
    /// Solver driven by a `StdRng` seeded with `seed`
    pub fn seeded(env: &'env Environment, config: QLearningConfig, seed: u64) -> Result<Self> {
        Self::new(env, config, StdRng::seed_from_u64(seed))
    }
}

impl<'env, R: Rng> QLearningSolver<'env, R> {
    /// # Errors
    ///
    /// Fails if the configuration does not validate or if no terminal cell
    /// can be reached from the start state, in which case no episode could
    /// ever end.
    pub fn new(env: &'env Environment, config: QLearningConfig, rng: R) -> Result<Self> {
        config.validate()?;
        if !env.terminal_reachable_from(env.start()) {
            return Err(Error::invalid_config(
                "no reward or penalty cell is reachable from the start cell",
            ));
        }
        Ok(Self {
            env,
            config,
            q_table: QTable::new(env.num_states(), config.alpha, config.gamma),
            policy: Policy::undefined(env.num_states()),
            epsilon: config.initial_epsilon,
            total_steps: 0,
            rng,
        })
    }

    pub fn environment(&self) -> &'env Environment {
        self.env
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// The incrementally refreshed policy used for exploitation
    pub fn live_policy(&self) -> &Policy {
        &self.policy
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Clear learned values and restore the initial exploration rate.
    ///
    /// The generator is not reseeded; it keeps its position in the stream.
    pub fn reset(&mut self) {
        self.q_table.reset();
        self.policy = Policy::undefined(self.env.num_states());
        self.epsilon = self.config.initial_epsilon;
        self.total_steps = 0;
    }

    /// ε-greedy action selection; decays ε as a side effect.
    ///
    /// During the bootstrap episode every action is drawn uniformly.
    /// Returns the action and whether it was chosen at random.
    fn select_action(&mut self, state: State, bootstrap: bool) -> (Action, bool) {
        let explore = bootstrap || {
            let draw: f64 = self.rng.random();
            draw < self.epsilon || self.policy.get(state).is_none()
        };

        let action = match self.policy.get(state) {
            Some(action) if !explore => action,
            _ => Action::ALL[self.rng.random_range(0..Action::ALL.len())],
        };

        self.epsilon *= self.config.epsilon_decay;
        (action, explore)
    }

    fn run_episode(
        &mut self,
        episode: usize,
        observer: &mut dyn Observer,
    ) -> Result<EpisodeSummary> {
        observer.on_episode_start(episode)?;

        let mut state = self.env.reset();
        let mut steps = 0;
        let mut total_reward = 0.0;

        while !self.env.is_terminal(state) {
            if self
                .config
                .max_steps_per_episode
                .is_some_and(|cap| steps >= cap)
            {
                break;
            }

            let (action, explored) = self.select_action(state, episode == 0);
            let outcome = self.env.transition_distribution(state, action);
            let draw: f64 = self.rng.random();
            let next_state = self.env.sample(&outcome, draw);
            let reward = self.env.reward(next_state);

            self.q_table
                .q_learning_update(state, action, reward, next_state);
            // The successor's row was just used as the bootstrap target.
            self.policy
                .set(next_state, self.q_table.greedy_action(next_state));

            observer.on_step(&StepEvent {
                episode,
                step: steps,
                state,
                action,
                explored,
                reward,
                next_state,
                epsilon: self.epsilon,
            })?;

            total_reward += reward;
            steps += 1;
            state = next_state;
        }

        self.total_steps += steps;
        let summary = EpisodeSummary {
            episode,
            steps,
            total_reward,
            final_state: state,
            reached_terminal: self.env.is_terminal(state),
        };
        debug!(
            episode,
            steps,
            total_reward,
            epsilon = self.epsilon,
            "episode finished"
        );
        observer.on_episode_end(&summary)?;
        Ok(summary)
    }

    /// Train from scratch for the configured number of episodes
    pub fn train(&mut self, observer: &mut dyn Observer) -> Result<QLearningReport> {
        self.reset();
        observer.on_training_start(self.config.episodes)?;

        for episode in 0..self.config.episodes {
            self.run_episode(episode, observer)?;
        }

        let policy = self.q_table.greedy_policy();
        observer.on_policy(&policy)?;
        observer.on_training_end()?;
        info!(
            episodes = self.config.episodes,
            total_steps = self.total_steps,
            final_epsilon = self.epsilon,
            "q-learning finished"
        );

        Ok(QLearningReport {
            episodes: self.config.episodes,
            total_steps: self.total_steps,
            final_epsilon: self.epsilon,
            q_table: self.q_table.clone(),
            policy,
        })
    }
}
