//! Hyperparameters for Q-learning

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default initial exploration rate
pub const DEFAULT_INITIAL_EPSILON: f64 = 1.0;

/// Default per-step multiplicative decay of the exploration rate
pub const DEFAULT_EPSILON_DECAY: f64 = 0.99;

/// Configuration for [`super::QLearningSolver`]
///
/// # Examples
///
/// ```
/// use gridmdp::q_learning::QLearningConfig;
///
/// let config = QLearningConfig::new(0.9, 0.1, 500)
///     .with_initial_epsilon(0.5)
///     .with_epsilon_decay(0.995);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Discount factor γ in `[0, 1)`
    pub gamma: f64,
    /// Learning rate α in `(0, 1]`
    pub alpha: f64,
    /// Number of training episodes
    pub episodes: usize,
    /// Exploration rate at the start of training
    pub initial_epsilon: f64,
    /// Multiplier applied to ε after every action, across all episodes
    pub epsilon_decay: f64,
    /// Optional cap on the length of a single episode
    pub max_steps_per_episode: Option<usize>,
}

impl QLearningConfig {
    pub fn new(gamma: f64, alpha: f64, episodes: usize) -> Self {
        Self {
            gamma,
            alpha,
            episodes,
            initial_epsilon: DEFAULT_INITIAL_EPSILON,
            epsilon_decay: DEFAULT_EPSILON_DECAY,
            max_steps_per_episode: None,
        }
    }

    pub fn with_initial_epsilon(mut self, epsilon: f64) -> Self {
        self.initial_epsilon = epsilon;
        self
    }

    pub fn with_epsilon_decay(mut self, decay: f64) -> Self {
        self.epsilon_decay = decay;
        self
    }

    pub fn with_max_steps_per_episode(mut self, max_steps: usize) -> Self {
        self.max_steps_per_episode = Some(max_steps);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first offending
    /// hyperparameter.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(Error::invalid_config(format!(
                "discount factor must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::invalid_config(format!(
                "learning rate must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.episodes == 0 {
            return Err(Error::invalid_config("episode count must be positive"));
        }
        if !(0.0..=1.0).contains(&self.initial_epsilon) {
            return Err(Error::invalid_config(format!(
                "initial exploration rate must be in [0, 1], got {}",
                self.initial_epsilon
            )));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(Error::invalid_config(format!(
                "exploration decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(Error::invalid_config("step cap must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QLearningConfig::new(0.9, 0.1, 10);
        assert_eq!(config.initial_epsilon, 1.0);
        assert_eq!(config.epsilon_decay, 0.99);
        assert_eq!(config.max_steps_per_episode, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_hyperparameters() {
        assert!(QLearningConfig::new(1.0, 0.1, 10).validate().is_err());
        assert!(QLearningConfig::new(0.9, 0.0, 10).validate().is_err());
        assert!(QLearningConfig::new(0.9, 1.5, 10).validate().is_err());
        assert!(QLearningConfig::new(0.9, 0.1, 0).validate().is_err());
        assert!(
            QLearningConfig::new(0.9, 0.1, 10)
                .with_epsilon_decay(0.0)
                .validate()
                .is_err()
        );
        assert!(
            QLearningConfig::new(0.9, 0.1, 10)
                .with_initial_epsilon(1.2)
                .validate()
                .is_err()
        );
        assert!(
            QLearningConfig::new(0.9, 0.1, 10)
                .with_max_steps_per_episode(0)
                .validate()
                .is_err()
        );
    }
}
