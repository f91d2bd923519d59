//! Hyperparameters and stopping rules for value iteration

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// When to stop iterating.
///
/// The two rules are not equivalent: for `γ = 0.9` the contraction bound is
/// nine times tighter than the plain delta test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingRule {
    /// Stop when `Δ < ε(1−γ)/γ`; the result is then within ε of optimal.
    #[default]
    ContractionBound,
    /// Stop when `Δ < ε`, matching older trace logs.
    AbsoluteDelta,
}

impl StoppingRule {
    /// Delta threshold for the given discount and tolerance
    pub fn threshold(self, gamma: f64, epsilon: f64) -> f64 {
        match self {
            StoppingRule::ContractionBound if gamma == 0.0 => f64::INFINITY,
            StoppingRule::ContractionBound => epsilon * (1.0 - gamma) / gamma,
            StoppingRule::AbsoluteDelta => epsilon,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoppingRule::ContractionBound => "contraction",
            StoppingRule::AbsoluteDelta => "absolute",
        }
    }
}

impl fmt::Display for StoppingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoppingRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contraction" | "contraction-bound" | "contraction_bound" => {
                Ok(StoppingRule::ContractionBound)
            }
            "absolute" | "absolute-delta" | "absolute_delta" => Ok(StoppingRule::AbsoluteDelta),
            _ => Err(Error::ParseStoppingRule {
                input: s.to_string(),
            }),
        }
    }
}

/// Configuration for [`super::ValueIterationSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueIterationConfig {
    /// Discount factor γ in `[0, 1)`
    pub gamma: f64,
    /// Target accuracy ε (> 0)
    pub epsilon: f64,
    pub stopping: StoppingRule,
}

impl ValueIterationConfig {
    pub fn new(gamma: f64, epsilon: f64) -> Self {
        Self {
            gamma,
            epsilon,
            stopping: StoppingRule::default(),
        }
    }

    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    /// Delta threshold implied by the stopping rule
    pub fn threshold(&self) -> f64 {
        self.stopping.threshold(self.gamma, self.epsilon)
    }

    /// # Errors
    ///
    /// Rejects `γ` outside `[0, 1)` (iteration would never stop) and
    /// non-positive or non-finite `ε`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(Error::invalid_config(format!(
                "discount factor must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::invalid_config(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
