//! Q-table implementation for temporal difference learning

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    gridworld::{Action, State},
    types::Policy,
};

/// Q-table mapping (state, action) pairs to Q-values
///
/// Dense storage: one row of four action values per state, all starting at 0.
/// Update counts are kept alongside so that states never acted from can be
/// told apart from states whose values happen to be zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QTableFields")]
pub struct QTable {
    values: Vec<[f64; 4]>,
    visits: Vec<[u64; 4]>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
}

#[derive(Deserialize)]
struct QTableFields {
    values: Vec<[f64; 4]>,
    visits: Vec<[u64; 4]>,
    learning_rate: f64,
    discount_factor: f64,
}

impl TryFrom<QTableFields> for QTable {
    type Error = Error;

    fn try_from(fields: QTableFields) -> crate::Result<Self> {
        if fields.values.len() != fields.visits.len() {
            return Err(Error::invalid_config(format!(
                "Q-table has {} value rows but {} visit rows",
                fields.values.len(),
                fields.visits.len()
            )));
        }
        Ok(Self {
            values: fields.values,
            visits: fields.visits,
            learning_rate: fields.learning_rate,
            discount_factor: fields.discount_factor,
        })
    }
}

impl QTable {
    /// Create a zero-initialised Q-table
    pub fn new(num_states: usize, learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            values: vec![[0.0; 4]; num_states],
            visits: vec![[0; 4]; num_states],
            learning_rate,
            discount_factor,
        }
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: State, action: Action) -> f64 {
        self.values[state.index()][action.index()]
    }

    /// Overwrite a Q-value without counting it as an update
    pub fn set(&mut self, state: State, action: Action, value: f64) {
        self.values[state.index()][action.index()] = value;
    }

    /// All four action values of a state in [`Action::ALL`] order
    pub fn row(&self, state: State) -> [f64; 4] {
        self.values[state.index()]
    }

    /// Number of TD updates applied to a state-action pair
    pub fn visits(&self, state: State, action: Action) -> u64 {
        self.visits[state.index()][action.index()]
    }

    /// Whether any action value of `state` has been updated
    pub fn is_visited(&self, state: State) -> bool {
        self.visits[state.index()].iter().any(|&n| n > 0)
    }

    /// Maximum Q-value over all actions in a state
    pub fn max_q(&self, state: State) -> f64 {
        self.values[state.index()]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued action, earliest in [`Action::ALL`] on ties.
    ///
    /// `None` for states that have never been acted from: their all-zero
    /// row carries no information.
    pub fn greedy_action(&self, state: State) -> Option<Action> {
        if !self.is_visited(state) {
            return None;
        }
        let row = &self.values[state.index()];
        let mut best = Action::ALL[0];
        for action in Action::ALL {
            if row[action.index()] > row[best.index()] {
                best = action;
            }
        }
        Some(best)
    }

    /// Greedy policy over every state
    pub fn greedy_policy(&self) -> Policy {
        let mut policy = Policy::undefined(self.values.len());
        for index in 0..self.values.len() {
            let state = State::new(index);
            policy.set(state, self.greedy_action(state));
        }
        policy
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Terminal successors are never acted from, so their row stays at zero
    /// and the bootstrap term vanishes on its own. Returns the TD error.
    pub fn q_learning_update(
        &mut self,
        state: State,
        action: Action,
        reward: f64,
        next_state: State,
    ) -> f64 {
        let current_q = self.get(state, action);
        let td_target = reward + self.discount_factor * self.max_q(next_state);
        let td_error = td_target - current_q;
        self.set(state, action, current_q + self.learning_rate * td_error);
        self.visits[state.index()][action.index()] += 1;
        td_error
    }

    /// Reset all Q-values and counts to zero
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|row| *row = [0.0; 4]);
        self.visits.iter_mut().for_each(|row| *row = [0; 4]);
    }

    /// Number of states covered by the table
    pub fn num_states(&self) -> usize {
        self.values.len()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}
