//! Solver outputs shared by both solvers and their consumers.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::gridworld::{Action, State};

/// Value estimate for every state, walls and terminals included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueFunction(Vec<f64>);

impl ValueFunction {
    /// All-zero value function over `num_states` states
    pub fn zeros(num_states: usize) -> Self {
        Self(vec![0.0; num_states])
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, state: State) -> f64 {
        self.0[state.index()]
    }

    pub fn set(&mut self, state: State, value: f64) {
        self.0[state.index()] = value;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Sum of absolute per-state differences
    pub fn l1_distance(&self, other: &ValueFunction) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

impl Index<State> for ValueFunction {
    type Output = f64;

    fn index(&self, state: State) -> &f64 {
        &self.0[state.index()]
    }
}

/// Action chosen per state; `None` until the solver has an answer for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy(Vec<Option<Action>>);

impl Policy {
    /// Policy with every entry undefined
    pub fn undefined(num_states: usize) -> Self {
        Self(vec![None; num_states])
    }

    pub fn get(&self, state: State) -> Option<Action> {
        self.0[state.index()]
    }

    pub fn set(&mut self, state: State, action: Option<Action>) {
        self.0[state.index()] = action;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of states with a defined action
    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|a| a.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (State, Option<Action>)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, a)| (State::new(i), *a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_function_distance() {
        let a = ValueFunction::from_vec(vec![0.0, 1.0, -2.0]);
        let b = ValueFunction::from_vec(vec![0.5, 1.0, -1.0]);
        assert!((a.l1_distance(&b) - 1.5).abs() < 1e-12);
        assert_eq!(a[State::new(2)], -2.0);
    }

    #[test]
    fn test_policy_starts_undefined() {
        let mut policy = Policy::undefined(3);
        assert_eq!(policy.defined_count(), 0);
        policy.set(State::new(1), Some(Action::Left));
        assert_eq!(policy.get(State::new(1)), Some(Action::Left));
        assert_eq!(policy.get(State::new(0)), None);
        assert_eq!(policy.defined_count(), 1);
    }
}
