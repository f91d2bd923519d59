//! Synchronous value-iteration solver

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{StoppingRule, ValueIterationConfig};
use crate::{
    Result,
    gridworld::{Action, Environment, State},
    ports::{Observer, SweepEvent},
    types::{Policy, ValueFunction},
};

/// Outcome of a full value-iteration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueIterationReport {
    /// Number of backup rounds performed
    pub rounds: usize,
    /// Delta of the final round
    pub final_delta: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub stopping: StoppingRule,
    pub values: ValueFunction,
    pub policy: Policy,
}

/// Value iteration over a borrowed [`Environment`].
///
/// Walls and terminal states keep a value of 0: walls are never occupied and
/// nothing is collected after entering an absorbing cell. Their policy
/// entries stay undefined.
#[derive(Debug, Clone)]
pub struct ValueIterationSolver<'env> {
    env: &'env Environment,
    config: ValueIterationConfig,
    values: ValueFunction,
    policy: Policy,
    rounds: usize,
    last_delta: f64,
}

impl<'env> ValueIterationSolver<'env> {
    /// # Errors
    ///
    /// Fails if the configuration does not validate (e.g. `γ ≥ 1`).
    pub fn new(env: &'env Environment, config: ValueIterationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            env,
            config,
            values: ValueFunction::zeros(env.num_states()),
            policy: Policy::undefined(env.num_states()),
            rounds: 0,
            last_delta: 0.0,
        })
    }

    pub fn environment(&self) -> &'env Environment {
        self.env
    }

    pub fn config(&self) -> &ValueIterationConfig {
        &self.config
    }

    pub fn values(&self) -> &ValueFunction {
        &self.values
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Discard previous results so the solver can run again
    pub fn reset(&mut self) {
        self.values = ValueFunction::zeros(self.env.num_states());
        self.policy = Policy::undefined(self.env.num_states());
        self.rounds = 0;
        self.last_delta = 0.0;
    }

    fn is_backed_up(&self, state: State) -> bool {
        !self.env.is_wall(state) && !self.env.is_terminal(state)
    }

    /// One-step lookahead `Σ p·(r(s') + γ·V(s'))` against `values`
    fn lookahead(&self, values: &ValueFunction, state: State, action: Action) -> f64 {
        self.env
            .transition_distribution(state, action)
            .iter()
            .map(|&(next, p)| p * (self.env.reward(next) + self.config.gamma * values[next]))
            .sum()
    }

    /// Best action by lookahead; on exact ties the earlier action in
    /// [`Action::ALL`] is kept.
    fn best_action(&self, values: &ValueFunction, state: State) -> (Action, f64) {
        let mut best = (Action::ALL[0], f64::NEG_INFINITY);
        for action in Action::ALL {
            let value = self.lookahead(values, state, action);
            if value > best.1 {
                best = (action, value);
            }
        }
        best
    }

    /// Lookahead value of every action from `state` under the current table.
    ///
    /// # Panics
    ///
    /// Panics if `state` is a wall.
    pub fn q_values(&self, state: State) -> [f64; 4] {
        Action::ALL.map(|action| self.lookahead(&self.values, state, action))
    }

    /// Largest `|V(s) − max_a lookahead(s, a)|` over backed-up states
    pub fn bellman_residual(&self) -> f64 {
        self.env
            .states()
            .filter(|&s| self.is_backed_up(s))
            .map(|s| (self.values.get(s) - self.best_action(&self.values, s).1).abs())
            .fold(0.0, f64::max)
    }

    /// One synchronous round: a fresh table computed purely from the current one
    fn sweep(&self) -> (ValueFunction, f64) {
        let mut next = ValueFunction::zeros(self.env.num_states());
        for state in self.env.states().filter(|&s| self.is_backed_up(s)) {
            let (_, value) = self.best_action(&self.values, state);
            next.set(state, value);
        }
        let delta = next.l1_distance(&self.values);
        (next, delta)
    }

    /// Back up until the stopping rule holds; returns the number of rounds.
    pub fn run(&mut self, observer: &mut dyn Observer) -> Result<usize> {
        let threshold = self.config.threshold();
        observer.on_sweep(&SweepEvent {
            iteration: self.rounds,
            delta: self.last_delta,
            values: &self.values,
        })?;

        loop {
            let (next, delta) = self.sweep();
            self.values = next;
            self.rounds += 1;
            self.last_delta = delta;
            debug!(round = self.rounds, delta, threshold, "value iteration sweep");
            observer.on_sweep(&SweepEvent {
                iteration: self.rounds,
                delta,
                values: &self.values,
            })?;
            if delta < threshold {
                break;
            }
        }

        info!(
            rounds = self.rounds,
            delta = self.last_delta,
            stopping = %self.config.stopping,
            "value iteration converged"
        );
        observer.on_converged(self.rounds, self.last_delta)?;
        Ok(self.rounds)
    }

    /// Greedy policy with respect to the current value table
    pub fn compute_policy(&mut self, observer: &mut dyn Observer) -> Result<&Policy> {
        let mut policy = Policy::undefined(self.env.num_states());
        for state in self.env.states().filter(|&s| self.is_backed_up(s)) {
            let (action, _) = self.best_action(&self.values, state);
            policy.set(state, Some(action));
        }
        self.policy = policy;
        observer.on_policy(&self.policy)?;
        Ok(&self.policy)
    }

    /// Run to convergence and extract the policy
    pub fn solve(&mut self, observer: &mut dyn Observer) -> Result<ValueIterationReport> {
        self.reset();
        self.run(observer)?;
        self.compute_policy(observer)?;
        Ok(ValueIterationReport {
            rounds: self.rounds,
            final_delta: self.last_delta,
            gamma: self.config.gamma,
            epsilon: self.config.epsilon,
            stopping: self.config.stopping,
            values: self.values.clone(),
            policy: self.policy.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::NoopObserver;

    fn env(layout: &str) -> Environment {
        Environment::new(layout.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_two_cell_closed_form() {
        let env = env("01");
        let config = ValueIterationConfig::new(0.9, 1e-8);
        let mut solver = ValueIterationSolver::new(&env, config).unwrap();
        let report = solver.solve(&mut NoopObserver).unwrap();

        // V = 0.8·(1 + 0.9·0) + 0.2·(−0.04 + 0.9·V)
        let expected = 0.792 / 0.82;
        assert!((report.values.get(State::new(0)) - expected).abs() < 1e-7);
        assert_eq!(report.values.get(State::new(1)), 0.0);
        assert_eq!(report.policy.get(State::new(0)), Some(Action::Right));
        assert_eq!(report.policy.get(State::new(1)), None);
    }

    #[derive(Default)]
    struct Snapshots(Vec<(f64, ValueFunction)>);

    impl Observer for Snapshots {
        fn on_sweep(&mut self, event: &SweepEvent<'_>) -> Result<()> {
            self.0.push((event.delta, event.values.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_delta_is_l1_change_between_rounds() {
        let env = env("0001\n0302\n0000");
        let mut solver =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.9, 1e-3)).unwrap();
        let mut snapshots = Snapshots::default();
        solver.solve(&mut snapshots).unwrap();

        assert_eq!(snapshots.0.len(), solver.rounds() + 1);
        assert_eq!(snapshots.0[0].0, 0.0);
        for pair in snapshots.0.windows(2) {
            let (_, previous) = &pair[0];
            let (delta, current) = &pair[1];
            assert_eq!(*delta, current.l1_distance(previous));
        }
        // first round from zeros: 0.8 into the +1 exit, each slip pays the step cost
        assert!((snapshots.0[1].1[State::new(2)] - 0.792).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_discount_of_one() {
        let env = env("01");
        assert!(ValueIterationSolver::new(&env, ValueIterationConfig::new(1.0, 0.01)).is_err());
    }

    #[test]
    fn test_classic_grid_policy() {
        let env = env("0001\n0302\n0000");
        let mut solver =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.9, 1e-4)).unwrap();
        let report = solver.solve(&mut NoopObserver).unwrap();

        for state in [0, 1, 2] {
            assert_eq!(report.policy.get(State::new(state)), Some(Action::Right));
        }
        assert_eq!(report.policy.get(State::new(4)), Some(Action::Up));
        assert_eq!(report.policy.get(State::new(8)), Some(Action::Up));
        // wall and terminals
        for state in [3, 5, 7] {
            assert_eq!(report.policy.get(State::new(state)), None);
            assert_eq!(report.values.get(State::new(state)), 0.0);
        }
    }

    #[test]
    fn test_residual_within_epsilon() {
        let env = env("0001\n0302\n0000");
        let epsilon = 1e-3;
        let mut solver =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.95, epsilon)).unwrap();
        solver.solve(&mut NoopObserver).unwrap();
        assert!(solver.bellman_residual() < epsilon);
    }

    #[test]
    fn test_exact_ties_keep_first_action() {
        // every action from the lone cell is a pure self-loop
        let env = env("0");
        let mut solver =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.5, 1e-9)).unwrap();
        let report = solver.solve(&mut NoopObserver).unwrap();
        assert_eq!(report.policy.get(State::new(0)), Some(Action::Up));
        assert!((report.values.get(State::new(0)) - (-0.08)).abs() < 1e-8);
    }

    #[test]
    fn test_contraction_bound_is_stricter_than_absolute() {
        let env = env("0001\n0302\n0000");
        let mut contraction =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.9, 1e-3)).unwrap();
        let mut absolute = ValueIterationSolver::new(
            &env,
            ValueIterationConfig::new(0.9, 1e-3).with_stopping(StoppingRule::AbsoluteDelta),
        )
        .unwrap();

        let strict_rounds = contraction.run(&mut NoopObserver).unwrap();
        let loose_rounds = absolute.run(&mut NoopObserver).unwrap();
        assert!(strict_rounds > loose_rounds);
    }

    #[test]
    fn test_solve_is_repeatable() {
        let env = env("0001\n0302\n0000");
        let mut solver =
            ValueIterationSolver::new(&env, ValueIterationConfig::new(0.9, 1e-4)).unwrap();
        let first = solver.solve(&mut NoopObserver).unwrap();
        let second = solver.solve(&mut NoopObserver).unwrap();
        assert_eq!(first.rounds, second.rounds);
        assert_eq!(first.values, second.values);
        assert_eq!(first.policy, second.policy);
    }
}
