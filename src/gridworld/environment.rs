//! Grid-world MDP: state encoding, rewards and the noisy transition model

use std::{collections::VecDeque, fmt};

use serde::{Deserialize, Serialize};

use super::{
    action::Action,
    grid::{Cell, Grid, Position},
};
use crate::error::{Error, Result};

/// Probability that the requested move is executed
pub const INTENDED_PROBABILITY: f64 = 0.8;

/// Probability of slipping into each perpendicular direction
pub const SLIP_PROBABILITY: f64 = 0.1;

/// Accumulated probability below which the self-loop entry is dropped
pub const ENTRY_PROBABILITY_EPSILON: f64 = 1e-12;

/// A grid cell encoded as its row-major index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(usize);

impl State {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distribution over destinations for one `(state, action)` pair.
///
/// Entries are ordered: the self-loop first (when it carries mass), then the
/// intended destination, then the perpendicular slips in [`Action::ALL`]
/// order. Zero-probability entries never appear and the total is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    entries: Vec<(State, f64)>,
}

impl TransitionOutcome {
    fn certain(state: State) -> Self {
        Self {
            entries: vec![(state, 1.0)],
        }
    }

    pub fn entries(&self) -> &[(State, f64)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(State, f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_probability(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Probability mass assigned to `state` (zero when absent)
    pub fn probability_of(&self, state: State) -> f64 {
        self.entries
            .iter()
            .filter(|(s, _)| *s == state)
            .map(|(_, p)| p)
            .sum()
    }

    /// Destination whose cumulative-probability interval contains `draw`.
    ///
    /// Floating error can leave a draw just above the final cumulative sum;
    /// the last entry is returned in that case.
    pub fn sample(&self, draw: f64) -> State {
        let mut cumulative = 0.0;
        for &(state, probability) in &self.entries {
            cumulative += probability;
            if draw < cumulative {
                return state;
            }
        }
        self.entries
            .last()
            .map(|&(state, _)| state)
            .expect("transition outcome always has at least one entry")
    }
}

impl<'a> IntoIterator for &'a TransitionOutcome {
    type Item = &'a (State, f64);
    type IntoIter = std::slice::Iter<'a, (State, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The grid world as an MDP.
///
/// Immutable once built; solvers borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvironmentFields")]
pub struct Environment {
    grid: Grid,
    start: State,
}

#[derive(Deserialize)]
struct EnvironmentFields {
    grid: Grid,
    start: State,
}

impl TryFrom<EnvironmentFields> for Environment {
    type Error = Error;

    fn try_from(fields: EnvironmentFields) -> Result<Self> {
        let env = Self::new(fields.grid)?;
        if env.start != fields.start {
            return Err(Error::invalid_config(format!(
                "start state {} is not the bottom-left cell {}",
                fields.start, env.start
            )));
        }
        Ok(env)
    }
}

impl Environment {
    /// Wrap a grid. The agent always starts in the bottom-left corner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StartOnWall`] if the bottom-left cell is a wall.
    pub fn new(grid: Grid) -> Result<Self> {
        let start = State::new((grid.rows() - 1) * grid.cols());
        if grid.cells()[start.index()].is_wall() {
            return Err(Error::StartOnWall);
        }
        Ok(Self { grid, start })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn num_states(&self) -> usize {
        self.grid.len()
    }

    /// Every state, walls included, in index order
    pub fn states(&self) -> impl Iterator<Item = State> {
        (0..self.num_states()).map(State::new)
    }

    /// States the agent can occupy (everything except walls)
    pub fn occupiable_states(&self) -> impl Iterator<Item = State> {
        self.states().filter(|&s| !self.is_wall(s))
    }

    pub fn start(&self) -> State {
        self.start
    }

    /// Start a new episode
    pub fn reset(&self) -> State {
        self.start
    }

    /// # Panics
    ///
    /// Panics if `state` is outside the grid.
    pub fn position_of(&self, state: State) -> Position {
        assert!(
            state.index() < self.num_states(),
            "state {state} is outside a {}x{} grid",
            self.rows(),
            self.cols()
        );
        Position::new(state.index() / self.cols(), state.index() % self.cols())
    }

    /// # Panics
    ///
    /// Panics if `position` is outside the grid.
    pub fn state_of(&self, position: Position) -> State {
        assert!(
            position.row < self.rows() && position.col < self.cols(),
            "position {position} is outside a {}x{} grid",
            self.rows(),
            self.cols()
        );
        State::new(position.row * self.cols() + position.col)
    }

    pub fn cell(&self, state: State) -> Cell {
        match self.grid.cells().get(state.index()) {
            Some(&cell) => cell,
            None => panic!(
                "state {state} is outside a {}x{} grid",
                self.rows(),
                self.cols()
            ),
        }
    }

    pub fn is_wall(&self, state: State) -> bool {
        self.cell(state).is_wall()
    }

    pub fn is_terminal(&self, state: State) -> bool {
        self.cell(state).is_terminal()
    }

    /// Reward for entering `state`.
    ///
    /// # Panics
    ///
    /// Walls are never occupied, so asking for their reward means the
    /// transition model is broken; this panics instead of returning a sentinel.
    pub fn reward(&self, state: State) -> f64 {
        match self.cell(state).reward() {
            Some(reward) => reward,
            None => panic!(
                "reward requested for wall cell {} (state {state})",
                self.position_of(state)
            ),
        }
    }

    /// Destination of `action` if it succeeds; blocked moves stay put
    pub fn intended_next(&self, state: State, action: Action) -> State {
        let position = self.position_of(state);
        let (dr, dc) = action.delta();
        let target = position
            .row
            .checked_add_signed(dr)
            .zip(position.col.checked_add_signed(dc))
            .map(|(row, col)| Position::new(row, col));

        match target.and_then(|p| self.grid.get(p).map(|cell| (p, cell))) {
            Some((p, cell)) if !cell.is_wall() => self.state_of(p),
            _ => state,
        }
    }

    /// Noisy outcome of attempting `action` in `state`.
    ///
    /// The requested move succeeds with probability 0.8 and each
    /// perpendicular slip happens with probability 0.1. Blocked sub-moves
    /// add their mass to the self-loop. Terminal states are absorbing.
    ///
    /// # Panics
    ///
    /// Panics if `state` is a wall.
    pub fn transition_distribution(&self, state: State, action: Action) -> TransitionOutcome {
        assert!(
            !self.is_wall(state),
            "transition requested from wall cell {}",
            self.position_of(state)
        );
        if self.is_terminal(state) {
            return TransitionOutcome::certain(state);
        }

        let [slip_a, slip_b] = action.perpendicular();
        let mut stay = 0.0;
        let mut moves = Vec::with_capacity(3);
        for (sub_action, probability) in [
            (action, INTENDED_PROBABILITY),
            (slip_a, SLIP_PROBABILITY),
            (slip_b, SLIP_PROBABILITY),
        ] {
            let next = self.intended_next(state, sub_action);
            if next == state {
                stay += probability;
            } else {
                assert!(!self.is_wall(next), "transition entered wall state {next}");
                moves.push((next, probability));
            }
        }

        let mut entries = Vec::with_capacity(moves.len() + 1);
        if stay >= ENTRY_PROBABILITY_EPSILON {
            entries.push((state, stay));
        }
        entries.extend(moves);
        TransitionOutcome { entries }
    }

    /// Draw a destination from `outcome` given a uniform `draw` in `[0, 1)`
    pub fn sample(&self, outcome: &TransitionOutcome, draw: f64) -> State {
        outcome.sample(draw)
    }

    /// Whether some terminal cell can be reached from `from` by successful moves
    pub fn terminal_reachable_from(&self, from: State) -> bool {
        let mut seen = vec![false; self.num_states()];
        let mut queue = VecDeque::from([from]);
        seen[from.index()] = true;

        while let Some(state) = queue.pop_front() {
            if self.is_terminal(state) {
                return true;
            }
            for action in Action::ALL {
                let next = self.intended_next(state, action);
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> Environment {
        Environment::new("0001\n0302\n0000".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_state_position_bijection() {
        let env = classic();
        for state in env.states() {
            assert_eq!(env.state_of(env.position_of(state)), state);
        }
        assert_eq!(env.state_of(Position::new(1, 2)), State::new(6));
        assert_eq!(env.start(), State::new(8));
        assert_eq!(env.reset(), State::new(8));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_position_of_out_of_range_panics() {
        classic().position_of(State::new(12));
    }

    #[test]
    #[should_panic(expected = "wall")]
    fn test_reward_of_wall_panics() {
        classic().reward(State::new(5));
    }

    #[test]
    fn test_rewards_follow_cell_kind() {
        let env = classic();
        assert_eq!(env.reward(State::new(0)), -0.04);
        assert_eq!(env.reward(State::new(3)), 1.0);
        assert_eq!(env.reward(State::new(7)), -1.0);
    }

    #[test]
    fn test_intended_next_bounces_off_walls_and_edges() {
        let env = classic();
        // (1,0) moving right would enter the wall at (1,1)
        assert_eq!(env.intended_next(State::new(4), Action::Right), State::new(4));
        // (0,0) moving up leaves the grid
        assert_eq!(env.intended_next(State::new(0), Action::Up), State::new(0));
        assert_eq!(env.intended_next(State::new(0), Action::Right), State::new(1));
        assert_eq!(env.intended_next(State::new(8), Action::Up), State::new(4));
    }

    #[test]
    fn test_distributions_are_normalized_and_avoid_walls() {
        let env = classic();
        for state in env.occupiable_states() {
            for action in Action::ALL {
                let outcome = env.transition_distribution(state, action);
                assert!((outcome.total_probability() - 1.0).abs() < 1e-9);
                for &(next, p) in &outcome {
                    assert!(p > 0.0);
                    assert!(!env.is_wall(next));
                }
            }
        }
    }

    #[test]
    fn test_blocked_moves_accumulate_on_self_loop() {
        let env = classic();
        // (0,0) moving up: intended blocked (0.8), left blocked (0.1), right ok (0.1)
        let outcome = env.transition_distribution(State::new(0), Action::Up);
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.entries()[0].0, State::new(0));
        assert!((outcome.entries()[0].1 - 0.9).abs() < 1e-12);
        assert!((outcome.probability_of(State::new(1)) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_unblocked_move_has_no_self_loop() {
        let env = classic();
        // (2,2) moving down leaves the grid
        let outcome = env.transition_distribution(State::new(10), Action::Down);
        assert!((outcome.probability_of(State::new(10)) - 0.8).abs() < 1e-12);

        let outcome = env.transition_distribution(State::new(2), Action::Down);
        assert_eq!(outcome.probability_of(State::new(2)), 0.0);
        assert_eq!(
            outcome.entries(),
            &[
                (State::new(6), INTENDED_PROBABILITY),
                (State::new(1), SLIP_PROBABILITY),
                (State::new(3), SLIP_PROBABILITY),
            ]
        );
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let env = classic();
        for action in Action::ALL {
            let outcome = env.transition_distribution(State::new(3), action);
            assert_eq!(outcome.entries(), &[(State::new(3), 1.0)]);
        }
    }

    #[test]
    fn test_two_cell_example_distribution() {
        let env = Environment::new("01".parse().unwrap()).unwrap();
        let outcome = env.transition_distribution(State::new(0), Action::Right);
        assert_eq!(outcome.len(), 2);
        assert!((outcome.probability_of(State::new(0)) - 0.2).abs() < 1e-12);
        assert!((outcome.probability_of(State::new(1)) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_sample_picks_interval_containing_draw() {
        let env = classic();
        let outcome = env.transition_distribution(State::new(2), Action::Down);
        assert_eq!(env.sample(&outcome, 0.0), State::new(6));
        assert_eq!(env.sample(&outcome, 0.79), State::new(6));
        assert_eq!(env.sample(&outcome, 0.8), State::new(1));
        assert_eq!(env.sample(&outcome, 0.85), State::new(1));
        assert_eq!(env.sample(&outcome, 0.95), State::new(3));
        // floating error past the final boundary falls back to the last entry
        assert_eq!(env.sample(&outcome, 1.0), State::new(3));
    }

    #[test]
    fn test_start_on_wall_rejected() {
        let grid: Grid = "01\n30".parse().unwrap();
        assert!(matches!(Environment::new(grid), Err(Error::StartOnWall)));
    }

    #[test]
    fn test_deserialize_rechecks_start_cell() {
        let env = classic();
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(serde_json::from_str::<Environment>(&json).unwrap(), env);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["start"] = serde_json::json!(0);
        assert!(serde_json::from_value::<Environment>(value).is_err());

        // bottom-left wall smuggled in through the cell list
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["grid"]["cells"][8] = serde_json::json!("Wall");
        assert!(serde_json::from_value::<Environment>(value).is_err());
    }

    #[test]
    fn test_terminal_reachability() {
        let env = classic();
        assert!(env.terminal_reachable_from(env.start()));

        let sealed = Environment::new("1300\n3000\n0000".parse().unwrap()).unwrap();
        assert!(!sealed.terminal_reachable_from(sealed.start()));
    }
}
