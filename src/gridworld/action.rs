//! The closed set of agent actions

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A move the agent can attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in their canonical order.
    ///
    /// This order is load-bearing: greedy selection keeps the first action
    /// reaching the maximum, so exact ties resolve towards `Up`.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Position of the action in [`Action::ALL`]
    pub fn index(self) -> usize {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// Row/column offset of a successful move
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Action::Up | Action::Down)
    }

    /// The two directions the actuator may slip into
    pub fn perpendicular(self) -> [Action; 2] {
        if self.is_vertical() {
            [Action::Left, Action::Right]
        } else {
            [Action::Up, Action::Down]
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Action::Up => '↑',
            Action::Down => '↓',
            Action::Left => '←',
            Action::Right => '→',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Action::Up),
            "down" | "d" => Ok(Action::Down),
            "left" | "l" => Ok(Action::Left),
            "right" | "r" => Ok(Action::Right),
            _ => Err(Error::ParseAction {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert_eq!(Action::from_index(4), None);
    }

    #[test]
    fn test_perpendicular_directions() {
        assert_eq!(Action::Up.perpendicular(), [Action::Left, Action::Right]);
        assert_eq!(Action::Down.perpendicular(), [Action::Left, Action::Right]);
        assert_eq!(Action::Left.perpendicular(), [Action::Up, Action::Down]);
        assert_eq!(Action::Right.perpendicular(), [Action::Up, Action::Down]);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!("Up".parse::<Action>().unwrap(), Action::Up);
        assert_eq!(" right ".parse::<Action>().unwrap(), Action::Right);
        let err = "north".parse::<Action>().unwrap_err();
        assert!(matches!(err, Error::ParseAction { ref input } if input == "north"));
    }
}
