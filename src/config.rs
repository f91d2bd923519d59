//! Settings files: grid rows followed by solver-specific numeric lines
//!
//! ```text
//! 0001        <- grid rows: 0 empty, 1 reward, 2 penalty, 3 wall
//! 0302
//! 0000
//! 0.9         <- gamma
//! 0.01        <- epsilon (value iteration) / alpha (Q-learning)
//! 500         <- episode count (Q-learning only)
//! ```
//!
//! Lines are trimmed and blank lines are ignored. Grid rows are the leading
//! digit-only lines of equal width; the rest must be exactly the numeric
//! settings, so a dropped line is an error rather than a shifted value.
//! Everything is validated
//! here so that malformed files fail before any solving begins.

use std::{fmt::Display, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    gridworld::{Cell, Environment, Grid},
    q_learning::QLearningConfig,
    value_iteration::ValueIterationConfig,
};

fn read_settings(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        operation: format!("read settings file {}", path.display()),
        source,
    })
}

fn is_grid_row(line: &str) -> bool {
    line.chars().all(|c| Cell::from_digit(c).is_some())
}

/// Split `text` into a grid and the trailing setting lines named by `names`.
///
/// Grid rows are the leading lines made only of cell digits and as wide as
/// the first line; exactly one line per name must follow them.
fn split_settings<'a>(text: &'a str, names: &[&str]) -> Result<(Grid, Vec<&'a str>)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let width = lines.first().map_or(0, |line| line.chars().count());
    let grid_len = lines
        .iter()
        .take_while(|line| is_grid_row(line) && line.chars().count() == width)
        .count();
    let (grid_lines, settings) = lines.split_at(grid_len);

    if settings.len() > names.len() {
        // the surplus lines sit where grid rows belong; report them as such
        let excess = settings.len() - names.len();
        return Err(match Grid::from_rows(&lines[..grid_len + excess]) {
            Err(err) => err,
            Ok(_) => Error::invalid_config(format!(
                "expected {} setting lines ({}) after the grid, found {}",
                names.len(),
                names.join(", "),
                settings.len()
            )),
        });
    }
    if settings.len() < names.len() {
        return Err(Error::MissingSetting {
            name: names[settings.len()].to_string(),
        });
    }

    let grid = Grid::from_rows(grid_lines)?;
    Ok((grid, settings.to_vec()))
}

fn parse_setting<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| Error::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Contents of a value-iteration settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueIterationSettings {
    pub grid: Grid,
    pub gamma: f64,
    pub epsilon: f64,
}

impl ValueIterationSettings {
    const NAMES: [&'static str; 2] = ["gamma", "epsilon"];

    /// # Errors
    ///
    /// Fails on an empty or ragged grid, missing or non-numeric settings,
    /// and hyperparameters the solver would reject.
    pub fn parse(text: &str) -> Result<Self> {
        let (grid, values) = split_settings(text, &Self::NAMES)?;
        let settings = Self {
            grid,
            gamma: parse_setting("gamma", values[0])?,
            epsilon: parse_setting("epsilon", values[1])?,
        };
        settings.solver_config().validate()?;
        Environment::new(settings.grid.clone())?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&read_settings(path.as_ref())?)
    }

    pub fn environment(&self) -> Result<Environment> {
        Environment::new(self.grid.clone())
    }

    pub fn solver_config(&self) -> ValueIterationConfig {
        ValueIterationConfig::new(self.gamma, self.epsilon)
    }
}

/// Contents of a Q-learning settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningSettings {
    pub grid: Grid,
    pub gamma: f64,
    pub alpha: f64,
    pub episodes: usize,
}

impl QLearningSettings {
    const NAMES: [&'static str; 3] = ["gamma", "alpha", "episodes"];

    /// # Errors
    ///
    /// As for [`ValueIterationSettings::parse`]; additionally the episode
    /// count must be a positive integer.
    pub fn parse(text: &str) -> Result<Self> {
        let (grid, values) = split_settings(text, &Self::NAMES)?;
        let episodes: i64 = parse_setting("episodes", values[2])?;
        if episodes <= 0 {
            return Err(Error::InvalidSetting {
                name: "episodes".to_string(),
                value: values[2].to_string(),
                reason: "episode count must be positive".to_string(),
            });
        }

        let settings = Self {
            grid,
            gamma: parse_setting("gamma", values[0])?,
            alpha: parse_setting("alpha", values[1])?,
            episodes: parse_setting("episodes", values[2])?,
        };
        settings.solver_config().validate()?;
        Environment::new(settings.grid.clone())?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&read_settings(path.as_ref())?)
    }

    pub fn environment(&self) -> Result<Environment> {
        Environment::new(self.grid.clone())
    }

    /// Solver configuration with default exploration settings
    pub fn solver_config(&self) -> QLearningConfig {
        QLearningConfig::new(self.gamma, self.alpha, self.episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC_VI: &str = "0001\n0302\n0000\n0.9\n0.01\n";
    const CLASSIC_QL: &str = "0001\n0302\n0000\n0.9\n0.1\n500\n";

    #[test]
    fn test_parse_value_iteration_settings() {
        let settings = ValueIterationSettings::parse(CLASSIC_VI).unwrap();
        assert_eq!(settings.grid.rows(), 3);
        assert_eq!(settings.grid.cols(), 4);
        assert_eq!(settings.gamma, 0.9);
        assert_eq!(settings.epsilon, 0.01);
    }

    #[test]
    fn test_parse_q_learning_settings() {
        let settings = QLearningSettings::parse(CLASSIC_QL).unwrap();
        assert_eq!(settings.grid.rows(), 3);
        assert_eq!(settings.alpha, 0.1);
        assert_eq!(settings.episodes, 500);
        assert_eq!(settings.solver_config().initial_epsilon, 1.0);
    }

    #[test]
    fn test_whitespace_and_blank_lines_ignored() {
        let text = "  0001 \r\n0302\n\n0000\n 0.9\n0.01\n\n\n";
        let settings = ValueIterationSettings::parse(text).unwrap();
        assert_eq!(settings.grid.rows(), 3);
    }

    #[test]
    fn test_missing_settings_rejected() {
        let err = ValueIterationSettings::parse("0.9\n").unwrap_err();
        assert!(matches!(err, Error::MissingSetting { ref name } if name == "epsilon"));

        let err = ValueIterationSettings::parse("0.9\n0.01\n").unwrap_err();
        assert!(matches!(err, Error::EmptyGrid));
    }

    #[test]
    fn test_missing_value_iteration_line_rejected() {
        // epsilon dropped: the last grid row must not be read as gamma
        let err = ValueIterationSettings::parse("0001\n0302\n0000\n0.9\n").unwrap_err();
        assert!(matches!(err, Error::MissingSetting { ref name } if name == "epsilon"));
    }

    #[test]
    fn test_missing_q_learning_line_rejected() {
        // gamma dropped
        let err = QLearningSettings::parse("0001\n0302\n0000\n0.1\n500\n").unwrap_err();
        assert!(matches!(err, Error::MissingSetting { ref name } if name == "episodes"));

        let err = QLearningSettings::parse("0001\n0302\n0000\n500\n").unwrap_err();
        assert!(matches!(err, Error::MissingSetting { ref name } if name == "alpha"));
    }

    #[test]
    fn test_extra_setting_line_rejected() {
        let err = ValueIterationSettings::parse("0001\n0.9\n0.01\n0.5\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCellCharacter {
                character: '.',
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_digit_only_settings_follow_the_grid() {
        let settings = QLearningSettings::parse("0001\n0302\n0000\n0.9\n1\n1000\n").unwrap();
        assert_eq!(settings.grid.rows(), 3);
        assert_eq!(settings.alpha, 1.0);
        assert_eq!(settings.episodes, 1000);
    }

    #[test]
    fn test_non_numeric_setting_rejected() {
        let err = ValueIterationSettings::parse("01\n0.9\nsmall\n").unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { ref name, .. } if name == "epsilon"));
    }

    #[test]
    fn test_fractional_episode_count_rejected() {
        let err = QLearningSettings::parse("01\n0.9\n0.1\n2.5\n").unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { ref name, .. } if name == "episodes"));
    }

    #[test]
    fn test_non_positive_episode_count_rejected() {
        for count in ["0", "-3"] {
            let text = format!("01\n0.9\n0.1\n{count}\n");
            let err = QLearningSettings::parse(&text).unwrap_err();
            assert!(matches!(err, Error::InvalidSetting { ref name, .. } if name == "episodes"));
        }
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let err = ValueIterationSettings::parse("0001\n030\n0.9\n0.01\n").unwrap_err();
        assert!(matches!(err, Error::RaggedGrid { row: 1, .. }));
    }

    #[test]
    fn test_invalid_discount_rejected() {
        let err = ValueIterationSettings::parse("01\n1.0\n0.01\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = ValueIterationSettings::load("/nonexistent/gridmdp/settings.txt").unwrap_err();
        assert!(err.to_string().contains("settings.txt"));
    }
}
