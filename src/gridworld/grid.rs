//! Grid cells and the immutable grid matrix

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reward for entering an empty cell; the small negative cost favours short paths.
pub const STEP_COST: f64 = -0.04;

/// A single cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Reward,
    Penalty,
    Wall,
}

impl Cell {
    /// Parse the digit encoding used by settings files (`0`-`3`)
    pub fn from_digit(c: char) -> Option<Cell> {
        match c {
            '0' => Some(Cell::Empty),
            '1' => Some(Cell::Reward),
            '2' => Some(Cell::Penalty),
            '3' => Some(Cell::Wall),
            _ => None,
        }
    }

    pub fn to_digit(self) -> char {
        match self {
            Cell::Empty => '0',
            Cell::Reward => '1',
            Cell::Penalty => '2',
            Cell::Wall => '3',
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Reward => 'R',
            Cell::Penalty => 'G',
            Cell::Wall => '#',
        }
    }

    /// Reward collected when the agent enters this cell.
    ///
    /// Walls can never be entered, so they have no reward.
    pub fn reward(self) -> Option<f64> {
        match self {
            Cell::Empty => Some(STEP_COST),
            Cell::Reward => Some(1.0),
            Cell::Penalty => Some(-1.0),
            Cell::Wall => None,
        }
    }

    /// Reward and penalty cells are absorbing
    pub fn is_terminal(self) -> bool {
        matches!(self, Cell::Reward | Cell::Penalty)
    }

    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }
}

/// Row/column coordinates of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Rectangular, non-empty matrix of cells stored in row-major order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridFields")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from rows of cells.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGrid`] when there are no rows or the first row is
    /// empty, and [`Error::RaggedGrid`] when row lengths differ.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(Error::EmptyGrid);
        }

        let num_rows = rows.len();
        let mut cells = Vec::with_capacity(num_rows * cols);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != cols {
                return Err(Error::RaggedGrid {
                    row,
                    expected: cols,
                    got: line.len(),
                });
            }
            cells.extend(line);
        }

        Ok(Self {
            rows: num_rows,
            cols,
            cells,
        })
    }

    /// Parse grid rows written as digit strings, one row per item
    pub fn from_rows<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rows = Vec::new();
        for (row, line) in lines.into_iter().enumerate() {
            let parsed = line
                .as_ref()
                .chars()
                .enumerate()
                .map(|(col, c)| {
                    Cell::from_digit(c).ok_or_else(|| Error::InvalidCellCharacter {
                        character: c,
                        row,
                        col,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(parsed);
        }
        Self::new(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, position: Position) -> Option<Cell> {
        if position.row < self.rows && position.col < self.cols {
            Some(self.cells[position.row * self.cols + position.col])
        } else {
            None
        }
    }

    /// Cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }
}

/// Serialized shape of a [`Grid`], checked before use
#[derive(Deserialize)]
struct GridFields {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl TryFrom<GridFields> for Grid {
    type Error = Error;

    fn try_from(fields: GridFields) -> Result<Self> {
        if fields.rows == 0 || fields.cols == 0 {
            return Err(Error::EmptyGrid);
        }
        if fields.cells.len() != fields.rows * fields.cols {
            return Err(Error::invalid_config(format!(
                "{}x{} grid holds {} cells",
                fields.rows,
                fields.cols,
                fields.cells.len()
            )));
        }
        Self::new(
            fields
                .cells
                .chunks(fields.cols)
                .map(<[Cell]>::to_vec)
                .collect(),
        )
    }
}

impl FromStr for Grid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_rows(s.lines().map(str::trim).filter(|line| !line.is_empty()))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line: String = self.row(row).iter().map(|c| c.to_digit()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digit_rows() {
        let grid: Grid = "0001\n0302\n0000".parse().unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.get(Position::new(0, 3)), Some(Cell::Reward));
        assert_eq!(grid.get(Position::new(1, 1)), Some(Cell::Wall));
        assert_eq!(grid.get(Position::new(1, 3)), Some(Cell::Penalty));
        assert_eq!(grid.get(Position::new(3, 0)), None);
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(matches!(Grid::new(vec![]), Err(Error::EmptyGrid)));
        assert!(matches!(Grid::new(vec![vec![]]), Err(Error::EmptyGrid)));
        assert!(matches!("".parse::<Grid>(), Err(Error::EmptyGrid)));
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let err = "000\n00".parse::<Grid>().unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedGrid {
                row: 1,
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_invalid_digit_rejected() {
        let err = "00\n04".parse::<Grid>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCellCharacter {
                character: '4',
                row: 1,
                col: 1
            }
        ));
    }

    #[test]
    fn test_wall_has_no_reward() {
        assert_eq!(Cell::Empty.reward(), Some(STEP_COST));
        assert_eq!(Cell::Reward.reward(), Some(1.0));
        assert_eq!(Cell::Penalty.reward(), Some(-1.0));
        assert_eq!(Cell::Wall.reward(), None);
    }

    #[test]
    fn test_deserialize_checks_dimensions() {
        let grid: Grid = "01\n23".parse().unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);

        let bad = r#"{"rows":5,"cols":2,"cells":["Empty","Reward"]}"#;
        assert!(serde_json::from_str::<Grid>(bad).is_err());
        let empty = r#"{"rows":0,"cols":0,"cells":[]}"#;
        assert!(serde_json::from_str::<Grid>(empty).is_err());
    }

    #[test]
    fn test_display_roundtrips_digits() {
        let grid: Grid = "01\n23".parse().unwrap();
        assert_eq!(grid.to_string(), "01\n23\n");
    }
}
