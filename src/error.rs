//! Error types for the gridmdp crate

use thiserror::Error;

/// Main error type for the gridmdp crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("grid must contain at least one non-empty row")]
    EmptyGrid,

    #[error("ragged grid: row {row} has {got} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid cell character '{character}' at row {row}, column {col} (expected 0-3)")]
    InvalidCellCharacter {
        character: char,
        row: usize,
        col: usize,
    },

    #[error("start cell (bottom-left corner) is a wall")]
    StartOnWall,

    #[error("missing setting '{name}'")]
    MissingSetting { name: String },

    #[error("invalid value '{value}' for setting '{name}': {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unknown action '{input}' (expected up, down, left or right)")]
    ParseAction { input: String },

    #[error("unknown stopping rule '{input}' (expected contraction or absolute)")]
    ParseStoppingRule { input: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}
