//! Error types for the reversi agents crate

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("illegal move at ({row}, {col}): {reason}")]
    IllegalMove {
        row: usize,
        col: usize,
        reason: &'static str,
    },

    #[error("state {state} is not present in the prepared transition table")]
    KeyLookup { state: String },

    #[error("agent '{agent}' was asked to act before a policy was learned or loaded")]
    UninitializedPolicy { agent: String },

    #[error("invalid board size {rows}x{cols}: {reason}")]
    InvalidBoardSize {
        rows: usize,
        cols: usize,
        reason: &'static str,
    },

    #[error("invalid board code {code} for a {rows}x{cols} board: {reason}")]
    InvalidBoardCode {
        code: u128,
        rows: usize,
        cols: usize,
        reason: &'static str,
    },

    #[error("action {action} is not valid on a board with {cells} cells")]
    InvalidAction { action: usize, cells: usize },

    #[error("state {state} has no legal actions")]
    NoLegalActions { state: String },

    #[error("unknown agent '{name}'. Expected one of: {expected}")]
    UnknownAgent { name: String, expected: String },

    #[error("agent name '{name}' is already registered")]
    DuplicateAgent { name: String },

    #[error("board size mismatch: expected {expected}, got {got}")]
    BoardSizeMismatch { expected: String, got: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid progress bar template: {message}")]
    ProgressBarTemplate { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },
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
