//! Error types for the title query engine

use thiserror::Error;

/// Result type alias for query engine operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Main error type for the query engine
///
/// A lookup that matches nothing is not an error (it yields `None`), and a
/// value that cannot be parsed as a number becomes a null rather than failing.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Load error: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl QueryError {
    /// True if this error reports a column absent from the table schema
    pub fn is_missing_column(&self) -> bool {
        matches!(self, QueryError::MissingColumn(_))
    }
}
