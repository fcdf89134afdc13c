use thiserror::Error;

/// Error type for unicursor operations
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{0}")]
    NoRows(String),

    #[error("{0}")]
    NoRemaining(String),

    #[error("The row requested, {row}, does not exist (result has {count} row(s))")]
    RowOutOfRange { row: i64, count: usize },

    #[error("There was an error seeking to row {row}")]
    SeekFailed { row: usize },

    #[error("The backend returned no data for row {row}")]
    RowUnavailable { row: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl CursorError {
    /// True when the error means the statement produced no rows at all.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, CursorError::NoRows(_))
    }

    /// True when the error means iteration ran past the last row.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, CursorError::NoRemaining(_))
    }
}

/// Result type alias for unicursor operations
pub type Result<T> = std::result::Result<T, CursorError>;
