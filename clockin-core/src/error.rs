//! Error types for clockin-core

use thiserror::Error;

/// Main error type for the clockin-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Stored timestamp that could not be parsed back
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// A start was attempted while an activity is still open
    #[error("ongoing activity exists")]
    OngoingExists,

    /// An activity with the same title and start already exists
    #[error("activity already started")]
    DuplicateActivity,

    /// Range query bounds carried a non-zero UTC offset
    #[error("query bounds must be in UTC")]
    NonUtcTime,

    /// Unrecognized report selector passed to the view engine
    #[error("unknown view type: {0}")]
    UnknownViewType(String),
}

/// Result type alias for clockin-core
pub type Result<T> = std::result::Result<T, Error>;
