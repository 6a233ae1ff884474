//! Common error types for Laser Juke Explorer

use thiserror::Error;

/// Common result type for explorer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the explorer service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (unknown list, unknown session, ...)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or source data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
