// Error types for the dashboard
// Expected outcomes (invalid CPF, blocked retry) are values, not errors

use thiserror::Error;

/// Main error type for the dashboard
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected by a validator
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown file, crossing, result or personal record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Dataset loading errors
    #[error("Data error: {0}")]
    Data(String),

    /// An operation of the same kind is already in flight
    #[error("Busy: {0}")]
    Busy(String),

    /// Logging system errors
    #[error("Logging error: {0}")]
    Log(String),

    /// I/O errors from standard library
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DashboardError>;
