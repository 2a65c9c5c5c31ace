//! Unified error types for tasklink

use thiserror::Error;

/// Unified error type for all tasklink operations
///
/// The command executor never classifies failures; the manager that issued
/// the command maps exit codes to one of these variants, because the same
/// non-zero exit means different things per sub-command.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input caught before any process call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Date string or expression the engine could not resolve
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Zero matching rows for a required single-task lookup
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Context/UDA operations on unknown names, or an unresolvable binary
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed output from an otherwise successful process call
    #[error("Parse error: {0}")]
    Parse(String),

    /// Any other non-zero exit, with the engine's stderr attached verbatim
    #[error("TaskWarrior command failed: {message}: {stderr}")]
    Engine { message: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an `Engine` error from a failure message and raw stderr
    pub fn engine(message: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            stderr: stderr.into(),
        }
    }
}

/// Result type alias using the tasklink Error type
pub type Result<T> = std::result::Result<T, Error>;
