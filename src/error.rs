//! Error types for brief generation.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while validating, orchestrating or delivering a brief.
///
/// The structured-output core (parser, repairer, renderers) is total and never
/// produces these; they come from the trust boundary and the outer pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Repaired data still violated the report schema
    #[error("Report validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The report schema itself could not be compiled
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The external text generator failed
    #[error("Generator error ({agent}): {message}")]
    Generator { agent: String, message: String },

    /// Email delivery failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The pipeline exceeded its wall-clock budget
    #[error("Brief generation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// A blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

/// Result type for brief operations.
pub type Result<T> = std::result::Result<T, Error>;
