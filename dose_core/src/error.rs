//! Error types for the dose_core library.
//!
//! Calculation outcomes are never errors: the engine is total and reports
//! problems inside [`crate::CalculationResult`]. This enum covers the
//! infrastructure around it (config I/O, table validation, input parsing).

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dose_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Marking table validation error
    #[error("Marking table validation error: {0}")]
    MarkingValidation(String),

    /// Caller-supplied input could not be parsed
    #[error("Input error: {0}")]
    Input(String),
}
