//! Core error types

use thiserror::Error;

/// Errors raised while loading or validating service configuration.
///
/// Messages name the offending field but never echo its value, since several
/// fields carry secret material.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is absent or empty
    #[error("Missing required configuration field: {field}")]
    MissingField { field: &'static str },

    /// A field is present but unusable
    #[error("Invalid configuration field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Configuration text could not be parsed
    #[error("Configuration parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
