//! Error - CLI Error Types
//!
//! Defines error types for CLI operations.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside the library crates
    #[error(transparent)]
    Library(#[from] homegin_core::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Graph store not found
    #[error("Graph store not found: {0} (run `homegin build` first)")]
    StoreNotFound(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

// =============================================================================
// Error Conversion
// =============================================================================

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
