//! CLI error types.

use note_core::types::CodecError;
use note_settlement::SettlementError;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scenario file could not be read or is inconsistent
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Instrument name not declared in the scenario
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Codec error
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Settlement error
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a scenario error
    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result alias for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
