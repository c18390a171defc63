//! Error types for the journal engine

use thiserror::Error;

/// Main error type for the journal engine
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("store slice '{0}' missing or malformed")]
    MissingSlice(&'static str),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, JournalError>;
