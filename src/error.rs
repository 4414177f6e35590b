//! Error types for the intent router

use crate::models::ErrorKind;
use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {

    // =============================
    // Tool Gateway Errors
    // =============================

    /// Malformed ToolCall arguments or an unregistered tool name.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ledger unreachable, returned a non-success status, or timed out.
    #[error("Transport error: {0}")]
    Transport(String),

    // =============================
    // Startup Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RouterError {
    /// User-facing classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::Transport(_) | RouterError::HttpError(_) => ErrorKind::Transport,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            RouterError::Transport("ledger down".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            RouterError::Validation("missing amount".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(RouterError::Config("bad".into()).kind(), ErrorKind::Validation);
    }
}
