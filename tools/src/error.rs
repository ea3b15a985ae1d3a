//! Error types for the tool clients.

use thiserror::Error;

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while calling an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response from the service.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
