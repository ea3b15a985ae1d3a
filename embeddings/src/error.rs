//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Errors that can occur while turning text into embeddings.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// The input produced no valid token.
    #[error("input is empty after tokenization")]
    EmptyInput,

    /// Text too long to be represented even after truncation.
    #[error("text too long: {length} characters, max {max_length}")]
    TextTooLong { length: usize, max_length: usize },

    /// The token budget cannot hold the special tokens the model adds.
    #[error("token budget of {max_tokens} leaves no room after {reserved} special tokens")]
    TokenBudget { max_tokens: usize, reserved: usize },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The encoder returned a different number of token vectors than the
    /// attention mask describes.
    #[error("token count mismatch: expected {expected}, got {actual}")]
    TokenCountMismatch { expected: usize, actual: usize },

    /// The tokenizer vocabulary is unusable.
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    /// The tokenizer pipeline failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from the encoder.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The encoder did not answer in time.
    #[error("encoder timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
