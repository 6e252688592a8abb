//! Error types for the toolbuddy engine
//!
//! Provides comprehensive error handling with context propagation.
//! Individual tool failures are never surfaced through this type to
//! callers of the executor; they land in `ToolCall::error`. `ToolError`
//! covers the engine's own failure modes: bad input, bad configuration,
//! timeouts, and I/O from tool bodies.

use thiserror::Error;

/// Main error type for the tool execution engine
#[derive(Error, Debug)]
pub enum ToolError {
    /// Input sanitization failures (dangerous or malformed arguments)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Tool error: {0}")]
    Generic(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Convert anyhow errors to ToolError
impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        ToolError::Generic(err.to_string())
    }
}
