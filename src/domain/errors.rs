//! Domain error types
//!
//! This module defines the error hierarchy for Keepsake.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Keepsake error type
///
/// This is the primary error type used throughout the application.
/// Missing or broken images are deliberately absent from this hierarchy:
/// the asset resolver reports them as `None`, never as an error.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend API errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Document layout or rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Backend API errors
///
/// Errors that occur when talking to the REST backend that owns users, books
/// and responses. These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to reach the backend
    #[error("Failed to connect to backend: {0}")]
    ConnectionFailed(String),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be decoded
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Requested entity is not known to the backend
    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// Whether retrying the request can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::ConnectionFailed(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            BackendError::InvalidResponse(_) | BackendError::NotFound(_) => false,
        }
    }
}

impl KeepsakeError {
    /// Whether this error came from the backend being unreachable
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            KeepsakeError::Backend(BackendError::ConnectionFailed(_))
                | KeepsakeError::Backend(BackendError::Timeout(_))
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for KeepsakeError {
    fn from(err: std::io::Error) -> Self {
        KeepsakeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for KeepsakeError {
    fn from(err: serde_json::Error) -> Self {
        KeepsakeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for KeepsakeError {
    fn from(err: toml::de::Error) -> Self {
        KeepsakeError::Configuration(format!("TOML parse error: {err}"))
    }
}
