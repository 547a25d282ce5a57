//! Error types for guesty-client.

use thiserror::Error;

/// Errors that can occur when talking to the Guesty Open API.
#[derive(Debug, Error)]
pub enum GuestyError {
    /// Credentials are missing, the token grant was rejected, or requests
    /// kept failing with 401 after refreshing the token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-retryable error response.
    #[error("Guesty request failed: {status} {message}")]
    Remote { status: u16, message: String },

    /// Transient failures outlasted the retry budget.
    #[error("Guesty request failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GuestyError {
    /// Whether this is an endpoint rejecting the `skip` pagination parameter.
    pub fn is_skip_rejection(&self) -> bool {
        match self {
            GuestyError::Remote { message, .. } => crate::pagination::is_skip_rejection(message),
            _ => false,
        }
    }
}

/// Result type for Guesty operations.
pub type Result<T> = std::result::Result<T, GuestyError>;
