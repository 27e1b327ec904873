//! REST API error types.

use thiserror::Error;

/// Errors from the REST adapter.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// Network error (retryable).
    #[error("network error: {0}")]
    Network(String),

    /// The API returned an error status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body (or reason phrase).
        message: String,
    },

    /// Authentication failed (401/403).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited and retries exhausted.
    #[error("rate limited")]
    RateLimited,

    /// Response body could not be parsed.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Retries exhausted on a retryable failure.
    #[error("max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The request could not be constructed (e.g. unmappable symbol).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Check whether the error is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<ApiError> for crate::application::ports::TokenError {
    fn from(err: ApiError) -> Self {
        Self(err.to_string())
    }
}
