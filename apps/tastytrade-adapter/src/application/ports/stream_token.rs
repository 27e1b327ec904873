//! Stream Token Port (Driven Port)
//!
//! The one REST call the streaming core depends on: exchanging the session
//! credential for a streaming endpoint and token.

use async_trait::async_trait;

/// A streaming endpoint grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    /// Base WebSocket URL to connect to.
    pub websocket_url: String,
    /// Short-lived token appended to stream URLs.
    pub token: String,
}

/// Failure to obtain a stream endpoint.
#[derive(Debug, Clone, thiserror::Error)]
#[error("stream token request failed: {0}")]
pub struct TokenError(pub String);

/// Provider of streaming endpoint grants.
///
/// Tokens are short-lived; the coordinator requests a fresh grant for every
/// connect and reconnect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamTokenProvider: Send + Sync {
    /// Fetch a `{websocket-url, token}` pair.
    async fn quote_token(&self) -> Result<StreamEndpoint, TokenError>;
}
