//! Streaming Wire Message Types
//!
//! Types for the venue's per-symbol streaming sockets. All payloads are JSON
//! objects with kebab-case field names.
//!
//! # Message Types
//!
//! - Auth frame (sent on connect): `{"action":"auth","authorization":"<token>"}`
//! - Auth response: `{"action":"auth","status":"ok"}` or `{"status":"error",...}`
//! - Quote: `{"bid-price":...,"bid-size":...,"ask-price":...,"ask-size":...}`
//! - Trade: `{"price":...,"size":...}`
//!
//! Quote and trade frames normally omit the symbol because each socket
//! serves exactly one symbol; an optional `symbol` field is honored when
//! present so a multiplexed stream would decode identically.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authentication frame sent immediately after the transport opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAuthRequest {
    /// Action marker (always "auth").
    pub action: String,
    /// Session token.
    pub authorization: String,
}

impl StreamAuthRequest {
    /// Create an auth frame for a session token.
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            action: "auth".to_string(),
            authorization: session_token.into(),
        }
    }
}

/// Status carried by an auth response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Credential accepted.
    Ok,
    /// Credential rejected.
    Error,
}

/// Server response to the authentication frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAuthResponse {
    /// Echoed action marker.
    #[serde(default)]
    pub action: Option<String>,
    /// Accept/reject status.
    pub status: AuthStatus,
    /// Server-provided detail, usually only on rejection.
    #[serde(default)]
    pub message: Option<String>,
}

impl StreamAuthResponse {
    /// Check whether the credential was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.status, AuthStatus::Error)
    }

    /// Rejection detail, falling back to a generic description.
    #[must_use]
    pub fn rejection_reason(&self) -> &str {
        self.message.as_deref().unwrap_or("credential rejected")
    }
}

/// One top-of-book quote frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMessage {
    /// Best bid price.
    #[serde(rename = "bid-price")]
    pub bid_price: Decimal,
    /// Size at the best bid.
    #[serde(rename = "bid-size")]
    pub bid_size: Decimal,
    /// Best ask price.
    #[serde(rename = "ask-price")]
    pub ask_price: Decimal,
    /// Size at the best ask.
    #[serde(rename = "ask-size")]
    pub ask_size: Decimal,
    /// Venue symbol, present only on multiplexed streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// One trade frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMessage {
    /// Trade price.
    pub price: Decimal,
    /// Trade size.
    pub size: Decimal,
    /// Venue symbol, present only on multiplexed streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// A decoded streaming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// Authentication acknowledgment or rejection.
    AuthResponse(StreamAuthResponse),
    /// Top-of-book quote.
    Quote(QuoteMessage),
    /// Trade print.
    Trade(TradeMessage),
}
