//! Stream Codec Module
//!
//! Decodes one complete text frame from a streaming socket into a
//! [`StreamMessage`]. Frames are JSON objects classified by shape: quote
//! frames carry `bid-price`, trade frames carry `price`, auth responses
//! carry `status`.
//!
//! Decoding is pure; a malformed frame yields a [`CodecError`] that the
//! receive loop logs and discards without touching the connection.

use super::messages::{QuoteMessage, StreamAuthResponse, StreamMessage, TradeMessage};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON parsing or field extraction failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame was valid JSON but not an object.
    #[error("expected JSON object, got: {0}")]
    NotAnObject(String),

    /// The object matched none of the known message shapes.
    #[error("unrecognized message shape: {0}")]
    UnknownShape(String),
}

/// JSON codec for the per-symbol quote and trade streams.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into a `StreamMessage`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON parsing fails, a required field is missing
    /// or mistyped, or the object matches no known shape.
    pub fn decode(&self, text: &str) -> Result<StreamMessage, CodecError> {
        let trimmed = text.trim();
        let value: serde_json::Value = serde_json::from_str(trimmed)?;

        let Some(object) = value.as_object() else {
            return Err(CodecError::NotAnObject(preview(trimmed)));
        };

        if object.contains_key("status") {
            let msg: StreamAuthResponse = serde_json::from_value(value)?;
            return Ok(StreamMessage::AuthResponse(msg));
        }
        if object.contains_key("bid-price") {
            let msg: QuoteMessage = serde_json::from_value(value)?;
            return Ok(StreamMessage::Quote(msg));
        }
        if object.contains_key("price") {
            let msg: TradeMessage = serde_json::from_value(value)?;
            return Ok(StreamMessage::Trade(msg));
        }

        Err(CodecError::UnknownShape(preview(trimmed)))
    }

    /// Encode a value to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 50;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
