//! REST API request and response types.
//!
//! These map directly to the venue's REST formats. Responses use kebab-case
//! field names; order *requests* use snake_case, matching the venue's
//! asymmetric convention.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Session and Streaming Grants
// ============================================================================

/// Session login request (`POST /sessions`).
#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest<'a> {
    /// Account username or email.
    pub login: &'a str,
    /// Account password.
    pub password: &'a str,
}

/// Session login response.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    /// Session token for subsequent requests.
    #[serde(rename = "session-token")]
    pub session_token: String,
}

/// Streaming grant response (`GET /api-quote-tokens`).
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteTokenResponse {
    /// Base WebSocket URL for streams.
    #[serde(rename = "websocket-url")]
    pub websocket_url: String,
    /// Short-lived stream token.
    pub token: String,
}

/// OAuth token endpoint response (`POST /oauth/token`).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokenResponse {
    /// Bearer access token.
    pub access_token: String,
    /// Replacement refresh token, when rotated.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

// ============================================================================
// Orders
// ============================================================================

/// One leg of an order request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLegRequest {
    /// Venue instrument-type string.
    pub instrument_type: String,
    /// Venue symbol.
    pub symbol: String,
    /// "Buy" or "Sell".
    pub action: String,
    /// Unsigned quantity.
    pub quantity: Decimal,
}

/// Order request (`POST`/`PUT /accounts/{id}/orders`).
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Venue order-type string.
    pub order_type: String,
    /// Venue time-in-force string.
    pub time_in_force: String,
    /// Limit price for limit orders, stop price for stop-market orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// "Debit" or "Credit".
    pub price_effect: String,
    /// Order legs (single-leg orders only).
    pub legs: Vec<OrderLegRequest>,
}

/// Order placement response.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderResponse {
    /// Venue-assigned order id.
    pub id: String,
}

/// One order as returned by `GET /accounts/{id}/orders/live`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDto {
    /// Venue order id.
    pub id: String,
    /// Venue instrument-type string.
    #[serde(rename = "instrument-type")]
    pub instrument_type: String,
    /// Venue symbol (the underlying ticker for options).
    pub symbol: String,
    /// "Buy" or "Sell".
    #[serde(rename = "order-side")]
    pub order_side: String,
    /// Unsigned quantity.
    pub quantity: Decimal,
    /// Venue order-type string.
    #[serde(rename = "order-type")]
    pub order_type: String,
    /// Venue status string.
    pub status: String,
    /// When the venue received the order.
    #[serde(rename = "received-at")]
    pub received_at: DateTime<Utc>,
    /// Limit price, when present.
    #[serde(rename = "limit-price", default)]
    pub limit_price: Option<Decimal>,
    /// Stop price, when present.
    #[serde(rename = "stop-price", default)]
    pub stop_price: Option<Decimal>,
    /// Option expiration date, present on option orders.
    #[serde(rename = "expiration-date", default)]
    pub expiration_date: Option<chrono::NaiveDate>,
    /// Option strike price, present on option orders.
    #[serde(rename = "strike-price", default)]
    pub strike_price: Option<Decimal>,
    /// "C" or "P", present on option orders.
    #[serde(rename = "option-type", default)]
    pub option_type: Option<String>,
}

// ============================================================================
// Account State
// ============================================================================

/// One position from `GET /accounts/{id}/positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionDto {
    /// Venue instrument-type string.
    #[serde(rename = "instrument-type")]
    pub instrument_type: String,
    /// Venue symbol.
    pub symbol: String,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Average open price.
    #[serde(rename = "average-open-price")]
    pub average_open_price: Decimal,
    /// Current mark price.
    #[serde(rename = "mark-price")]
    pub mark_price: Decimal,
    /// Current market value.
    pub mark: Decimal,
    /// Unrealized day gain.
    #[serde(rename = "unrealized-day-gain")]
    pub unrealized_day_gain: Decimal,
}

/// Balance response from `GET /accounts/{id}/balances`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceDto {
    /// Cash balance.
    #[serde(rename = "cash-balance")]
    pub cash_balance: Decimal,
    /// ISO currency code.
    pub currency: String,
}

/// Quote snapshot from `GET /quote-tokens/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteDto {
    /// Best bid price.
    #[serde(rename = "bid-price")]
    pub bid_price: Decimal,
    /// Best ask price.
    #[serde(rename = "ask-price")]
    pub ask_price: Decimal,
    /// Size at the best bid.
    #[serde(rename = "bid-size")]
    pub bid_size: Decimal,
    /// Size at the best ask.
    #[serde(rename = "ask-size")]
    pub ask_size: Decimal,
}

// ============================================================================
// History
// ============================================================================

/// One row of a history response. The venue reuses the endpoint for trade
/// candles, quote candles, and raw ticks, so every shape-specific field is
/// optional here and selected by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleDto {
    /// Row timestamp.
    pub time: DateTime<Utc>,
    /// Trade candle open.
    #[serde(default)]
    pub open: Option<Decimal>,
    /// Trade candle high.
    #[serde(default)]
    pub high: Option<Decimal>,
    /// Trade candle low.
    #[serde(default)]
    pub low: Option<Decimal>,
    /// Trade candle close.
    #[serde(default)]
    pub close: Option<Decimal>,
    /// Trade candle volume.
    #[serde(default)]
    pub volume: Option<Decimal>,
    /// Tick price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Tick size.
    #[serde(default)]
    pub size: Option<Decimal>,
    /// Quote candle ask open.
    #[serde(rename = "ask-open", default)]
    pub ask_open: Option<Decimal>,
    /// Quote candle ask high.
    #[serde(rename = "ask-high", default)]
    pub ask_high: Option<Decimal>,
    /// Quote candle ask low.
    #[serde(rename = "ask-low", default)]
    pub ask_low: Option<Decimal>,
    /// Quote candle ask close.
    #[serde(rename = "ask-close", default)]
    pub ask_close: Option<Decimal>,
    /// Quote candle bid open.
    #[serde(rename = "bid-open", default)]
    pub bid_open: Option<Decimal>,
    /// Quote candle bid high.
    #[serde(rename = "bid-high", default)]
    pub bid_high: Option<Decimal>,
    /// Quote candle bid low.
    #[serde(rename = "bid-low", default)]
    pub bid_low: Option<Decimal>,
    /// Quote candle bid close.
    #[serde(rename = "bid-close", default)]
    pub bid_close: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_request_serializes_snake_case() {
        let request = OrderRequest {
            order_type: "Limit".to_string(),
            time_in_force: "Day".to_string(),
            price: Some(Decimal::new(10050, 2)),
            price_effect: "Debit".to_string(),
            legs: vec![OrderLegRequest {
                instrument_type: "Equity".to_string(),
                symbol: "AAPL".to_string(),
                action: "Buy".to_string(),
                quantity: Decimal::from(10),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["order_type"], "Limit");
        assert_eq!(json["time_in_force"], "Day");
        assert_eq!(json["price_effect"], "Debit");
        assert_eq!(json["legs"][0]["instrument_type"], "Equity");
    }

    #[test]
    fn market_order_request_omits_price() {
        let request = OrderRequest {
            order_type: "Market".to_string(),
            time_in_force: "Day".to_string(),
            price: None,
            price_effect: "Debit".to_string(),
            legs: vec![],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("price").is_none());
    }

    #[test]
    fn order_dto_parses_kebab_case() {
        let json = r#"{
            "id": "o-123",
            "instrument-type": "Equity",
            "symbol": "AAPL",
            "order-side": "Buy",
            "quantity": 10,
            "order-type": "Limit",
            "status": "received",
            "received-at": "2024-03-15T14:30:00Z",
            "limit-price": 172.5
        }"#;

        let dto: OrderDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.id, "o-123");
        assert_eq!(dto.order_side, "Buy");
        assert_eq!(dto.limit_price, Some(Decimal::new(1725, 1)));
        assert!(dto.stop_price.is_none());
        assert!(dto.option_type.is_none());
    }

    #[test]
    fn quote_token_response_parses() {
        let json = r#"{"websocket-url":"wss://streamer.tastyworks.com","token":"t1"}"#;
        let grant: QuoteTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(grant.websocket_url, "wss://streamer.tastyworks.com");
        assert_eq!(grant.token, "t1");
    }

    #[test]
    fn candle_dto_parses_quote_candles() {
        let json = r#"{
            "time": "2024-03-15T14:30:00Z",
            "ask-open": 100.1, "ask-high": 100.3, "ask-low": 100.0, "ask-close": 100.2,
            "bid-open": 100.0, "bid-high": 100.2, "bid-low": 99.9, "bid-close": 100.1
        }"#;

        let dto: CandleDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.ask_open, Some(Decimal::new(1001, 1)));
        assert_eq!(dto.bid_close, Some(Decimal::new(1001, 1)));
        assert!(dto.open.is_none());
    }
}
