//! Order Value Types
//!
//! Engine-facing order representations and the venue status/type mapping
//! tables. Quantities are signed: positive buys, negative sells.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::CanonicalSymbol;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy (positive quantity).
    Buy,
    /// Sell (negative quantity).
    Sell,
}

impl OrderSide {
    /// Side implied by a signed quantity.
    #[must_use]
    pub fn of_quantity(quantity: Decimal) -> Self {
        if quantity > Decimal::ZERO {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    /// Venue string for order legs.
    #[must_use]
    pub const fn venue_action(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute immediately at market.
    Market,
    /// Execute at the limit price or better.
    Limit,
    /// Become a market order once the stop price trades.
    Stop,
    /// Become a limit order once the stop price trades.
    StopLimit,
}

impl OrderType {
    /// Venue string for order requests.
    #[must_use]
    pub const fn venue_name(self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
            Self::Stop => "Stop",
            Self::StopLimit => "StopLimit",
        }
    }

    /// Parse the venue's order-type string.
    #[must_use]
    pub fn from_venue(name: &str) -> Option<Self> {
        match name {
            "Market" => Some(Self::Market),
            "Limit" => Some(Self::Limit),
            "Stop" => Some(Self::Stop),
            "StopLimit" => Some(Self::StopLimit),
            _ => None,
        }
    }
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Valid for the trading day.
    #[default]
    Day,
    /// Good till cancelled.
    Gtc,
}

impl TimeInForce {
    /// Venue string for order requests.
    #[must_use]
    pub const fn venue_name(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Gtc => "GTC",
        }
    }
}

/// Order status, mapped from the venue's status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the venue ("received").
    Submitted,
    /// Partially filled.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Cancelled.
    Cancelled,
    /// Rejected by the venue.
    Rejected,
    /// Anything the venue reports that has no engine equivalent.
    Unknown,
}

impl OrderStatus {
    /// Map a venue status string (case-insensitive).
    #[must_use]
    pub fn from_venue(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "received" => Self::Submitted,
            "partially_filled" => Self::PartiallyFilled,
            "filled" => Self::Filled,
            "cancelled" => Self::Cancelled,
            "rejected" => Self::Rejected,
            _ => Self::Unknown,
        }
    }

    /// Check whether the order can still trade.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Submitted | Self::PartiallyFilled)
    }
}

/// Whether an order debits or credits the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceEffect {
    /// Cash leaves the account (buying).
    Debit,
    /// Cash enters the account (selling).
    Credit,
}

impl PriceEffect {
    /// Effect implied by a signed quantity.
    #[must_use]
    pub fn of_quantity(quantity: Decimal) -> Self {
        if quantity > Decimal::ZERO {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    /// Venue string for order requests.
    #[must_use]
    pub const fn venue_name(self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
        }
    }
}

/// An order the engine wants placed (or an update to an existing one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Symbol to trade.
    pub symbol: CanonicalSymbol,
    /// Signed quantity (positive buys, negative sells).
    pub quantity: Decimal,
    /// Order type.
    pub order_type: OrderType,
    /// Limit price for limit and stop-limit orders.
    pub limit_price: Option<Decimal>,
    /// Stop price for stop and stop-limit orders.
    pub stop_price: Option<Decimal>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl NewOrder {
    /// Create a market order.
    #[must_use]
    pub const fn market(symbol: CanonicalSymbol, quantity: Decimal) -> Self {
        Self {
            symbol,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a limit order.
    #[must_use]
    pub const fn limit(symbol: CanonicalSymbol, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            symbol,
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            stop_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a stop-market order.
    #[must_use]
    pub const fn stop_market(
        symbol: CanonicalSymbol,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            quantity,
            order_type: OrderType::Stop,
            limit_price: None,
            stop_price: Some(stop_price),
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a stop-limit order.
    #[must_use]
    pub const fn stop_limit(
        symbol: CanonicalSymbol,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            quantity,
            order_type: OrderType::StopLimit,
            limit_price: Some(limit_price),
            stop_price: Some(stop_price),
            time_in_force: TimeInForce::Day,
        }
    }

    /// Order side implied by the signed quantity.
    #[must_use]
    pub fn side(&self) -> OrderSide {
        OrderSide::of_quantity(self.quantity)
    }

    /// The single price the venue wants on the request: limit price for
    /// limit/stop-limit orders, stop price for stop-market orders.
    #[must_use]
    pub const fn venue_price(&self) -> Option<Decimal> {
        match self.order_type {
            OrderType::Market => None,
            OrderType::Limit | OrderType::StopLimit => self.limit_price,
            OrderType::Stop => self.stop_price,
        }
    }
}

/// An order as reported back by the venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    /// Venue-assigned order id.
    pub venue_order_id: String,
    /// Symbol.
    pub symbol: CanonicalSymbol,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Order type.
    pub order_type: OrderType,
    /// Limit price, when the type carries one.
    pub limit_price: Option<Decimal>,
    /// Stop price, when the type carries one.
    pub stop_price: Option<Decimal>,
    /// Current status.
    pub status: OrderStatus,
    /// When the venue received the order.
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("received", OrderStatus::Submitted; "received lowercase")]
    #[test_case("Received", OrderStatus::Submitted; "received titlecase")]
    #[test_case("cancelled", OrderStatus::Cancelled)]
    #[test_case("filled", OrderStatus::Filled)]
    #[test_case("partially_filled", OrderStatus::PartiallyFilled)]
    #[test_case("rejected", OrderStatus::Rejected)]
    #[test_case("in_flight", OrderStatus::Unknown)]
    fn status_mapping(venue: &str, expected: OrderStatus) {
        assert_eq!(OrderStatus::from_venue(venue), expected);
    }

    #[test_case(OrderType::Market, "Market")]
    #[test_case(OrderType::Limit, "Limit")]
    #[test_case(OrderType::Stop, "Stop")]
    #[test_case(OrderType::StopLimit, "StopLimit")]
    fn order_type_round_trips(order_type: OrderType, venue: &str) {
        assert_eq!(order_type.venue_name(), venue);
        assert_eq!(OrderType::from_venue(venue), Some(order_type));
    }

    #[test]
    fn side_and_effect_follow_quantity_sign() {
        assert_eq!(OrderSide::of_quantity(Decimal::from(10)), OrderSide::Buy);
        assert_eq!(OrderSide::of_quantity(Decimal::from(-10)), OrderSide::Sell);
        assert_eq!(
            PriceEffect::of_quantity(Decimal::from(10)),
            PriceEffect::Debit
        );
        assert_eq!(
            PriceEffect::of_quantity(Decimal::from(-10)),
            PriceEffect::Credit
        );
    }

    #[test]
    fn venue_price_selection() {
        let symbol = CanonicalSymbol::equity("AAPL");
        let limit = NewOrder::limit(symbol.clone(), Decimal::from(1), Decimal::from(100));
        assert_eq!(limit.venue_price(), Some(Decimal::from(100)));

        let stop = NewOrder::stop_market(symbol.clone(), Decimal::from(1), Decimal::from(95));
        assert_eq!(stop.venue_price(), Some(Decimal::from(95)));

        let stop_limit = NewOrder::stop_limit(
            symbol.clone(),
            Decimal::from(1),
            Decimal::from(95),
            Decimal::from(94),
        );
        assert_eq!(stop_limit.venue_price(), Some(Decimal::from(94)));

        let market = NewOrder::market(symbol, Decimal::from(1));
        assert_eq!(market.venue_price(), None);
    }

    #[test]
    fn open_statuses() {
        assert!(OrderStatus::Submitted.is_open());
        assert!(OrderStatus::PartiallyFilled.is_open());
        assert!(!OrderStatus::Filled.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }
}
