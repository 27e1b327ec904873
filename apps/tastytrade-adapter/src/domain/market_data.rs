//! Market Data Types
//!
//! Canonical tick representation handed to the engine's data sink. Ticks are
//! built from one wire message each and are never retained by the adapter.
//!
//! Timestamps are always localized to the subscription's exchange time zone;
//! the wire format's zone (or the receive clock's UTC) never leaks through.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::subscription::Subscription;
use super::symbol::CanonicalSymbol;

/// Kind-specific payload of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// A completed trade.
    Trade {
        /// Trade price.
        price: Decimal,
        /// Trade size.
        size: Decimal,
    },
    /// A top-of-book quote.
    Quote {
        /// Best bid price.
        bid_price: Decimal,
        /// Size at the best bid.
        bid_size: Decimal,
        /// Best ask price.
        ask_price: Decimal,
        /// Size at the best ask.
        ask_size: Decimal,
    },
}

impl TickKind {
    /// Check whether this is a quote payload.
    #[must_use]
    pub const fn is_quote(&self) -> bool {
        matches!(self, Self::Quote { .. })
    }

    /// Check whether this is a trade payload.
    #[must_use]
    pub const fn is_trade(&self) -> bool {
        matches!(self, Self::Trade { .. })
    }
}

/// One normalized market-data event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Canonical symbol the tick belongs to.
    pub symbol: CanonicalSymbol,
    /// Event time in the subscription's exchange time zone.
    pub time: DateTime<Tz>,
    /// Trade or quote payload.
    pub kind: TickKind,
}

impl Tick {
    /// Build a quote tick for a subscription, localizing `at` to the
    /// subscription's exchange time zone.
    #[must_use]
    pub fn quote(
        subscription: &Subscription,
        at: DateTime<Utc>,
        bid_price: Decimal,
        bid_size: Decimal,
        ask_price: Decimal,
        ask_size: Decimal,
    ) -> Self {
        Self {
            symbol: subscription.symbol.clone(),
            time: at.with_timezone(&subscription.exchange_time_zone),
            kind: TickKind::Quote {
                bid_price,
                bid_size,
                ask_price,
                ask_size,
            },
        }
    }

    /// Build a trade tick for a subscription, localizing `at` to the
    /// subscription's exchange time zone.
    #[must_use]
    pub fn trade(
        subscription: &Subscription,
        at: DateTime<Utc>,
        price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            symbol: subscription.symbol.clone(),
            time: at.with_timezone(&subscription.exchange_time_zone),
            kind: TickKind::Trade { price, size },
        }
    }
}

/// Point-in-time top-of-book snapshot returned by the REST quote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSnapshot {
    /// Canonical symbol.
    pub symbol: CanonicalSymbol,
    /// Snapshot time (UTC; REST snapshots are not exchange-localized).
    pub time: DateTime<Utc>,
    /// Best bid price.
    pub bid_price: Decimal,
    /// Best ask price.
    pub ask_price: Decimal,
    /// Size at the best bid.
    pub bid_size: Decimal,
    /// Size at the best ask.
    pub ask_size: Decimal,
}
