//! Account State Types
//!
//! Engine-facing views of venue positions and cash balances.

use rust_decimal::Decimal;

use super::symbol::CanonicalSymbol;

/// One open position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    /// Symbol held.
    pub symbol: CanonicalSymbol,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Average open price.
    pub average_price: Decimal,
    /// Current mark price.
    pub mark_price: Decimal,
    /// Current market value of the position.
    pub market_value: Decimal,
    /// Unrealized profit and loss for the day.
    pub unrealized_pnl: Decimal,
}

/// Cash balance in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashBalance {
    /// Amount of cash.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
}

impl CashBalance {
    /// Create a balance.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}
