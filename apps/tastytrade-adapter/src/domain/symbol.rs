//! Canonical Symbol Types
//!
//! The engine-side, venue-independent identity of a security. Venue-specific
//! encodings (OCC option strings, slash-prefixed futures) are produced and
//! parsed by the symbol mapper in the infrastructure layer; this module only
//! carries the data those encodings need to round-trip.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Security type of a canonical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    /// US equity.
    Equity,
    /// Option on an equity.
    EquityOption,
    /// Future contract.
    Future,
    /// Option on a future contract.
    FutureOption,
}

impl SecurityType {
    /// Check whether this security type carries option contract terms.
    #[must_use]
    pub const fn is_option(self) -> bool {
        matches!(self, Self::EquityOption | Self::FutureOption)
    }
}

impl std::fmt::Display for SecurityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Equity => "equity",
            Self::EquityOption => "equity option",
            Self::Future => "future",
            Self::FutureOption => "future option",
        };
        f.write_str(name)
    }
}

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    /// Right to buy the underlying.
    Call,
    /// Right to sell the underlying.
    Put,
}

impl OptionRight {
    /// Single-letter code used in venue option symbols.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Call => 'C',
            Self::Put => 'P',
        }
    }

    /// Parse the single-letter code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Self::Call),
            'P' => Some(Self::Put),
            _ => None,
        }
    }
}

/// Contract terms carried by option symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    /// Expiration date.
    pub expiry: NaiveDate,
    /// Call or put.
    pub right: OptionRight,
    /// Strike price.
    pub strike: Decimal,
}

/// Canonical (engine-side) symbol.
///
/// `ticker` is the security's own ticker for equities and futures, and the
/// underlying's ticker for options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalSymbol {
    ticker: String,
    security_type: SecurityType,
    contract: Option<OptionContract>,
}

impl CanonicalSymbol {
    /// Create an equity symbol.
    pub fn equity(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            security_type: SecurityType::Equity,
            contract: None,
        }
    }

    /// Create a future symbol. A leading `/` (the venue convention) is
    /// stripped so the canonical ticker is venue-neutral.
    pub fn future(ticker: impl Into<String>) -> Self {
        let ticker: String = ticker.into();
        Self {
            ticker: ticker.trim_start_matches('/').to_string(),
            security_type: SecurityType::Future,
            contract: None,
        }
    }

    /// Create an equity option symbol.
    pub fn equity_option(
        underlying: impl Into<String>,
        expiry: NaiveDate,
        right: OptionRight,
        strike: Decimal,
    ) -> Self {
        Self {
            ticker: underlying.into(),
            security_type: SecurityType::EquityOption,
            contract: Some(OptionContract {
                expiry,
                right,
                strike,
            }),
        }
    }

    /// Create a future option symbol.
    pub fn future_option(
        underlying: impl Into<String>,
        expiry: NaiveDate,
        right: OptionRight,
        strike: Decimal,
    ) -> Self {
        let underlying: String = underlying.into();
        Self {
            ticker: underlying
                .trim_start_matches('.')
                .trim_start_matches('/')
                .to_string(),
            security_type: SecurityType::FutureOption,
            contract: Some(OptionContract {
                expiry,
                right,
                strike,
            }),
        }
    }

    /// The ticker (underlying ticker for options).
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// The security type.
    #[must_use]
    pub const fn security_type(&self) -> SecurityType {
        self.security_type
    }

    /// Option contract terms, when present.
    #[must_use]
    pub const fn contract(&self) -> Option<&OptionContract> {
        self.contract.as_ref()
    }
}

impl std::fmt::Display for CanonicalSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.security_type, &self.contract) {
            (SecurityType::Future, _) => write!(f, "/{}", self.ticker),
            (_, Some(c)) => write!(
                f,
                "{} {} {}{}",
                self.ticker,
                c.expiry.format("%Y-%m-%d"),
                c.right.code(),
                c.strike
            ),
            _ => f.write_str(&self.ticker),
        }
    }
}
