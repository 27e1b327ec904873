//! Symbol Mapping Port (Driven Port)
//!
//! Pure, deterministic translation between canonical symbols and the venue's
//! ticker conventions, plus exchange time-zone resolution.

use chrono_tz::Tz;

use crate::domain::symbol::CanonicalSymbol;

/// Symbol translation failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolError {
    /// The security type has no venue encoding.
    #[error("security type not supported: {0}")]
    UnsupportedSecurityType(String),

    /// The venue instrument-type string is unknown.
    #[error("instrument type not supported: {0}")]
    UnsupportedInstrumentType(String),

    /// A venue symbol string did not match the expected format.
    #[error("failed to parse venue symbol {symbol:?}: {reason}")]
    Parse {
        /// The offending venue symbol.
        symbol: String,
        /// Why it could not be parsed.
        reason: String,
    },
}

/// Canonical ⇄ venue symbol translation. Pure, no I/O.
#[cfg_attr(test, mockall::automock)]
pub trait SymbolMapper: Send + Sync {
    /// Venue encoding of a canonical symbol.
    fn venue_symbol(&self, symbol: &CanonicalSymbol) -> Result<String, SymbolError>;

    /// Canonical symbol for a venue instrument-type/symbol pair.
    fn canonical_symbol(
        &self,
        instrument_type: &str,
        venue_symbol: &str,
    ) -> Result<CanonicalSymbol, SymbolError>;

    /// Venue instrument-type string for a canonical symbol.
    fn venue_instrument_type(&self, symbol: &CanonicalSymbol) -> &'static str;

    /// Exchange time zone used to localize the symbol's tick timestamps.
    fn exchange_time_zone(&self, symbol: &CanonicalSymbol) -> Tz;
}
