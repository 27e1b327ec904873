//! Venue Symbol Mapper
//!
//! Translation between canonical symbols and the venue's ticker conventions.
//!
//! # Venue Encodings
//!
//! - Equity: the ticker verbatim (`AAPL`)
//! - Future: slash-prefixed root (`/ES`)
//! - Equity option: `ROOT␣␣yyMMdd{C|P}SSSSSSSS` — the strike is price × 1000,
//!   zero-padded to eight digits (`AAPL  240315C00172500`)
//! - Future option: `.ROOT yyMMddCSSSS` on generation; parsing also accepts
//!   the venue's three-part form (`./ESZ3 EW4U3 230927P2975`)
//!
//! Instrument-type strings are `Equity`, `Equity Option`, `Future`,
//! `Future Option` (case-insensitive on parse).

use std::sync::LazyLock;

use chrono::NaiveDate;
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::application::ports::{SymbolError, SymbolMapper};
use crate::domain::symbol::{CanonicalSymbol, OptionRight, SecurityType};

static EQUITY_OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?P<root>[A-Z]+)\s+(?P<date>\d{6})(?P<right>[CP])(?P<strike>\d{8})$")
        .expect("equity option regex is valid")
});

/// Symbol mapper for the TastyTrade venue.
#[derive(Debug, Default, Clone)]
pub struct TastyTradeSymbolMapper;

impl TastyTradeSymbolMapper {
    /// Create a new mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn generate_equity_option(symbol: &CanonicalSymbol) -> Result<String, SymbolError> {
        let contract = symbol.contract().ok_or_else(|| SymbolError::Parse {
            symbol: symbol.to_string(),
            reason: "option symbol without contract terms".to_string(),
        })?;

        let thousandths = (contract.strike * Decimal::from(1000))
            .trunc()
            .to_i64()
            .ok_or_else(|| SymbolError::Parse {
                symbol: symbol.to_string(),
                reason: "strike out of range".to_string(),
            })?;
        Ok(format!(
            "{}  {}{}{thousandths:08}",
            symbol.ticker(),
            contract.expiry.format("%y%m%d"),
            contract.right.code(),
        ))
    }

    fn generate_future_option(symbol: &CanonicalSymbol) -> Result<String, SymbolError> {
        let contract = symbol.contract().ok_or_else(|| SymbolError::Parse {
            symbol: symbol.to_string(),
            reason: "option symbol without contract terms".to_string(),
        })?;

        let whole = contract
            .strike
            .trunc()
            .to_i64()
            .ok_or_else(|| SymbolError::Parse {
                symbol: symbol.to_string(),
                reason: "strike out of range".to_string(),
            })?;
        Ok(format!(
            ".{} {}{}{whole:04}",
            symbol.ticker(),
            contract.expiry.format("%y%m%d"),
            contract.right.code(),
        ))
    }

    fn parse_equity_option(venue_symbol: &str) -> Result<CanonicalSymbol, SymbolError> {
        let captures =
            EQUITY_OPTION_RE
                .captures(venue_symbol)
                .ok_or_else(|| SymbolError::Parse {
                    symbol: venue_symbol.to_string(),
                    reason: "does not match ROOT yyMMdd[CP]SSSSSSSS".to_string(),
                })?;

        let root = &captures["root"];
        let expiry = parse_expiry(venue_symbol, &captures["date"])?;
        let right = parse_right(venue_symbol, &captures["right"])?;
        let strike: Decimal = captures["strike"]
            .parse::<Decimal>()
            .map_err(|e| SymbolError::Parse {
                symbol: venue_symbol.to_string(),
                reason: e.to_string(),
            })?
            / Decimal::from(1000);

        Ok(CanonicalSymbol::equity_option(root, expiry, right, strike))
    }

    /// Parse the venue's three-part future option form:
    /// `./ESZ3 EW4U3 230927P2975` (future root, option root, contract info).
    fn parse_future_option(venue_symbol: &str) -> Result<CanonicalSymbol, SymbolError> {
        let parts: Vec<&str> = venue_symbol.split(' ').collect();
        if parts.len() != 3 {
            return Err(SymbolError::Parse {
                symbol: venue_symbol.to_string(),
                reason: "expected three space-separated parts".to_string(),
            });
        }

        let root = parts[0].trim_start_matches('.');
        let info = parts[2];
        if info.len() < 8 || !info.is_ascii() {
            return Err(SymbolError::Parse {
                symbol: venue_symbol.to_string(),
                reason: "contract info too short".to_string(),
            });
        }

        let expiry = parse_expiry(venue_symbol, &info[..6])?;
        let right = parse_right(venue_symbol, &info[6..7])?;
        let strike: Decimal = info[7..].parse().map_err(|_| SymbolError::Parse {
            symbol: venue_symbol.to_string(),
            reason: format!("invalid strike {:?}", &info[7..]),
        })?;

        Ok(CanonicalSymbol::future_option(root, expiry, right, strike))
    }
}

fn parse_expiry(venue_symbol: &str, digits: &str) -> Result<NaiveDate, SymbolError> {
    NaiveDate::parse_from_str(digits, "%y%m%d").map_err(|e| SymbolError::Parse {
        symbol: venue_symbol.to_string(),
        reason: format!("invalid expiry {digits:?}: {e}"),
    })
}

fn parse_right(venue_symbol: &str, code: &str) -> Result<OptionRight, SymbolError> {
    code.chars()
        .next()
        .and_then(OptionRight::from_code)
        .ok_or_else(|| SymbolError::Parse {
            symbol: venue_symbol.to_string(),
            reason: format!("invalid option right {code:?}"),
        })
}

impl SymbolMapper for TastyTradeSymbolMapper {
    fn venue_symbol(&self, symbol: &CanonicalSymbol) -> Result<String, SymbolError> {
        match symbol.security_type() {
            SecurityType::Equity => Ok(symbol.ticker().to_string()),
            SecurityType::Future => Ok(format!("/{}", symbol.ticker())),
            SecurityType::EquityOption => Self::generate_equity_option(symbol),
            SecurityType::FutureOption => Self::generate_future_option(symbol),
        }
    }

    fn canonical_symbol(
        &self,
        instrument_type: &str,
        venue_symbol: &str,
    ) -> Result<CanonicalSymbol, SymbolError> {
        match instrument_type.to_lowercase().as_str() {
            "equity" => Ok(CanonicalSymbol::equity(venue_symbol)),
            "equity option" => Self::parse_equity_option(venue_symbol),
            "future" => Ok(CanonicalSymbol::future(venue_symbol)),
            "future option" => Self::parse_future_option(venue_symbol),
            other => Err(SymbolError::UnsupportedInstrumentType(other.to_string())),
        }
    }

    fn venue_instrument_type(&self, symbol: &CanonicalSymbol) -> &'static str {
        match symbol.security_type() {
            SecurityType::Equity => "Equity",
            SecurityType::EquityOption => "Equity Option",
            SecurityType::Future => "Future",
            SecurityType::FutureOption => "Future Option",
        }
    }

    fn exchange_time_zone(&self, symbol: &CanonicalSymbol) -> Tz {
        match symbol.security_type() {
            SecurityType::Equity | SecurityType::EquityOption => chrono_tz::America::New_York,
            SecurityType::Future | SecurityType::FutureOption => chrono_tz::America::Chicago,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn mapper() -> TastyTradeSymbolMapper {
        TastyTradeSymbolMapper::new()
    }

    #[test]
    fn equity_maps_to_bare_ticker() {
        let venue = mapper()
            .venue_symbol(&CanonicalSymbol::equity("AAPL"))
            .unwrap();
        assert_eq!(venue, "AAPL");
    }

    #[test]
    fn future_gets_slash_prefix() {
        let venue = mapper()
            .venue_symbol(&CanonicalSymbol::future("ES"))
            .unwrap();
        assert_eq!(venue, "/ES");
    }

    #[test]
    fn equity_option_encoding_matches_venue_format() {
        let expiry = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let symbol = CanonicalSymbol::equity_option(
            "AAPL",
            expiry,
            OptionRight::Call,
            Decimal::new(17250, 2), // 172.50
        );

        let venue = mapper().venue_symbol(&symbol).unwrap();
        assert_eq!(venue, "AAPL  240315C00172500");
    }

    #[test]
    fn future_option_encoding_matches_venue_format() {
        let expiry = NaiveDate::from_ymd_opt(2023, 9, 27).unwrap();
        let symbol = CanonicalSymbol::future_option(
            "ESZ3",
            expiry,
            OptionRight::Put,
            Decimal::from(2975),
        );

        let venue = mapper().venue_symbol(&symbol).unwrap();
        assert_eq!(venue, ".ESZ3 230927P2975");
    }

    #[test]
    fn parse_equity_option_round_trip() {
        let symbol = mapper()
            .canonical_symbol("Equity Option", "AAPL  240315C00172500")
            .unwrap();

        let contract = symbol.contract().unwrap();
        assert_eq!(symbol.ticker(), "AAPL");
        assert_eq!(contract.expiry, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(contract.right, OptionRight::Call);
        assert_eq!(contract.strike, Decimal::new(17250, 2));
    }

    #[test]
    fn parse_future_option_three_part_form() {
        let symbol = mapper()
            .canonical_symbol("Future Option", "./ESZ3 EW4U3 230927P2975")
            .unwrap();

        let contract = symbol.contract().unwrap();
        assert_eq!(symbol.ticker(), "ESZ3");
        assert_eq!(contract.expiry, NaiveDate::from_ymd_opt(2023, 9, 27).unwrap());
        assert_eq!(contract.right, OptionRight::Put);
        assert_eq!(contract.strike, Decimal::from(2975));
    }

    #[test]
    fn parse_future_strips_slash() {
        let symbol = mapper().canonical_symbol("Future", "/ES").unwrap();
        assert_eq!(symbol.ticker(), "ES");
        assert_eq!(symbol.security_type(), SecurityType::Future);
    }

    #[test_case("equity", "AAPL"; "equity lowercase")]
    #[test_case("Equity", "AAPL"; "equity titlecase")]
    #[test_case("EQUITY", "AAPL"; "equity uppercase")]
    fn instrument_type_parse_is_case_insensitive(instrument_type: &str, venue: &str) {
        let symbol = mapper().canonical_symbol(instrument_type, venue).unwrap();
        assert_eq!(symbol.security_type(), SecurityType::Equity);
    }

    #[test]
    fn unknown_instrument_type_is_rejected() {
        assert!(matches!(
            mapper().canonical_symbol("cryptocurrency", "BTC/USD"),
            Err(SymbolError::UnsupportedInstrumentType(_))
        ));
    }

    #[test]
    fn malformed_option_symbol_is_rejected() {
        assert!(matches!(
            mapper().canonical_symbol("Equity Option", "AAPL-240315-C-172.50"),
            Err(SymbolError::Parse { .. })
        ));
    }

    #[test_case(SecurityType::Equity, "Equity")]
    #[test_case(SecurityType::EquityOption, "Equity Option")]
    #[test_case(SecurityType::Future, "Future")]
    #[test_case(SecurityType::FutureOption, "Future Option")]
    fn instrument_type_strings(security_type: SecurityType, expected: &str) {
        let symbol = match security_type {
            SecurityType::Equity => CanonicalSymbol::equity("X"),
            SecurityType::Future => CanonicalSymbol::future("X"),
            SecurityType::EquityOption => CanonicalSymbol::equity_option(
                "X",
                NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
                OptionRight::Call,
                Decimal::from(100),
            ),
            SecurityType::FutureOption => CanonicalSymbol::future_option(
                "X",
                NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
                OptionRight::Call,
                Decimal::from(100),
            ),
        };
        assert_eq!(mapper().venue_instrument_type(&symbol), expected);
    }

    #[test]
    fn exchange_time_zones_by_security_type() {
        let m = mapper();
        assert_eq!(
            m.exchange_time_zone(&CanonicalSymbol::equity("AAPL")),
            chrono_tz::America::New_York
        );
        assert_eq!(
            m.exchange_time_zone(&CanonicalSymbol::future("ES")),
            chrono_tz::America::Chicago
        );
    }

    proptest! {
        #[test]
        fn equity_option_round_trips(
            root in "[A-Z]{1,6}",
            year in 2024u32..2030,
            month in 1u32..=12,
            day in 1u32..=28,
            is_call in any::<bool>(),
            strike_thousandths in 1u64..99_999_999,
        ) {
            let expiry = NaiveDate::from_ymd_opt(year as i32, month, day).unwrap();
            let right = if is_call { OptionRight::Call } else { OptionRight::Put };
            let strike = Decimal::from(strike_thousandths) / Decimal::from(1000);
            let symbol = CanonicalSymbol::equity_option(&root, expiry, right, strike);

            let venue = mapper().venue_symbol(&symbol).unwrap();
            let parsed = mapper().canonical_symbol("Equity Option", &venue).unwrap();

            prop_assert_eq!(parsed, symbol);
        }

        #[test]
        fn equity_round_trips(ticker in "[A-Z]{1,5}") {
            let symbol = CanonicalSymbol::equity(&ticker);
            let venue = mapper().venue_symbol(&symbol).unwrap();
            let parsed = mapper().canonical_symbol("Equity", &venue).unwrap();
            prop_assert_eq!(parsed, symbol);
        }
    }
}
