//! Historical Data Retrieval
//!
//! Candle and tick history over the venue's
//! `GET /{endpoint}/history?symbol&resolution&start-time&end-time&timeframe`
//! endpoint. Unsupported request combinations return an empty result after a
//! one-time warning to the engine (latched per condition, so a backfill over
//! thousands of requests does not flood the notifier).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::api_types::CandleDto;
use super::brokerage::TastyTradeBrokerage;
use super::error::ApiError;
use crate::application::ports::NotificationKind;
use crate::domain::symbol::{CanonicalSymbol, SecurityType};

/// Bar resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Individual ticks.
    Tick,
    /// One-second bars.
    Second,
    /// One-minute bars.
    Minute,
    /// One-hour bars.
    Hour,
    /// Daily bars.
    Daily,
}

impl Resolution {
    /// Venue resolution string.
    #[must_use]
    pub const fn venue_name(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Second => "1sec",
            Self::Minute => "1min",
            Self::Hour => "1hour",
            Self::Daily => "1day",
        }
    }

    /// Venue timeframe bucket.
    #[must_use]
    pub const fn timeframe(self) -> &'static str {
        match self {
            Self::Tick | Self::Second | Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Daily => "day",
        }
    }

    /// Bar period.
    #[must_use]
    pub const fn period(self) -> Duration {
        match self {
            Self::Tick => Duration::ZERO,
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(3600),
            Self::Daily => Duration::from_secs(86_400),
        }
    }
}

/// Which side of the book a history request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTickType {
    /// Trade prints / trade candles.
    Trade,
    /// Quote candles.
    Quote,
}

/// One history request.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    /// Symbol to fetch.
    pub symbol: CanonicalSymbol,
    /// Trade or quote data.
    pub tick_type: HistoryTickType,
    /// Bar resolution.
    pub resolution: Resolution,
    /// Inclusive start (UTC).
    pub start: DateTime<Utc>,
    /// Exclusive end (UTC).
    pub end: DateTime<Utc>,
}

/// OHLC of one side of a quote bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ohlc {
    /// Open.
    pub open: Decimal,
    /// High.
    pub high: Decimal,
    /// Low.
    pub low: Decimal,
    /// Close.
    pub close: Decimal,
}

/// One element of a history response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryData {
    /// A trade candle.
    TradeBar {
        /// Bar start time.
        time: DateTime<Utc>,
        /// OHLC prices.
        ohlc: Ohlc,
        /// Traded volume.
        volume: Decimal,
        /// Bar period.
        period: Duration,
    },
    /// A quote candle.
    QuoteBar {
        /// Bar start time.
        time: DateTime<Utc>,
        /// Bid OHLC.
        bid: Ohlc,
        /// Ask OHLC.
        ask: Ohlc,
        /// Bar period.
        period: Duration,
    },
    /// A raw trade tick.
    Tick {
        /// Trade time.
        time: DateTime<Utc>,
        /// Trade price.
        price: Decimal,
        /// Trade size.
        size: Decimal,
    },
}

/// One-time warning latches for unsupported request shapes.
#[derive(Debug, Default)]
pub(super) struct HistoryWarnings {
    unsupported_security_type: AtomicBool,
    equity_trade_fine_resolution: AtomicBool,
    option_tick_type: AtomicBool,
}

impl TastyTradeBrokerage {
    /// Fetch historical data.
    ///
    /// Unsupported security-type / resolution / tick-type combinations yield
    /// `Ok(vec![])` after a one-time warning notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol cannot be mapped or the call fails.
    pub async fn history(&self, request: &HistoryRequest) -> Result<Vec<HistoryData>, ApiError> {
        let Some(endpoint) = self.history_endpoint(request) else {
            return Ok(vec![]);
        };

        let venue_symbol = self
            .mapper()
            .venue_symbol(&request.symbol)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let query = [
            ("symbol", venue_symbol),
            ("resolution", request.resolution.venue_name().to_string()),
            ("start-time", request.start.to_rfc3339()),
            ("end-time", request.end.to_rfc3339()),
            ("timeframe", request.resolution.timeframe().to_string()),
        ];

        let rows: Vec<CandleDto> = self
            .api()
            .get_with_query(&format!("/{endpoint}/history"), &query)
            .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            match convert_row(request, &row) {
                Some(item) => data.push(item),
                None => tracing::warn!(time = %row.time, "Skipping incomplete history row"),
            }
        }
        Ok(data)
    }

    /// Resolve the endpoint for a request, latching a warning and returning
    /// `None` for unsupported combinations.
    fn history_endpoint(&self, request: &HistoryRequest) -> Option<&'static str> {
        match request.symbol.security_type() {
            SecurityType::Equity => {
                if request.tick_type == HistoryTickType::Trade
                    && matches!(request.resolution, Resolution::Tick | Resolution::Second)
                {
                    self.warn_once(
                        &self.history_warnings.equity_trade_fine_resolution,
                        &format!(
                            "resolution {:?} is not supported for equity trade history",
                            request.resolution
                        ),
                    );
                    return None;
                }
                Some("equities")
            }
            SecurityType::EquityOption => {
                if request.tick_type != HistoryTickType::Trade {
                    self.warn_once(
                        &self.history_warnings.option_tick_type,
                        "only trade history is supported for options",
                    );
                    return None;
                }
                Some("option-chains")
            }
            other => {
                self.warn_once(
                    &self.history_warnings.unsupported_security_type,
                    &format!("security type '{other}' is not supported for historical data"),
                );
                None
            }
        }
    }

    fn warn_once(&self, latch: &AtomicBool, message: &str) {
        if !latch.swap(true, Ordering::Relaxed) {
            tracing::warn!(%message, "Unsupported history request");
            self.notifier().notify(NotificationKind::Warning, message);
        }
    }
}

fn convert_row(request: &HistoryRequest, row: &CandleDto) -> Option<HistoryData> {
    match request.tick_type {
        HistoryTickType::Trade if request.resolution == Resolution::Tick => Some(HistoryData::Tick {
            time: row.time,
            price: row.price?,
            size: row.size?,
        }),
        HistoryTickType::Trade => Some(HistoryData::TradeBar {
            time: row.time,
            ohlc: Ohlc {
                open: row.open?,
                high: row.high?,
                low: row.low?,
                close: row.close?,
            },
            volume: row.volume?,
            period: request.resolution.period(),
        }),
        HistoryTickType::Quote => Some(HistoryData::QuoteBar {
            time: row.time,
            bid: Ohlc {
                open: row.bid_open?,
                high: row.bid_high?,
                low: row.bid_low?,
                close: row.bid_close?,
            },
            ask: Ohlc {
                open: row.ask_open?,
                high: row.ask_high?,
                low: row.ask_low?,
                close: row.ask_close?,
            },
            period: request.resolution.period(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Resolution::Tick, "tick", "minute")]
    #[test_case(Resolution::Second, "1sec", "minute")]
    #[test_case(Resolution::Minute, "1min", "minute")]
    #[test_case(Resolution::Hour, "1hour", "hour")]
    #[test_case(Resolution::Daily, "1day", "day")]
    fn resolution_mapping(resolution: Resolution, venue: &str, timeframe: &str) {
        assert_eq!(resolution.venue_name(), venue);
        assert_eq!(resolution.timeframe(), timeframe);
    }

    #[test]
    fn bar_periods() {
        assert_eq!(Resolution::Minute.period(), Duration::from_secs(60));
        assert_eq!(Resolution::Daily.period(), Duration::from_secs(86_400));
        assert_eq!(Resolution::Tick.period(), Duration::ZERO);
    }

    fn row(time: DateTime<Utc>) -> CandleDto {
        CandleDto {
            time,
            open: Some(Decimal::from(10)),
            high: Some(Decimal::from(12)),
            low: Some(Decimal::from(9)),
            close: Some(Decimal::from(11)),
            volume: Some(Decimal::from(1000)),
            price: Some(Decimal::from(11)),
            size: Some(Decimal::from(5)),
            ask_open: Some(Decimal::from(10)),
            ask_high: Some(Decimal::from(12)),
            ask_low: Some(Decimal::from(9)),
            ask_close: Some(Decimal::from(11)),
            bid_open: Some(Decimal::from(10)),
            bid_high: Some(Decimal::from(12)),
            bid_low: Some(Decimal::from(9)),
            bid_close: Some(Decimal::from(11)),
        }
    }

    fn request(tick_type: HistoryTickType, resolution: Resolution) -> HistoryRequest {
        HistoryRequest {
            symbol: CanonicalSymbol::equity("AAPL"),
            tick_type,
            resolution,
            start: Utc::now(),
            end: Utc::now(),
        }
    }

    #[test]
    fn trade_rows_become_trade_bars() {
        let now = Utc::now();
        let converted = convert_row(&request(HistoryTickType::Trade, Resolution::Minute), &row(now));

        match converted {
            Some(HistoryData::TradeBar { time, ohlc, volume, period }) => {
                assert_eq!(time, now);
                assert_eq!(ohlc.high, Decimal::from(12));
                assert_eq!(volume, Decimal::from(1000));
                assert_eq!(period, Duration::from_secs(60));
            }
            other => panic!("expected trade bar, got {other:?}"),
        }
    }

    #[test]
    fn tick_resolution_yields_raw_ticks() {
        let now = Utc::now();
        let converted = convert_row(&request(HistoryTickType::Trade, Resolution::Tick), &row(now));

        assert!(matches!(
            converted,
            Some(HistoryData::Tick { price, size, .. })
                if price == Decimal::from(11) && size == Decimal::from(5)
        ));
    }

    #[test]
    fn quote_rows_become_quote_bars() {
        let now = Utc::now();
        let converted = convert_row(&request(HistoryTickType::Quote, Resolution::Hour), &row(now));

        assert!(matches!(
            converted,
            Some(HistoryData::QuoteBar { period, .. }) if period == Duration::from_secs(3600)
        ));
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let mut incomplete = row(Utc::now());
        incomplete.volume = None;

        let converted = convert_row(
            &request(HistoryTickType::Trade, Resolution::Minute),
            &incomplete,
        );
        assert!(converted.is_none());
    }
}
