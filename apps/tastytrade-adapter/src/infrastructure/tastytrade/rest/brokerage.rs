//! Brokerage REST Adapter
//!
//! Order routing and account state against the venue's REST API, plus the
//! [`StreamTokenProvider`] implementation the streaming coordinator uses to
//! obtain `{websocket-url, token}` grants.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::api_types::{
    BalanceDto, OrderDto, OrderLegRequest, OrderRequest, PlaceOrderResponse, PositionDto,
    QuoteDto, QuoteTokenResponse,
};
use super::client::ApiClient;
use super::error::ApiError;
use super::history::HistoryWarnings;
use crate::application::ports::{
    EngineNotifier, StreamEndpoint, StreamTokenProvider, SymbolMapper, TokenError,
};
use crate::domain::account::{CashBalance, Holding};
use crate::domain::market_data::QuoteSnapshot;
use crate::domain::order::{NewOrder, OrderRecord, OrderStatus, OrderType, PriceEffect};
use crate::domain::symbol::{CanonicalSymbol, OptionRight};

/// REST brokerage adapter.
pub struct TastyTradeBrokerage {
    api: Arc<ApiClient>,
    mapper: Arc<dyn SymbolMapper>,
    notifier: Arc<dyn EngineNotifier>,
    account_id: String,
    pub(super) history_warnings: HistoryWarnings,
}

impl TastyTradeBrokerage {
    /// Create an adapter for one account.
    pub fn new(
        api: Arc<ApiClient>,
        mapper: Arc<dyn SymbolMapper>,
        notifier: Arc<dyn EngineNotifier>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            mapper,
            notifier,
            account_id: account_id.into(),
            history_warnings: HistoryWarnings::default(),
        }
    }

    pub(super) fn api(&self) -> &ApiClient {
        &self.api
    }

    pub(super) fn mapper(&self) -> &dyn SymbolMapper {
        self.mapper.as_ref()
    }

    pub(super) fn notifier(&self) -> &dyn EngineNotifier {
        self.notifier.as_ref()
    }

    /// Place an order. Returns the venue-assigned order id.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol cannot be mapped, the venue rejects the
    /// order, or the call fails.
    pub async fn place_order(&self, order: &NewOrder) -> Result<String, ApiError> {
        let request = self.order_request(order)?;

        tracing::info!(
            symbol = %order.symbol,
            order_type = request.order_type,
            quantity = %order.quantity,
            price = ?request.price,
            "Placing order"
        );

        let response: PlaceOrderResponse = self
            .api
            .post(&format!("/accounts/{}/orders", self.account_id), &request)
            .await?;

        tracing::info!(venue_order_id = %response.id, "Order placed");
        Ok(response.id)
    }

    /// Replace a working order.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol cannot be mapped or the venue rejects
    /// the update.
    pub async fn update_order(
        &self,
        venue_order_id: &str,
        order: &NewOrder,
    ) -> Result<(), ApiError> {
        let request = self.order_request(order)?;
        let _: serde_json::Value = self
            .api
            .put(
                &format!("/accounts/{}/orders/{venue_order_id}", self.account_id),
                &request,
            )
            .await?;

        tracing::info!(venue_order_id, "Order updated");
        Ok(())
    }

    /// Cancel a working order.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue rejects the cancellation.
    pub async fn cancel_order(&self, venue_order_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&format!(
                "/accounts/{}/orders/{venue_order_id}",
                self.account_id
            ))
            .await?;

        tracing::info!(venue_order_id, "Order cancelled");
        Ok(())
    }

    /// Fetch all live orders.
    ///
    /// Orders of types the engine does not model are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn open_orders(&self) -> Result<Vec<OrderRecord>, ApiError> {
        let orders: Vec<OrderDto> = self
            .api
            .get(&format!("/accounts/{}/orders/live", self.account_id))
            .await?;

        let mut records = Vec::with_capacity(orders.len());
        for dto in orders {
            match self.order_record(dto) {
                Ok(record) => records.push(record),
                Err(reason) => tracing::warn!(%reason, "Skipping unconvertible order"),
            }
        }
        Ok(records)
    }

    /// Fetch current positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn holdings(&self) -> Result<Vec<Holding>, ApiError> {
        let positions: Vec<PositionDto> = self
            .api
            .get(&format!("/accounts/{}/positions", self.account_id))
            .await?;

        let mut holdings = Vec::with_capacity(positions.len());
        for dto in positions {
            match self
                .mapper
                .canonical_symbol(&dto.instrument_type, &dto.symbol)
            {
                Ok(symbol) => holdings.push(Holding {
                    symbol,
                    quantity: dto.quantity,
                    average_price: dto.average_open_price,
                    mark_price: dto.mark_price,
                    market_value: dto.mark,
                    unrealized_pnl: dto.unrealized_day_gain,
                }),
                Err(e) => {
                    tracing::warn!(symbol = %dto.symbol, error = %e, "Skipping unmappable position");
                }
            }
        }
        Ok(holdings)
    }

    /// Fetch cash balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn cash_balances(&self) -> Result<Vec<CashBalance>, ApiError> {
        let balance: BalanceDto = self
            .api
            .get(&format!("/accounts/{}/balances", self.account_id))
            .await?;

        Ok(vec![CashBalance::new(balance.cash_balance, balance.currency)])
    }

    /// Fetch a point-in-time quote snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol cannot be mapped or the call fails.
    pub async fn latest_quote(&self, symbol: &CanonicalSymbol) -> Result<QuoteSnapshot, ApiError> {
        let venue_symbol = self
            .mapper
            .venue_symbol(symbol)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let quote: QuoteDto = self
            .api
            .get(&format!("/quote-tokens/{venue_symbol}"))
            .await?;

        Ok(QuoteSnapshot {
            symbol: symbol.clone(),
            time: Utc::now(),
            bid_price: quote.bid_price,
            ask_price: quote.ask_price,
            bid_size: quote.bid_size,
            ask_size: quote.ask_size,
        })
    }

    fn order_request(&self, order: &NewOrder) -> Result<OrderRequest, ApiError> {
        let venue_symbol = self
            .mapper
            .venue_symbol(&order.symbol)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(OrderRequest {
            order_type: order.order_type.venue_name().to_string(),
            time_in_force: order.time_in_force.venue_name().to_string(),
            price: order.venue_price(),
            price_effect: PriceEffect::of_quantity(order.quantity)
                .venue_name()
                .to_string(),
            legs: vec![OrderLegRequest {
                instrument_type: self.mapper.venue_instrument_type(&order.symbol).to_string(),
                symbol: venue_symbol,
                action: order.side().venue_action().to_string(),
                quantity: order.quantity.abs(),
            }],
        })
    }

    fn order_record(&self, dto: OrderDto) -> Result<OrderRecord, String> {
        let order_type = OrderType::from_venue(&dto.order_type)
            .ok_or_else(|| format!("unsupported order type {:?}", dto.order_type))?;

        // Option orders carry their contract terms as separate fields with
        // the underlying ticker in `symbol`.
        let symbol = if dto.instrument_type.eq_ignore_ascii_case("equity option") {
            match (dto.expiration_date, dto.strike_price, dto.option_type.as_deref()) {
                (Some(expiry), Some(strike), Some(option_type)) => {
                    let right = option_type
                        .chars()
                        .next()
                        .and_then(OptionRight::from_code)
                        .ok_or_else(|| format!("invalid option type {option_type:?}"))?;
                    CanonicalSymbol::equity_option(&dto.symbol, expiry, right, strike)
                }
                _ => self
                    .mapper
                    .canonical_symbol(&dto.instrument_type, &dto.symbol)
                    .map_err(|e| e.to_string())?,
            }
        } else {
            self.mapper
                .canonical_symbol(&dto.instrument_type, &dto.symbol)
                .map_err(|e| e.to_string())?
        };

        let quantity = if dto.order_side == "Buy" {
            dto.quantity
        } else {
            -dto.quantity
        };

        Ok(OrderRecord {
            venue_order_id: dto.id,
            symbol,
            quantity,
            order_type,
            limit_price: dto.limit_price,
            stop_price: dto.stop_price,
            status: OrderStatus::from_venue(&dto.status),
            received_at: dto.received_at,
        })
    }
}

#[async_trait]
impl StreamTokenProvider for TastyTradeBrokerage {
    async fn quote_token(&self) -> Result<StreamEndpoint, TokenError> {
        let grant: QuoteTokenResponse = self
            .api
            .get("/api-quote-tokens")
            .await
            .map_err(TokenError::from)?;

        Ok(StreamEndpoint {
            websocket_url: grant.websocket_url,
            token: grant.token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockEngineNotifier;
    use crate::domain::order::TimeInForce;
    use crate::infrastructure::tastytrade::symbols::TastyTradeSymbolMapper;
    use rust_decimal::Decimal;

    fn brokerage() -> TastyTradeBrokerage {
        #[allow(clippy::unwrap_used)]
        let api = Arc::new(ApiClient::with_base_url("http://127.0.0.1:1").unwrap());
        TastyTradeBrokerage::new(
            api,
            Arc::new(TastyTradeSymbolMapper::new()),
            Arc::new(MockEngineNotifier::new()),
            "ACC-1",
        )
    }

    #[test]
    fn order_request_translation_for_buy_limit() {
        let order = NewOrder::limit(
            CanonicalSymbol::equity("AAPL"),
            Decimal::from(10),
            Decimal::new(17250, 2),
        );

        let request = brokerage().order_request(&order).unwrap();
        assert_eq!(request.order_type, "Limit");
        assert_eq!(request.time_in_force, "Day");
        assert_eq!(request.price, Some(Decimal::new(17250, 2)));
        assert_eq!(request.price_effect, "Debit");
        assert_eq!(request.legs.len(), 1);
        assert_eq!(request.legs[0].action, "Buy");
        assert_eq!(request.legs[0].symbol, "AAPL");
        assert_eq!(request.legs[0].quantity, Decimal::from(10));
    }

    #[test]
    fn order_request_translation_for_sell_is_credit_with_abs_quantity() {
        let order = NewOrder::market(CanonicalSymbol::equity("MSFT"), Decimal::from(-5));

        let request = brokerage().order_request(&order).unwrap();
        assert_eq!(request.price_effect, "Credit");
        assert_eq!(request.legs[0].action, "Sell");
        assert_eq!(request.legs[0].quantity, Decimal::from(5));
        assert!(request.price.is_none());
    }

    #[test]
    fn gtc_time_in_force_is_translated() {
        let mut order = NewOrder::market(CanonicalSymbol::equity("MSFT"), Decimal::from(1));
        order.time_in_force = TimeInForce::Gtc;

        let request = brokerage().order_request(&order).unwrap();
        assert_eq!(request.time_in_force, "GTC");
    }

    #[test]
    fn order_record_signs_sell_quantity() {
        let dto = OrderDto {
            id: "o-1".to_string(),
            instrument_type: "Equity".to_string(),
            symbol: "AAPL".to_string(),
            order_side: "Sell".to_string(),
            quantity: Decimal::from(7),
            order_type: "Market".to_string(),
            status: "received".to_string(),
            received_at: Utc::now(),
            limit_price: None,
            stop_price: None,
            expiration_date: None,
            strike_price: None,
            option_type: None,
        };

        let record = brokerage().order_record(dto).unwrap();
        assert_eq!(record.quantity, Decimal::from(-7));
        assert_eq!(record.status, OrderStatus::Submitted);
        assert_eq!(record.order_type, OrderType::Market);
    }

    #[test]
    fn order_record_builds_option_symbol_from_contract_fields() {
        let dto = OrderDto {
            id: "o-2".to_string(),
            instrument_type: "Equity Option".to_string(),
            symbol: "AAPL".to_string(),
            order_side: "Buy".to_string(),
            quantity: Decimal::from(1),
            order_type: "Limit".to_string(),
            status: "received".to_string(),
            received_at: Utc::now(),
            limit_price: Some(Decimal::new(550, 2)),
            stop_price: None,
            expiration_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15),
            strike_price: Some(Decimal::new(17250, 2)),
            option_type: Some("C".to_string()),
        };

        let record = brokerage().order_record(dto).unwrap();
        let contract = record.symbol.contract().unwrap();
        assert_eq!(record.symbol.ticker(), "AAPL");
        assert_eq!(contract.right, OptionRight::Call);
        assert_eq!(contract.strike, Decimal::new(17250, 2));
    }

    #[test]
    fn order_record_rejects_unknown_order_type() {
        let dto = OrderDto {
            id: "o-3".to_string(),
            instrument_type: "Equity".to_string(),
            symbol: "AAPL".to_string(),
            order_side: "Buy".to_string(),
            quantity: Decimal::from(1),
            order_type: "TrailingStop".to_string(),
            status: "received".to_string(),
            received_at: Utc::now(),
            limit_price: None,
            stop_price: None,
            expiration_date: None,
            strike_price: None,
            option_type: None,
        };

        assert!(brokerage().order_record(dto).is_err());
    }
}
