//! REST Brokerage Integration Tests
//!
//! Order, account, session, and history translation against a wiremock
//! server standing in for the venue's REST API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use wiremock::matchers::{body_json_string, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tastytrade_adapter::infrastructure::tastytrade::rest::RetryConfig;
use tastytrade_adapter::{
    ApiClient, ApiError, CanonicalSymbol, Credentials, EngineNotifier, HistoryData,
    HistoryRequest, HistoryTickType, NewOrder, NotificationKind, OrderStatus, Resolution,
    SessionAuth, StreamTokenProvider, TastyTradeBrokerage, TastyTradeSymbolMapper,
};

#[derive(Default)]
struct RecordingNotifier {
    events: parking_lot::Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    fn count(&self, kind: NotificationKind) -> usize {
        self.events.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl EngineNotifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.events.lock().push((kind, message.to_string()));
    }
}

struct Setup {
    server: MockServer,
    brokerage: TastyTradeBrokerage,
    notifier: Arc<RecordingNotifier>,
}

async fn setup() -> Setup {
    let server = MockServer::start().await;
    let api = Arc::new(
        ApiClient::with_base_url(server.uri())
            .unwrap()
            .with_retry(RetryConfig {
                max_retries: 2,
                initial_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(50),
                multiplier: 2.0,
            }),
    );
    api.set_session_token("session-token");

    let notifier = Arc::new(RecordingNotifier::default());
    let brokerage = TastyTradeBrokerage::new(
        api,
        Arc::new(TastyTradeSymbolMapper::new()),
        notifier.clone(),
        "ACC-1",
    );

    Setup {
        server,
        brokerage,
        notifier,
    }
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn session_login_installs_the_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(body_json_string(r#"{"login":"user","password":"hunter2"}"#))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"session-token": "st-99"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::with_base_url(server.uri()).unwrap();
    let credentials = Credentials::new("user".to_string(), "hunter2".to_string());

    let token = SessionAuth::login(&api, &credentials).await.unwrap();
    assert_eq!(token, "st-99");
    assert_eq!(api.session_token().as_deref(), Some("st-99"));
}

#[tokio::test]
async fn requests_carry_the_session_token_header() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/api-quote-tokens"))
        .and(header("Authorization", "session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "websocket-url": "wss://streamer.tastyworks.com",
            "token": "t1",
        })))
        .expect(1)
        .mount(&setup.server)
        .await;

    let endpoint = setup.brokerage.quote_token().await.unwrap();
    assert_eq!(endpoint.websocket_url, "wss://streamer.tastyworks.com");
    assert_eq!(endpoint.token, "t1");
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn place_order_translates_to_the_venue_request_shape() {
    let setup = setup().await;
    Mock::given(method("POST"))
        .and(path("/accounts/ACC-1/orders"))
        .and(body_partial_json(serde_json::json!({
            "order_type": "Limit",
            "time_in_force": "Day",
            "price": "172.50",
            "price_effect": "Debit",
            "legs": [{
                "instrument_type": "Equity",
                "symbol": "AAPL",
                "action": "Buy",
                "quantity": "10",
            }],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "o-1"})))
        .expect(1)
        .mount(&setup.server)
        .await;

    let order = NewOrder::limit(
        CanonicalSymbol::equity("AAPL"),
        Decimal::from(10),
        Decimal::new(17250, 2),
    );
    let venue_order_id = setup.brokerage.place_order(&order).await.unwrap();
    assert_eq!(venue_order_id, "o-1");
}

#[tokio::test]
async fn rejected_order_surfaces_the_api_error() {
    let setup = setup().await;
    Mock::given(method("POST"))
        .and(path("/accounts/ACC-1/orders"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string("margin check failed"),
        )
        .mount(&setup.server)
        .await;

    let order = NewOrder::market(CanonicalSymbol::equity("AAPL"), Decimal::from(10));
    let error = setup.brokerage.place_order(&order).await.unwrap_err();
    assert!(matches!(
        error,
        ApiError::Api { status: 422, ref message } if message.contains("margin")
    ));
}

#[tokio::test]
async fn cancel_order_hits_the_order_resource() {
    let setup = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/accounts/ACC-1/orders/o-7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&setup.server)
        .await;

    setup.brokerage.cancel_order("o-7").await.unwrap();
}

#[tokio::test]
async fn open_orders_map_to_signed_records() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/accounts/ACC-1/orders/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "o-1",
                "instrument-type": "Equity",
                "symbol": "AAPL",
                "order-side": "Sell",
                "quantity": 25,
                "order-type": "Limit",
                "status": "received",
                "received-at": "2024-03-15T14:30:00Z",
                "limit-price": 172.5,
            },
            {
                "id": "o-2",
                "instrument-type": "Equity",
                "symbol": "MSFT",
                "order-side": "Buy",
                "quantity": 5,
                "order-type": "UnsupportedExotic",
                "status": "received",
                "received-at": "2024-03-15T14:31:00Z",
            },
        ])))
        .mount(&setup.server)
        .await;

    let orders = setup.brokerage.open_orders().await.unwrap();
    // The exotic order type is skipped, not an error.
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].venue_order_id, "o-1");
    assert_eq!(orders[0].quantity, Decimal::from(-25));
    assert_eq!(orders[0].status, OrderStatus::Submitted);
    assert_eq!(orders[0].limit_price, Some(Decimal::new(1725, 1)));
    assert_eq!(
        orders[0].received_at,
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    );
}

// =============================================================================
// Account State
// =============================================================================

#[tokio::test]
async fn holdings_map_positions_to_canonical_symbols() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/accounts/ACC-1/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "instrument-type": "Equity",
                "symbol": "AAPL",
                "quantity": 100,
                "average-open-price": 150.25,
                "mark-price": 172.5,
                "mark": 17250.0,
                "unrealized-day-gain": 222.5,
            },
        ])))
        .mount(&setup.server)
        .await;

    let holdings = setup.brokerage.holdings().await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].symbol, CanonicalSymbol::equity("AAPL"));
    assert_eq!(holdings[0].quantity, Decimal::from(100));
    assert_eq!(holdings[0].average_price, Decimal::new(15025, 2));
}

#[tokio::test]
async fn cash_balances_parse() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/accounts/ACC-1/balances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cash-balance": 25000.50,
            "currency": "USD",
        })))
        .mount(&setup.server)
        .await;

    let balances = setup.brokerage.cash_balances().await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].amount, Decimal::new(2_500_050, 2));
    assert_eq!(balances[0].currency, "USD");
}

// =============================================================================
// Error Handling and Retries
// =============================================================================

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/accounts/ACC-1/balances"))
        .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
        .mount(&setup.server)
        .await;

    let error = setup.brokerage.cash_balances().await.unwrap_err();
    assert!(matches!(error, ApiError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/api-quote-tokens"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&setup.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api-quote-tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "websocket-url": "wss://streamer.tastyworks.com",
            "token": "t2",
        })))
        .expect(1)
        .mount(&setup.server)
        .await;

    let endpoint = setup.brokerage.quote_token().await.unwrap();
    assert_eq!(endpoint.token, "t2");
}

#[tokio::test]
async fn network_failure_exhausts_retries() {
    // Nothing listens on this port.
    let api = ApiClient::with_base_url("http://127.0.0.1:1")
        .unwrap()
        .with_retry(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(10),
            multiplier: 2.0,
        });

    let error = api.get::<serde_json::Value>("/anything").await.unwrap_err();
    assert!(matches!(
        error,
        ApiError::MaxRetriesExceeded { attempts: 2 }
    ));
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_fetches_trade_bars() {
    let setup = setup().await;
    Mock::given(method("GET"))
        .and(path("/equities/history"))
        .and(query_param("symbol", "AAPL"))
        .and(query_param("resolution", "1min"))
        .and(query_param("timeframe", "minute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "time": "2024-03-15T14:30:00Z",
                "open": 100.0, "high": 101.0, "low": 99.5, "close": 100.5,
                "volume": 1200,
            },
        ])))
        .mount(&setup.server)
        .await;

    let request = HistoryRequest {
        symbol: CanonicalSymbol::equity("AAPL"),
        tick_type: HistoryTickType::Trade,
        resolution: Resolution::Minute,
        start: Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 3, 15, 15, 0, 0).unwrap(),
    };
    let data = setup.brokerage.history(&request).await.unwrap();

    assert_eq!(data.len(), 1);
    match &data[0] {
        HistoryData::TradeBar { ohlc, volume, period, .. } => {
            assert_eq!(ohlc.close, Decimal::new(1005, 1));
            assert_eq!(*volume, Decimal::from(1200));
            assert_eq!(*period, Duration::from_secs(60));
        }
        other => panic!("expected trade bar, got {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_history_request_warns_once_and_returns_empty() {
    let setup = setup().await;

    let request = HistoryRequest {
        symbol: CanonicalSymbol::future("ES"),
        tick_type: HistoryTickType::Trade,
        resolution: Resolution::Minute,
        start: Utc::now() - chrono::Duration::hours(1),
        end: Utc::now(),
    };

    assert!(setup.brokerage.history(&request).await.unwrap().is_empty());
    assert!(setup.brokerage.history(&request).await.unwrap().is_empty());

    // The warning is latched: surfaced to the engine exactly once.
    assert_eq!(setup.notifier.count(NotificationKind::Warning), 1);
    // No HTTP call was made for the unsupported security type.
    assert!(setup.server.received_requests().await.unwrap().is_empty());
}
