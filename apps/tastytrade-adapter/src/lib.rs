#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! TastyTrade Brokerage Adapter
//!
//! Connects the trading engine to TastyTrade: session/OAuth authentication,
//! order routing, positions/balances/history over REST, and real-time
//! quote/trade streaming over per-symbol WebSocket connections with bounded
//! exponential-backoff reconnection.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Canonical symbols, ticks, orders, and the concurrent
//!   subscription registry
//! - **Application**: Port definitions (`StreamTokenProvider`,
//!   `SymbolMapper`, `DataSink`, `EngineNotifier`)
//! - **Infrastructure**: TastyTrade WebSocket and REST adapters,
//!   configuration, telemetry, metrics
//!
//! # Streaming Data Flow
//!
//! ```text
//! subscribe(symbol)
//!     │  venue symbol + exchange tz (SymbolMapper)
//!     │  registry insert
//!     │  {websocket-url, token}   (StreamTokenProvider, REST)
//!     ▼
//! quote socket ─┐                        ┌──────────────┐
//!               ├─► decode ─► registry ─►│   DataSink   │─► engine
//! trade socket ─┘   lookup               └──────────────┘
//! ```
//!
//! Connection drops are retried per-connection with bounded exponential
//! backoff; exhaustion removes the subscription and surfaces exactly one
//! fatal notification through the `EngineNotifier` port.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core value types with no venue dependencies.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Venue adapters and integration plumbing.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::account::{CashBalance, Holding};
pub use domain::market_data::{QuoteSnapshot, Tick, TickKind};
pub use domain::order::{
    NewOrder, OrderRecord, OrderSide, OrderStatus, OrderType, PriceEffect, TimeInForce,
};
pub use domain::subscription::{Subscription, SubscriptionRegistry, TickTypes};
pub use domain::symbol::{CanonicalSymbol, OptionContract, OptionRight, SecurityType};

// Ports
pub use application::ports::{
    DataSink, EngineNotifier, NotificationKind, StreamEndpoint, StreamTokenProvider, SymbolError,
    SymbolMapper, TokenError,
};

// Infrastructure config
pub use infrastructure::config::{
    AdapterConfig, ConfigError, Credentials, Environment, WebSocketSettings,
};

// Venue adapters
pub use infrastructure::tastytrade::{
    ApiClient, ApiError, CoordinatorConfig, JsonCodec, ReconnectConfig, ReconnectPolicy,
    SessionAuth, StreamingCoordinator, TastyTradeBrokerage, TastyTradeSymbolMapper,
};

// History types
pub use infrastructure::tastytrade::rest::{HistoryData, HistoryRequest, HistoryTickType, Resolution};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
