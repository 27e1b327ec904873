//! TastyTrade Venue Adapters
//!
//! Streaming side: per-symbol WebSocket connections with decode, bounded
//! reconnection, and the coordinator that wires everything to the engine
//! ports. REST side: session/OAuth authentication, orders, positions,
//! balances, history.

pub mod codec;
pub mod coordinator;
pub mod messages;
pub mod reconnect;
pub mod rest;
pub mod stream;
pub mod symbols;

pub use codec::{CodecError, JsonCodec};
pub use coordinator::{CoordinatorConfig, StreamingCoordinator};
pub use messages::{QuoteMessage, StreamAuthRequest, StreamAuthResponse, StreamMessage, TradeMessage};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use rest::{ApiClient, ApiError, OAuthTokens, SessionAuth, TastyTradeBrokerage};
pub use stream::{
    ConnectionEvent, ConnectionKey, ConnectionState, StreamChannel, StreamConfig, StreamConnection,
    StreamError, StreamEvent,
};
pub use symbols::TastyTradeSymbolMapper;
