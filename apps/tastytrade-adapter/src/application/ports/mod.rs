//! Port Interfaces
//!
//! Boundary contracts following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (consumed by the streaming core)
//!
//! - [`StreamTokenProvider`]: REST boundary handing out `{websocket-url, token}`
//! - [`SymbolMapper`]: canonical ⇄ venue symbol translation
//! - [`DataSink`]: tick consumer (the engine's data aggregator)
//! - [`EngineNotifier`]: lifecycle/error notifications to the engine

mod data_sink;
mod engine_notifier;
mod stream_token;
mod symbol_mapper;

pub use data_sink::DataSink;
pub use engine_notifier::{EngineNotifier, NotificationKind};
pub use stream_token::{StreamEndpoint, StreamTokenProvider, TokenError};
pub use symbol_mapper::{SymbolError, SymbolMapper};

#[cfg(test)]
pub use data_sink::MockDataSink;
#[cfg(test)]
pub use engine_notifier::MockEngineNotifier;
#[cfg(test)]
pub use stream_token::MockStreamTokenProvider;
#[cfg(test)]
pub use symbol_mapper::MockSymbolMapper;
