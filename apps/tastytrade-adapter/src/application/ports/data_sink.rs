//! Data Sink Port (Driven Port)
//!
//! Consumer of normalized ticks. The engine's data aggregator sits behind
//! this trait.

use crate::domain::market_data::Tick;

/// Tick consumer.
///
/// `push` is assumed non-blocking (or internally buffered) and must tolerate
/// concurrent calls from multiple connections. The streaming core does not
/// retry on sink failure; implementations log and move on.
#[cfg_attr(test, mockall::automock)]
pub trait DataSink: Send + Sync {
    /// Deliver one tick.
    fn push(&self, tick: Tick);
}
