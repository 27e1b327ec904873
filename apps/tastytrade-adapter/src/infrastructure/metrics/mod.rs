//! Prometheus Metrics Module
//!
//! Exposes adapter metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Ticks**: quotes/trades dispatched to the data sink
//! - **Streams**: connection counts and reconnect attempts
//! - **Errors**: decode failures and silently dropped messages

use std::sync::OnceLock;

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Ticks delivered to the data sink.
pub const TICKS_DISPATCHED: &str = "tastytrade_ticks_dispatched_total";

/// Wire messages that failed to decode and were dropped.
pub const DECODE_ERRORS: &str = "tastytrade_decode_errors_total";

/// Messages dropped because their subscription was already removed.
pub const REGISTRY_MISSES: &str = "tastytrade_registry_misses_total";

/// Reconnect attempts scheduled.
pub const RECONNECT_ATTEMPTS: &str = "tastytrade_reconnect_attempts_total";

/// Subscriptions abandoned after exhausting reconnect attempts.
pub const RECONNECTS_EXHAUSTED: &str = "tastytrade_reconnects_exhausted_total";

/// Currently active subscriptions.
pub const ACTIVE_SUBSCRIPTIONS: &str = "tastytrade_active_subscriptions";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Idempotent: repeated calls return the same handle.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            #[allow(clippy::expect_used)]
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

fn register_metrics() {
    describe_counter!(TICKS_DISPATCHED, "Ticks delivered to the data sink");
    describe_counter!(DECODE_ERRORS, "Wire messages that failed to decode");
    describe_counter!(
        REGISTRY_MISSES,
        "Messages dropped for already-removed subscriptions"
    );
    describe_counter!(RECONNECT_ATTEMPTS, "Reconnect attempts scheduled");
    describe_counter!(
        RECONNECTS_EXHAUSTED,
        "Subscriptions abandoned after exhausting reconnects"
    );
    describe_gauge!(ACTIVE_SUBSCRIPTIONS, "Currently active subscriptions");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_metrics_is_idempotent() {
        let first = init_metrics();
        let second = init_metrics();
        // Both handles render from the same recorder.
        let _ = (first.render(), second.render());
    }
}
