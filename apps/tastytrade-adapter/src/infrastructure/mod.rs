//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the port interfaces defined in the
//! application layer, plus configuration and observability plumbing.

/// Configuration loaded from environment variables.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// TastyTrade venue adapters (streaming + REST).
pub mod tastytrade;

/// Tracing subscriber initialization.
pub mod telemetry;
