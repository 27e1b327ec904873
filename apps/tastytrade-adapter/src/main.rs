//! Stream Tap Binary
//!
//! Manual smoke tool: authenticates a session, subscribes a list of symbols,
//! and logs every tick until interrupted. Useful for verifying venue
//! connectivity and credentials without booting the whole engine.
//!
//! # Usage
//!
//! ```bash
//! TASTY_USERNAME=... TASTY_PASSWORD=... TASTY_SYMBOLS=AAPL,MSFT \
//!     cargo run -p tastytrade-adapter
//! ```
//!
//! # Environment Variables
//!
//! ## Required (one of)
//! - `TASTY_SESSION_TOKEN`: pre-authenticated session token
//! - `TASTY_USERNAME` / `TASTY_PASSWORD`: session login credentials
//!
//! ## Optional
//! - `TASTY_ENV`: production | sandbox (default: production)
//! - `TASTY_SYMBOLS`: comma-separated equity tickers (default: AAPL)
//! - `TASTY_ACCOUNT_ID`: account number (unused by the tap itself)
//! - `RUST_LOG`: log filter (default: info)

use std::sync::Arc;

use anyhow::Context;

use tastytrade_adapter::infrastructure::tastytrade::{CoordinatorConfig, StreamingCoordinator};
use tastytrade_adapter::{
    AdapterConfig, ApiClient, CanonicalSymbol, DataSink, EngineNotifier, NotificationKind,
    SessionAuth, TastyTradeBrokerage, TastyTradeSymbolMapper, Tick, init_metrics, init_telemetry,
};

/// Sink that logs every tick.
struct LogSink;

impl DataSink for LogSink {
    fn push(&self, tick: Tick) {
        tracing::info!(symbol = %tick.symbol, time = %tick.time, kind = ?tick.kind, "tick");
    }
}

/// Notifier that logs engine-bound events.
struct LogNotifier;

impl EngineNotifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        tracing::info!(?kind, message, "engine notification");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    let _ = dotenvy::dotenv();
    init_telemetry();
    let _metrics_handle = init_metrics();

    let config = AdapterConfig::from_env().context("loading configuration")?;
    tracing::info!(environment = config.environment.as_str(), "Starting stream tap");

    let api = Arc::new(ApiClient::new(config.environment).context("building API client")?);

    let session_token = match (&config.session_token, &config.credentials) {
        (Some(token), _) => {
            api.set_session_token(token);
            token.clone()
        }
        (None, Some(credentials)) => SessionAuth::login(&api, credentials)
            .await
            .context("session login")?,
        (None, None) => anyhow::bail!("no credentials configured"),
    };

    let mapper = Arc::new(TastyTradeSymbolMapper::new());
    let brokerage = Arc::new(TastyTradeBrokerage::new(
        Arc::clone(&api),
        mapper.clone(),
        Arc::new(LogNotifier),
        config.account_id.clone().unwrap_or_default(),
    ));

    let coordinator = StreamingCoordinator::new(
        CoordinatorConfig::new(session_token).with_websocket(config.websocket.clone()),
        brokerage,
        mapper,
        Arc::new(LogSink),
        Arc::new(LogNotifier),
    );

    let symbols: Vec<CanonicalSymbol> = std::env::var("TASTY_SYMBOLS")
        .unwrap_or_else(|_| "AAPL".to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(CanonicalSymbol::equity)
        .collect();

    for symbol in &symbols {
        if coordinator.subscribe(symbol).await {
            tracing::info!(%symbol, "subscribed");
        } else {
            tracing::error!(%symbol, "subscribe failed");
        }
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("Shutting down");
    coordinator.shutdown().await;

    Ok(())
}
