//! Streaming Coordinator
//!
//! The subsystem root for live market data. On subscribe it resolves the
//! venue symbol and exchange time zone, registers the subscription, obtains
//! a stream endpoint grant over the REST boundary, opens the per-symbol
//! quote/trade connections, and wires decoded messages through the registry
//! into the data sink. On unsubscribe it tears the connections down and
//! clears the registry entry. Connection drops are retried with bounded
//! exponential backoff; exhaustion surfaces exactly one fatal notification
//! and removes the subscription.
//!
//! All collaborators are constructor-injected; events from every connection
//! drain through one coordinator-owned channel, so dispatch for a given
//! symbol preserves its connection's frame order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use super::stream::{
    ConnectionEvent, ConnectionKey, StreamChannel, StreamConfig, StreamConnection, StreamEvent,
};
use crate::application::ports::{
    DataSink, EngineNotifier, NotificationKind, StreamEndpoint, StreamTokenProvider, SymbolMapper,
};
use crate::domain::market_data::Tick;
use crate::domain::subscription::{Subscription, SubscriptionRegistry, TickTypes};
use crate::domain::symbol::CanonicalSymbol;
use crate::infrastructure::config::WebSocketSettings;
use crate::infrastructure::metrics::{
    ACTIVE_SUBSCRIPTIONS, RECONNECT_ATTEMPTS, RECONNECTS_EXHAUSTED, REGISTRY_MISSES,
    TICKS_DISPATCHED,
};
use crate::infrastructure::tastytrade::messages::{QuoteMessage, StreamMessage, TradeMessage};

/// Buffered events per coordinator before producers back-pressure.
const EVENT_BUFFER: usize = 1024;

/// Configuration for the streaming coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Session token sent in every connection's auth frame.
    pub session_token: String,
    /// WebSocket and reconnection tunables.
    pub websocket: WebSocketSettings,
}

impl CoordinatorConfig {
    /// Create a configuration with default WebSocket settings.
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            websocket: WebSocketSettings::default(),
        }
    }

    /// Override the WebSocket settings.
    #[must_use]
    pub fn with_websocket(mut self, websocket: WebSocketSettings) -> Self {
        self.websocket = websocket;
        self
    }
}

struct ConnectionSlot {
    connection: Arc<StreamConnection>,
    policy: ReconnectPolicy,
}

/// Streaming subsystem root. Cheap to clone handles are not provided; share
/// via `Arc` if multiple owners need it.
pub struct StreamingCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    config: CoordinatorConfig,
    reconnect: ReconnectConfig,
    registry: SubscriptionRegistry,
    tokens: Arc<dyn StreamTokenProvider>,
    mapper: Arc<dyn SymbolMapper>,
    sink: Arc<dyn DataSink>,
    notifier: Arc<dyn EngineNotifier>,
    connections: Mutex<HashMap<ConnectionKey, ConnectionSlot>>,
    events_tx: mpsc::Sender<ConnectionEvent>,
    cancel: CancellationToken,
}

impl StreamingCoordinator {
    /// Create a coordinator and start its event loop.
    #[must_use]
    pub fn new(
        config: CoordinatorConfig,
        tokens: Arc<dyn StreamTokenProvider>,
        mapper: Arc<dyn SymbolMapper>,
        sink: Arc<dyn DataSink>,
        notifier: Arc<dyn EngineNotifier>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let reconnect = ReconnectConfig::from_websocket_settings(&config.websocket);

        let inner = Arc::new(Inner {
            config,
            reconnect,
            registry: SubscriptionRegistry::new(),
            tokens,
            mapper,
            sink,
            notifier,
            connections: Mutex::new(HashMap::new()),
            events_tx,
            cancel: CancellationToken::new(),
        });

        tokio::spawn(Inner::run(Arc::clone(&inner), events_rx));

        Self { inner }
    }

    /// Subscribe a symbol for quotes and trades.
    ///
    /// Returns `false` — with no partial registration left behind — if any
    /// step before a confirmed open connection fails. Subscribing an
    /// already-subscribed symbol is an idempotent no-op returning `true`.
    pub async fn subscribe(&self, symbol: &CanonicalSymbol) -> bool {
        self.subscribe_with_types(symbol, TickTypes::all()).await
    }

    /// Subscribe a symbol for a specific set of tick types.
    pub async fn subscribe_with_types(&self, symbol: &CanonicalSymbol, types: TickTypes) -> bool {
        let inner = &self.inner;

        let venue_symbol = match inner.mapper.venue_symbol(symbol) {
            Ok(venue) => venue,
            Err(e) => {
                tracing::warn!(%symbol, error = %e, "Cannot subscribe unmappable symbol");
                return false;
            }
        };

        let subscription = Subscription {
            symbol: symbol.clone(),
            venue_symbol: venue_symbol.clone(),
            exchange_time_zone: inner.mapper.exchange_time_zone(symbol),
            tick_types: types,
        };

        // Register before connecting so a concurrent subscribe of the same
        // symbol cannot open a second connection set.
        if !inner.registry.insert(subscription) {
            tracing::debug!(%symbol, "Already subscribed");
            return true;
        }
        inner.update_subscription_gauge();

        match inner.open_symbol_streams(&venue_symbol, types).await {
            Ok(slots) => {
                // A terminal event (auth rejection, unsubscribe) may have
                // removed the registration while the sockets were opening.
                if !inner.registry.contains(symbol) {
                    for (_, slot) in slots {
                        slot.connection.close().await;
                    }
                    return false;
                }
                inner.connections.lock().extend(slots);
                tracing::info!(%symbol, venue = %venue_symbol, "Subscribed");
                inner
                    .notifier
                    .notify(NotificationKind::Connected, &format!("{symbol} streaming"));
                true
            }
            Err(reason) => {
                inner.registry.remove(symbol);
                inner.update_subscription_gauge();
                tracing::warn!(%symbol, %reason, "Subscribe failed");
                false
            }
        }
    }

    /// Unsubscribe a symbol.
    ///
    /// Socket teardown is best-effort: close errors are logged, never
    /// propagated, and the registry entry is cleared regardless. Always
    /// returns `true`; unsubscribing an unknown symbol is a safe no-op.
    pub async fn unsubscribe(&self, symbol: &CanonicalSymbol) -> bool {
        let inner = &self.inner;

        let Some(subscription) = inner.registry.remove(symbol) else {
            tracing::debug!(%symbol, "Unsubscribe of inactive symbol ignored");
            return true;
        };
        inner.update_subscription_gauge();

        let slots = inner.take_symbol_slots(&subscription.venue_symbol);
        for slot in slots {
            slot.connection.close().await;
        }

        tracing::info!(%symbol, "Unsubscribed");
        true
    }

    /// Check whether a symbol is actively subscribed.
    #[must_use]
    pub fn is_subscribed(&self, symbol: &CanonicalSymbol) -> bool {
        self.inner.registry.contains(symbol)
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Number of live connections (one symbol usually holds two: quote and
    /// trade).
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    /// Shut the subsystem down: cancel the event loop, close every
    /// connection (bounded), and clear the registry.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        inner.cancel.cancel();

        let slots: Vec<ConnectionSlot> = {
            let mut connections = inner.connections.lock();
            connections.drain().map(|(_, slot)| slot).collect()
        };
        for slot in slots {
            slot.connection.close().await;
        }

        inner.registry.drain();
        inner.update_subscription_gauge();
        tracing::info!("Streaming coordinator shut down");
    }
}

impl Inner {
    /// Drain connection events until shutdown.
    async fn run(inner: Arc<Self>, mut events: mpsc::Receiver<ConnectionEvent>) {
        loop {
            tokio::select! {
                () = inner.cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => Self::handle_event(&inner, event).await,
                    None => break,
                },
            }
        }
    }

    async fn handle_event(inner: &Arc<Self>, event: ConnectionEvent) {
        match event.event {
            StreamEvent::Message(StreamMessage::Quote(quote)) => {
                inner.dispatch_quote(&event.key, &quote);
            }
            StreamEvent::Message(StreamMessage::Trade(trade)) => {
                inner.dispatch_trade(&event.key, &trade);
            }
            StreamEvent::Message(StreamMessage::AuthResponse(_)) => {
                tracing::debug!(connection = %event.key, "Stream authentication acknowledged");
            }
            StreamEvent::AuthRejected(reason) => {
                // Retrying with the same credential cannot succeed.
                inner
                    .fail_subscription(
                        &event.key,
                        NotificationKind::Error,
                        &format!("stream authentication rejected: {reason}"),
                    )
                    .await;
            }
            StreamEvent::Disconnected { reason } => {
                Self::handle_disconnect(inner, event.key, reason).await;
            }
        }
    }

    fn dispatch_quote(&self, key: &ConnectionKey, quote: &QuoteMessage) {
        let venue_symbol = quote.symbol.as_deref().unwrap_or(&key.venue_symbol);
        // A miss means the subscription raced an unsubscribe; drop silently.
        let Some(subscription) = self.registry.lookup(venue_symbol) else {
            metrics::counter!(REGISTRY_MISSES).increment(1);
            tracing::trace!(venue = venue_symbol, "Dropping quote for removed subscription");
            return;
        };
        if !subscription.tick_types.quotes {
            return;
        }

        let tick = Tick::quote(
            &subscription,
            Utc::now(),
            quote.bid_price,
            quote.bid_size,
            quote.ask_price,
            quote.ask_size,
        );
        self.sink.push(tick);
        metrics::counter!(TICKS_DISPATCHED, "kind" => "quote").increment(1);
    }

    fn dispatch_trade(&self, key: &ConnectionKey, trade: &TradeMessage) {
        let venue_symbol = trade.symbol.as_deref().unwrap_or(&key.venue_symbol);
        let Some(subscription) = self.registry.lookup(venue_symbol) else {
            metrics::counter!(REGISTRY_MISSES).increment(1);
            tracing::trace!(venue = venue_symbol, "Dropping trade for removed subscription");
            return;
        };
        if !subscription.tick_types.trades {
            return;
        }

        let tick = Tick::trade(&subscription, Utc::now(), trade.price, trade.size);
        self.sink.push(tick);
        metrics::counter!(TICKS_DISPATCHED, "kind" => "trade").increment(1);
    }

    async fn handle_disconnect(inner: &Arc<Self>, key: ConnectionKey, reason: String) {
        if inner.cancel.is_cancelled() {
            return;
        }
        if inner.registry.lookup(&key.venue_symbol).is_none() {
            // The subscription is gone; this drop needs no recovery.
            inner.connections.lock().remove(&key);
            return;
        }

        let decision = {
            let mut connections = inner.connections.lock();
            connections
                .get_mut(&key)
                .map(|slot| (slot.policy.next_delay(), slot.policy.attempt_count()))
        };
        let Some((delay, attempt)) = decision else {
            return;
        };

        match delay {
            Some(delay) => {
                metrics::counter!(RECONNECT_ATTEMPTS).increment(1);
                tracing::info!(
                    connection = %key,
                    attempt,
                    delay_ms = delay.as_millis(),
                    %reason,
                    "Scheduling reconnect"
                );
                inner.notifier.notify(
                    NotificationKind::Reconnecting,
                    &format!("{key} reconnect attempt {attempt}"),
                );

                let inner = Arc::clone(inner);
                tokio::spawn(async move {
                    tokio::select! {
                        () = inner.cancel.cancelled() => {}
                        () = tokio::time::sleep(delay) => inner.attempt_reconnect(key).await,
                    }
                });
            }
            None => {
                metrics::counter!(RECONNECTS_EXHAUSTED).increment(1);
                inner
                    .fail_subscription(
                        &key,
                        NotificationKind::ReconnectExhausted,
                        &format!("reconnect attempts exhausted for {key}: {reason}"),
                    )
                    .await;
            }
        }
    }

    /// Re-run the subscribe-time connect steps for one connection: fresh
    /// endpoint grant, fresh socket. Failure feeds a synthetic disconnect
    /// back into the event queue so the policy decides again.
    async fn attempt_reconnect(&self, key: ConnectionKey) {
        if self.registry.lookup(&key.venue_symbol).is_none() {
            self.connections.lock().remove(&key);
            return;
        }

        let result = async {
            let endpoint = self
                .tokens
                .quote_token()
                .await
                .map_err(|e| e.to_string())?;
            let config = self.stream_config(&endpoint, &key);
            StreamConnection::connect(config, key.clone(), self.events_tx.clone())
                .await
                .map_err(|e| e.to_string())
        }
        .await;

        match result {
            Ok(connection) => {
                let stale = {
                    let mut connections = self.connections.lock();
                    match connections.get_mut(&key) {
                        Some(slot) => {
                            let old = std::mem::replace(&mut slot.connection, Arc::new(connection));
                            slot.policy.reset();
                            Some(old)
                        }
                        None => {
                            connections.insert(
                                key.clone(),
                                ConnectionSlot {
                                    connection: Arc::new(connection),
                                    policy: ReconnectPolicy::new(self.reconnect.clone()),
                                },
                            );
                            None
                        }
                    }
                };
                if let Some(old) = stale {
                    old.close().await;
                }
                tracing::info!(connection = %key, "Reconnected");
                self.notifier
                    .notify(NotificationKind::Connected, &format!("{key} reconnected"));
            }
            Err(reason) => {
                tracing::warn!(connection = %key, %reason, "Reconnect attempt failed");
                let _ = self
                    .events_tx
                    .send(ConnectionEvent {
                        key,
                        event: StreamEvent::Disconnected { reason },
                    })
                    .await;
            }
        }
    }

    /// Terminal failure: notify the engine once, remove the subscription,
    /// and tear down the symbol's remaining connections.
    async fn fail_subscription(
        &self,
        key: &ConnectionKey,
        kind: NotificationKind,
        message: &str,
    ) {
        // Only the connection that still finds the registry entry notifies;
        // its sibling's failure then lands in the silent-miss path.
        if let Some(subscription) = self.registry.lookup(&key.venue_symbol) {
            self.registry.remove(&subscription.symbol);
            self.update_subscription_gauge();
            tracing::error!(connection = %key, %message, "Subscription failed");
            self.notifier.notify(kind, message);
        }

        let slots = self.take_symbol_slots(&key.venue_symbol);
        for slot in slots {
            slot.connection.close().await;
        }
    }

    async fn open_symbol_streams(
        &self,
        venue_symbol: &str,
        types: TickTypes,
    ) -> Result<Vec<(ConnectionKey, ConnectionSlot)>, String> {
        let endpoint = self
            .tokens
            .quote_token()
            .await
            .map_err(|e| e.to_string())?;

        let mut slots = Vec::new();
        for channel in StreamChannel::all() {
            let wanted = match channel {
                StreamChannel::Quote => types.quotes,
                StreamChannel::Trade => types.trades,
            };
            if !wanted {
                continue;
            }

            let key = ConnectionKey::new(venue_symbol, channel);
            let config = self.stream_config(&endpoint, &key);
            match StreamConnection::connect(config, key.clone(), self.events_tx.clone()).await {
                Ok(connection) => slots.push((
                    key,
                    ConnectionSlot {
                        connection: Arc::new(connection),
                        policy: ReconnectPolicy::new(self.reconnect.clone()),
                    },
                )),
                Err(e) => {
                    // No partial subscriptions: close whatever already opened.
                    for (_, slot) in slots {
                        slot.connection.close().await;
                    }
                    return Err(format!("{channel} stream connect failed: {e}"));
                }
            }
        }

        Ok(slots)
    }

    fn stream_config(&self, endpoint: &StreamEndpoint, key: &ConnectionKey) -> StreamConfig {
        StreamConfig {
            url: StreamConfig::stream_url(
                &endpoint.websocket_url,
                key.channel,
                &key.venue_symbol,
                &endpoint.token,
            ),
            session_token: self.config.session_token.clone(),
            connect_timeout: self.config.websocket.connect_timeout,
            close_timeout: self.config.websocket.close_timeout,
            ping_interval: self.config.websocket.ping_interval,
        }
    }

    fn take_symbol_slots(&self, venue_symbol: &str) -> Vec<ConnectionSlot> {
        let mut connections = self.connections.lock();
        StreamChannel::all()
            .into_iter()
            .filter_map(|channel| connections.remove(&ConnectionKey::new(venue_symbol, channel)))
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_subscription_gauge(&self) {
        metrics::gauge!(ACTIVE_SUBSCRIPTIONS).set(self.registry.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        MockDataSink, MockEngineNotifier, MockStreamTokenProvider, TokenError,
    };
    use crate::infrastructure::tastytrade::symbols::TastyTradeSymbolMapper;

    fn coordinator_with(
        tokens: MockStreamTokenProvider,
        notifier: MockEngineNotifier,
    ) -> StreamingCoordinator {
        let websocket = WebSocketSettings {
            connect_timeout: std::time::Duration::from_millis(500),
            ..WebSocketSettings::default()
        };

        StreamingCoordinator::new(
            CoordinatorConfig::new("session-token").with_websocket(websocket),
            Arc::new(tokens),
            Arc::new(TastyTradeSymbolMapper::new()),
            Arc::new(MockDataSink::new()),
            Arc::new(notifier),
        )
    }

    #[tokio::test]
    async fn subscribe_fails_cleanly_when_token_fetch_fails() {
        let mut tokens = MockStreamTokenProvider::new();
        tokens
            .expect_quote_token()
            .returning(|| Err(TokenError("503 from venue".to_string())));
        let notifier = MockEngineNotifier::new();

        let coordinator = coordinator_with(tokens, notifier);
        let symbol = CanonicalSymbol::equity("AAPL");

        assert!(!coordinator.subscribe(&symbol).await);
        // No partial registration left behind.
        assert!(!coordinator.is_subscribed(&symbol));
        assert_eq!(coordinator.subscription_count(), 0);
        assert_eq!(coordinator.connection_count(), 0);
    }

    #[tokio::test]
    async fn subscribe_fails_cleanly_when_connect_fails() {
        let mut tokens = MockStreamTokenProvider::new();
        tokens.expect_quote_token().returning(|| {
            Ok(StreamEndpoint {
                // Nothing listens here; connect is refused.
                websocket_url: "ws://127.0.0.1:1".to_string(),
                token: "t1".to_string(),
            })
        });
        let notifier = MockEngineNotifier::new();

        let coordinator = coordinator_with(tokens, notifier);
        let symbol = CanonicalSymbol::equity("AAPL");

        assert!(!coordinator.subscribe(&symbol).await);
        assert!(!coordinator.is_subscribed(&symbol));
        assert_eq!(coordinator.connection_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_of_unknown_symbol_is_a_noop() {
        let tokens = MockStreamTokenProvider::new();
        let notifier = MockEngineNotifier::new();
        let coordinator = coordinator_with(tokens, notifier);

        assert!(coordinator.unsubscribe(&CanonicalSymbol::equity("AAPL")).await);
        assert_eq!(coordinator.subscription_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_is_safe_with_no_subscriptions() {
        let tokens = MockStreamTokenProvider::new();
        let notifier = MockEngineNotifier::new();
        let coordinator = coordinator_with(tokens, notifier);

        coordinator.shutdown().await;
        assert_eq!(coordinator.subscription_count(), 0);
    }
}
