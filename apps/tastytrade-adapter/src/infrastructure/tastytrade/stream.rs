//! Streaming WebSocket Connection
//!
//! One physical streaming session to the venue. A connection serves exactly
//! one venue symbol on one channel (quote or trade); the URL carries the
//! short-lived stream token and the first frame sent is the session
//! authentication frame.
//!
//! # Lifecycle
//!
//! `Idle → Connecting → Authenticating → Open → Closing → Closed`, with
//! `Connecting`/`Authenticating`/`Open` transitioning to `Failed` on any I/O
//! error. Failures before `Open` are returned to the caller of
//! [`StreamConnection::connect`]; failures after `Open` are reported to the
//! owner as [`StreamEvent::Disconnected`] — never thrown across the receive
//! loop boundary.
//!
//! The receive loop runs on its own tokio task, decodes each complete text
//! frame, and forwards the result to the owner's event channel. Decode
//! failures drop the single message and keep the connection alive.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use super::codec::JsonCodec;
use super::messages::{StreamAuthRequest, StreamMessage};
use crate::infrastructure::metrics::DECODE_ERRORS;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

// =============================================================================
// Errors and Events
// =============================================================================

/// Errors surfaced by a stream connection.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The transport handshake did not complete within the timeout.
    #[error("connect timed out")]
    ConnectTimeout,

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The authentication frame could not be serialized or sent.
    #[error("failed to send authentication frame: {0}")]
    Authentication(String),

    /// `send` was called outside the `Open` state.
    #[error("not connected")]
    NotConnected,
}

/// Which stream a connection serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamChannel {
    /// Top-of-book quotes.
    Quote,
    /// Trade prints.
    Trade,
}

impl StreamChannel {
    /// URL path segment for this channel.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Trade => "trade",
        }
    }

    /// Both channels.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Quote, Self::Trade]
    }
}

impl std::fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Identity of one physical connection: the venue symbol it serves and the
/// channel it carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    /// Venue symbol served by the connection.
    pub venue_symbol: String,
    /// Quote or trade channel.
    pub channel: StreamChannel,
}

impl ConnectionKey {
    /// Create a key.
    pub fn new(venue_symbol: impl Into<String>, channel: StreamChannel) -> Self {
        Self {
            venue_symbol: venue_symbol.into(),
            channel,
        }
    }
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.venue_symbol, self.channel)
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not yet connected.
    Idle,
    /// Transport handshake in progress.
    Connecting,
    /// Transport open, authentication frame being sent.
    Authenticating,
    /// Live and receiving.
    Open,
    /// Close requested, shutdown handshake in progress.
    Closing,
    /// Fully closed.
    Closed,
    /// Dead after an I/O error.
    Failed,
}

/// Lifecycle and data events emitted to the owner.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// One decoded wire message.
    Message(StreamMessage),
    /// The server rejected the session credential. Terminal: retrying with
    /// the same credential cannot succeed.
    AuthRejected(String),
    /// The connection dropped for a reason the owner did not initiate.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
}

/// One event, tagged with the connection that produced it.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    /// Which connection the event came from.
    pub key: ConnectionKey,
    /// The event itself.
    pub event: StreamEvent,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for one stream connection.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Full stream URL including the token query parameter.
    pub url: String,
    /// Session token sent in the authentication frame.
    pub session_token: String,
    /// Bound on the transport handshake plus auth frame send.
    pub connect_timeout: Duration,
    /// Bound on the close handshake.
    pub close_timeout: Duration,
    /// Ping interval for connection health.
    pub ping_interval: Duration,
}

impl StreamConfig {
    /// Build the URL for a per-symbol stream:
    /// `{websocket_url}/{channel}/{venue_symbol}?token={token}`.
    #[must_use]
    pub fn stream_url(
        websocket_url: &str,
        channel: StreamChannel,
        venue_symbol: &str,
        token: &str,
    ) -> String {
        format!(
            "{}/{}/{}?token={}",
            websocket_url.trim_end_matches('/'),
            channel.path_segment(),
            venue_symbol,
            token
        )
    }
}

// =============================================================================
// Stream Connection
// =============================================================================

/// One live streaming session.
pub struct StreamConnection {
    key: ConnectionKey,
    state: Arc<Mutex<ConnectionState>>,
    writer: Arc<tokio::sync::Mutex<WsWriter>>,
    cancel: CancellationToken,
    close_timeout: Duration,
}

impl StreamConnection {
    /// Open the transport, authenticate, and start the receive loop.
    ///
    /// Returns only after the transport reports an open state and the
    /// authentication frame has been sent; the connection is `Open` on
    /// success. Any earlier failure leaves the connection `Failed` and is
    /// returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake times out, the transport fails, or
    /// the authentication frame cannot be sent.
    pub async fn connect(
        config: StreamConfig,
        key: ConnectionKey,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Self, StreamError> {
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        tracing::debug!(connection = %key, url = %config.url, "Connecting stream");

        let connected = tokio::time::timeout(config.connect_timeout, connect_async(&config.url))
            .await
            .map_err(|_| {
                *state.lock() = ConnectionState::Failed;
                StreamError::ConnectTimeout
            })?;
        let (ws, _response) = connected.map_err(|e| {
            *state.lock() = ConnectionState::Failed;
            StreamError::WebSocket(e)
        })?;

        *state.lock() = ConnectionState::Authenticating;
        let (mut writer, reader) = ws.split();

        let auth = StreamAuthRequest::new(&config.session_token);
        let frame = serde_json::to_string(&auth)
            .map_err(|e| StreamError::Authentication(e.to_string()))?;
        if let Err(e) = writer.send(Message::Text(frame.into())).await {
            *state.lock() = ConnectionState::Failed;
            return Err(StreamError::Authentication(e.to_string()));
        }

        *state.lock() = ConnectionState::Open;
        tracing::debug!(connection = %key, "Stream open");

        let cancel = CancellationToken::new();
        let writer = Arc::new(tokio::sync::Mutex::new(writer));

        tokio::spawn(receive_loop(ReceiveLoop {
            key: key.clone(),
            reader,
            writer: Arc::clone(&writer),
            state: Arc::clone(&state),
            cancel: cancel.clone(),
            events,
            ping_interval: config.ping_interval,
        }));

        Ok(Self {
            key,
            state,
            writer,
            cancel,
            close_timeout: config.close_timeout,
        })
    }

    /// The connection's identity.
    #[must_use]
    pub const fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Send a text frame. Valid only while `Open`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NotConnected`] outside the `Open` state, or the
    /// transport error if the write fails.
    pub async fn send(&self, frame: String) -> Result<(), StreamError> {
        if self.state() != ConnectionState::Open {
            return Err(StreamError::NotConnected);
        }
        self.writer
            .lock()
            .await
            .send(Message::Text(frame.into()))
            .await
            .map_err(StreamError::from)
    }

    /// Close the connection.
    ///
    /// Idempotent; always ends in `Closed` regardless of the current state.
    /// The shutdown handshake is bounded by the close timeout, after which
    /// the transport is dropped unconditionally. A close initiated here never
    /// produces a `Disconnected` event.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock();
            if matches!(*state, ConnectionState::Closing | ConnectionState::Closed) {
                return;
            }
            *state = ConnectionState::Closing;
        }

        // Stop the receive loop before the close handshake so it never
        // reports this closure as unexpected.
        self.cancel.cancel();

        let handshake = tokio::time::timeout(self.close_timeout, async {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
            let _ = writer.flush().await;
        })
        .await;

        if handshake.is_err() {
            tracing::warn!(connection = %self.key, "Close handshake timed out, dropping transport");
        }

        *self.state.lock() = ConnectionState::Closed;
        tracing::debug!(connection = %self.key, "Stream closed");
    }
}

impl std::fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Receive Loop
// =============================================================================

struct ReceiveLoop {
    key: ConnectionKey,
    reader: WsReader,
    writer: Arc<tokio::sync::Mutex<WsWriter>>,
    state: Arc<Mutex<ConnectionState>>,
    cancel: CancellationToken,
    events: mpsc::Sender<ConnectionEvent>,
    ping_interval: Duration,
}

async fn receive_loop(mut ctx: ReceiveLoop) {
    let codec = JsonCodec::new();
    let mut ping = tokio::time::interval(ctx.ping_interval);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick of a tokio interval fires immediately; skip it so the
    // first real ping happens one full interval after connect.
    ping.tick().await;
    let mut waiting_for_pong = false;

    loop {
        tokio::select! {
            () = ctx.cancel.cancelled() => {
                // Caller-initiated close; `close()` owns the state transition.
                break;
            }
            _ = ping.tick() => {
                if waiting_for_pong {
                    fail(&ctx, "heartbeat timeout".to_string()).await;
                    break;
                }
                if ctx.writer.lock().await.send(Message::Ping(vec![].into())).await.is_err() {
                    fail(&ctx, "ping send failed".to_string()).await;
                    break;
                }
                waiting_for_pong = true;
            }
            msg = ctx.reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        waiting_for_pong = false;
                        match codec.decode(text.as_str()) {
                            Ok(StreamMessage::AuthResponse(resp)) if resp.is_rejected() => {
                                let reason = resp.rejection_reason().to_string();
                                tracing::error!(connection = %ctx.key, %reason, "Stream authentication rejected");
                                *ctx.state.lock() = ConnectionState::Failed;
                                emit(&ctx, StreamEvent::AuthRejected(reason)).await;
                                break;
                            }
                            Ok(message) => {
                                if !emit(&ctx, StreamEvent::Message(message)).await {
                                    // Owner dropped the channel; nothing left to serve.
                                    break;
                                }
                            }
                            Err(e) => {
                                // One bad frame never tears down the connection.
                                metrics::counter!(DECODE_ERRORS).increment(1);
                                tracing::warn!(connection = %ctx.key, error = %e, "Discarding undecodable frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ctx.writer.lock().await.send(Message::Pong(data)).await.is_err() {
                            fail(&ctx, "pong send failed".to_string()).await;
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        waiting_for_pong = false;
                    }
                    Some(Ok(Message::Close(_))) => {
                        fail(&ctx, "server closed the connection".to_string()).await;
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol.
                    }
                    Some(Err(e)) => {
                        fail(&ctx, e.to_string()).await;
                        break;
                    }
                    None => {
                        fail(&ctx, "stream ended".to_string()).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Mark the connection failed and report the unexpected closure.
async fn fail(ctx: &ReceiveLoop, reason: String) {
    *ctx.state.lock() = ConnectionState::Failed;
    tracing::warn!(connection = %ctx.key, %reason, "Stream disconnected");
    emit(ctx, StreamEvent::Disconnected { reason }).await;
}

/// Forward an event unless the owner initiated shutdown. Returns false when
/// the owner is gone. Cancellation interrupts a send blocked on a full
/// channel, so teardown is never held up by back-pressure.
async fn emit(ctx: &ReceiveLoop, event: StreamEvent) -> bool {
    if ctx.cancel.is_cancelled() {
        return false;
    }
    let event = ConnectionEvent {
        key: ctx.key.clone(),
        event,
    };
    tokio::select! {
        () = ctx.cancel.cancelled() => false,
        sent = ctx.events.send(event) => sent.is_ok(),
    }
}
