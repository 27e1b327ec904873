//! Engine Notification Port (Driven Port)
//!
//! Fire-and-forget lifecycle and error notifications surfaced to the engine.

/// Kind of event being surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A streaming connection is up and authenticated.
    Connected,
    /// A streaming connection dropped unexpectedly.
    Disconnected,
    /// A reconnect attempt has been scheduled.
    Reconnecting,
    /// Reconnect attempts are exhausted; the subscription was removed.
    ReconnectExhausted,
    /// A terminal error (e.g. stream authentication rejected).
    Error,
    /// A non-fatal condition worth reporting once.
    Warning,
}

/// Notification channel to the engine. No return value is consumed.
#[cfg_attr(test, mockall::automock)]
pub trait EngineNotifier: Send + Sync {
    /// Surface one event.
    fn notify(&self, kind: NotificationKind, message: &str);
}
