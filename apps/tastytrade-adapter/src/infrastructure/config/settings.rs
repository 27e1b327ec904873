//! Adapter Configuration Settings
//!
//! Configuration types for the adapter, loaded from environment variables.

use std::time::Duration;

/// Trading environment (production vs certification sandbox).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production environment (real money).
    #[default]
    Production,
    /// Certification sandbox environment.
    Sandbox,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sandbox" | "cert" | "certification" => Self::Sandbox,
            _ => Self::Production,
        }
    }

    /// Base URL of the REST API for this environment.
    #[must_use]
    pub const fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.tastyworks.com",
            Self::Sandbox => "https://api.cert.tastyworks.com",
        }
    }

    /// Base URL of the OAuth authorization server for this environment.
    #[must_use]
    pub const fn oauth_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://oauth.tastytrade.com",
            Self::Sandbox => "https://cert-auth.staging-tasty.works",
        }
    }

    /// Check if this is the production environment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

/// Account credentials for session authentication.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Get the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// Timeout for the transport handshake plus the auth frame send.
    pub connect_timeout: Duration,
    /// Bound on the close handshake before the transport is dropped.
    pub close_timeout: Duration,
    /// Ping interval for connection health.
    pub ping_interval: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Multiplier applied to the reconnection delay after each attempt.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(5),
            ping_interval: Duration::from_secs(20),
            reconnect_delay_initial: Duration::from_secs(5),
            reconnect_delay_max: Duration::from_secs(60),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 5,
        }
    }
}

/// Top-level adapter configuration.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Selected environment.
    pub environment: Environment,
    /// Session credentials (unused when a session token is supplied).
    pub credentials: Option<Credentials>,
    /// Pre-authenticated session token, if already available.
    pub session_token: Option<String>,
    /// Account number for order and account endpoints.
    pub account_id: Option<String>,
    /// WebSocket tunables.
    pub websocket: WebSocketSettings,
}

impl AdapterConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TASTY_ENV`: production | sandbox (default: production)
    /// - `TASTY_USERNAME` / `TASTY_PASSWORD`: session login credentials
    /// - `TASTY_SESSION_TOKEN`: pre-authenticated session token
    /// - `TASTY_ACCOUNT_ID`: account number
    /// - `TASTY_WS_MAX_RECONNECTS`: reconnect attempt cap (default: 5)
    /// - `TASTY_WS_RECONNECT_DELAY_SECS`: initial reconnect delay (default: 5)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` when neither a session token
    /// nor a username/password pair is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = std::env::var("TASTY_ENV")
            .map(|v| Environment::from_str_case_insensitive(&v))
            .unwrap_or_default();

        let session_token = std::env::var("TASTY_SESSION_TOKEN").ok().filter(|t| !t.is_empty());

        let credentials = match (
            std::env::var("TASTY_USERNAME").ok().filter(|v| !v.is_empty()),
            std::env::var("TASTY_PASSWORD").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        };

        if session_token.is_none() && credentials.is_none() {
            return Err(ConfigError::MissingCredentials);
        }

        let account_id = std::env::var("TASTY_ACCOUNT_ID").ok().filter(|v| !v.is_empty());

        let mut websocket = WebSocketSettings::default();
        if let Ok(value) = std::env::var("TASTY_WS_MAX_RECONNECTS") {
            websocket.max_reconnect_attempts = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TASTY_WS_MAX_RECONNECTS"))?;
        }
        if let Ok(value) = std::env::var("TASTY_WS_RECONNECT_DELAY_SECS") {
            let secs: u64 = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TASTY_WS_RECONNECT_DELAY_SECS"))?;
            websocket.reconnect_delay_initial = Duration::from_secs(secs);
        }

        Ok(Self {
            environment,
            credentials,
            session_token,
            account_id,
            websocket,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither a session token nor username/password was provided.
    #[error("missing credentials: set TASTY_SESSION_TOKEN or TASTY_USERNAME/TASTY_PASSWORD")]
    MissingCredentials,

    /// An environment variable failed to parse.
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}
