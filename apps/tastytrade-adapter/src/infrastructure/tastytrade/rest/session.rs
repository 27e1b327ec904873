//! Session and OAuth Authentication
//!
//! Two ways into the venue's API:
//!
//! - **Session login**: `POST /sessions` with username/password, yielding the
//!   session token sent as the `Authorization` header everywhere else.
//! - **OAuth**: authorization-code exchange and refresh-token rotation
//!   against `POST /oauth/token`, with expiry tracking so callers always get
//!   a live bearer token.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use super::api_types::{OAuthTokenResponse, SessionRequest, SessionResponse};
use super::client::ApiClient;
use super::error::ApiError;
use crate::infrastructure::config::{Credentials, Environment};

/// Session login.
pub struct SessionAuth;

impl SessionAuth {
    /// Authenticate with username/password and install the session token on
    /// the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue rejects the credentials or the call
    /// fails.
    pub async fn login(client: &ApiClient, credentials: &Credentials) -> Result<String, ApiError> {
        let request = SessionRequest {
            login: credentials.username(),
            password: credentials.password(),
        };

        let response: SessionResponse = client.post("/sessions", &request).await?;
        client.set_session_token(&response.session_token);
        tracing::info!("Session authenticated");

        Ok(response.session_token)
    }
}

/// OAuth application configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// Environment (selects the authorization server).
    pub environment: Environment,
}

/// Current OAuth token state.
#[derive(Debug, Clone, Default)]
pub struct OAuthTokens {
    /// Bearer access token.
    pub access_token: Option<String>,
    /// Refresh token.
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokens {
    /// Check whether the access token is present and not yet expired.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => now < expires_at,
            _ => false,
        }
    }
}

/// OAuth session: builds authorization URLs, exchanges codes, and refreshes
/// access tokens as they go stale.
pub struct OAuthSession {
    config: OAuthConfig,
    tokens: Mutex<OAuthTokens>,
}

impl OAuthSession {
    /// Create a session with no tokens yet.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            tokens: Mutex::new(OAuthTokens::default()),
        }
    }

    /// Create a session seeded with previously stored tokens.
    #[must_use]
    pub fn with_tokens(config: OAuthConfig, tokens: OAuthTokens) -> Self {
        Self {
            config,
            tokens: Mutex::new(tokens),
        }
    }

    /// Snapshot of the current token state.
    #[must_use]
    pub fn tokens(&self) -> OAuthTokens {
        self.tokens.lock().clone()
    }

    /// The URL a user must visit to authorize the application.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization base URL is malformed.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String, ApiError> {
        let base = format!("{}/authorize", self.config.environment.oauth_base_url());
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "trade openid"),
        ];
        if let Some(state) = state {
            params.push(("state", state));
        }

        let url = reqwest::Url::parse_with_params(&base, params)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue rejects the code or the call fails.
    pub async fn exchange_code(&self, client: &ApiClient, code: &str) -> Result<String, ApiError> {
        let response: OAuthTokenResponse = client
            .post_form(
                "/oauth/token",
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                    ("redirect_uri", &self.config.redirect_uri),
                ],
            )
            .await?;

        tracing::info!("Exchanged authorization code for access token");
        Ok(self.store(response))
    }

    /// Refresh the access token using the stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is held or the venue rejects it.
    pub async fn refresh(&self, client: &ApiClient) -> Result<String, ApiError> {
        let refresh_token = self
            .tokens
            .lock()
            .refresh_token
            .clone()
            .ok_or_else(|| ApiError::AuthenticationFailed("no refresh token held".to_string()))?;

        let response: OAuthTokenResponse = client
            .post_form(
                "/oauth/token",
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", &refresh_token),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                ],
            )
            .await?;

        tracing::info!("Refreshed access token");
        Ok(self.store(response))
    }

    /// An `Authorization` header value, refreshing first when the held token
    /// is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if no live token is held and refreshing fails.
    pub async fn authorization_header(&self, client: &ApiClient) -> Result<String, ApiError> {
        let fresh = {
            let tokens = self.tokens.lock();
            tokens.is_fresh(Utc::now()).then(|| tokens.access_token.clone())
        };
        if let Some(Some(token)) = fresh {
            return Ok(format!("Bearer {token}"));
        }

        let token = self.refresh(client).await?;
        Ok(format!("Bearer {token}"))
    }

    fn store(&self, response: OAuthTokenResponse) -> String {
        let mut tokens = self.tokens.lock();
        tokens.access_token = Some(response.access_token.clone());
        tokens.expires_at = Some(Utc::now() + Duration::seconds(response.expires_in));
        if let Some(refresh_token) = response.refresh_token {
            tokens.refresh_token = Some(refresh_token);
        }
        response.access_token
    }
}
