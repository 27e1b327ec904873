//! HTTP client wrapper with retry logic.
//!
//! Thin layer over `reqwest`: environment base URLs, the session-token
//! `Authorization` header, JSON in/out, and bounded exponential backoff on
//! network errors, 429s, and 5xx responses.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::infrastructure::config::Environment;

/// Retry behavior for REST calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Cap on the backoff.
    pub max_backoff: Duration,
    /// Backoff multiplier per retry.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
    max_retries: u32,
}

impl Backoff {
    fn new(config: &RetryConfig) -> Self {
        Self {
            current: config.initial_backoff,
            max: config.max_backoff,
            multiplier: config.multiplier,
            attempt: 0,
            max_retries: config.max_retries,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_retries {
            return None;
        }
        self.attempt += 1;

        let delay = self.current;
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = Duration::from_millis((self.current.as_millis() as f64 * self.multiplier) as u64);
        self.current = scaled.min(self.max);
        Some(delay)
    }
}

/// HTTP client for the venue's REST API.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_token: RwLock<Option<String>>,
    retry: RetryConfig,
}

impl ApiClient {
    /// Create a client for an environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(environment: Environment) -> Result<Self, ApiError> {
        Self::with_base_url(environment.rest_base_url())
    }

    /// Create a client for an explicit base URL (tests point this at a local
    /// mock server).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session_token: RwLock::new(None),
            retry: RetryConfig::default(),
        })
    }

    /// Override retry behavior.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install the session token sent as the `Authorization` header.
    pub fn set_session_token(&self, token: impl Into<String>) {
        *self.session_token.write() = Some(token.into());
    }

    /// The current session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<String> {
        self.session_token.read().clone()
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, error status, or parse failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &[], None::<&()>).await
    }

    /// GET a JSON resource with query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, error status, or parse failure.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None::<&()>).await
    }

    /// POST a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, error status, or parse failure.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// PUT a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, error status, or parse failure.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// DELETE a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or error status.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.request(Method::DELETE, path, &[], None::<&()>).await?;
        Ok(())
    }

    /// POST form-urlencoded fields (the OAuth token endpoint).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, error status, or parse failure.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = Backoff::new(&self.retry);

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = self.session_token.read().as_deref() {
                request = request.header("Authorization", token);
            }
            if let Some(value) = body {
                request = request.json(value);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(ApiError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
            };

            let status = response.status();
            if status.is_success() {
                return Self::read_json(response).await;
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let retryable_status = status;
                if let Some(delay) = backoff.next_backoff() {
                    tracing::warn!(
                        status = retryable_status.as_u16(),
                        delay_ms = delay.as_millis(),
                        attempt = backoff.attempt,
                        "Retryable status, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                if retryable_status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(ApiError::RateLimited);
                }
            }

            let message = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ApiError::AuthenticationFailed(message));
            }
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        // Some endpoints answer success with an empty body.
        let source = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(source).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_session_token", &self.session_token.read().is_some())
            .finish_non_exhaustive()
    }
}
