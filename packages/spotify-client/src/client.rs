//! Authenticated Spotify Web API client
//!
//! Layering, bottom up: a transport layer with bounded retries and
//! exponential backoff for transient failures (429/5xx/connect/timeout),
//! then the domain-level token logic — expiry check before every request and
//! a single refresh-and-retry on 401. Token refresh is serialized behind the
//! [`TokenStore`] lock so concurrent callers never race a duplicate refresh.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use chorus_shared_config::SpotifyConfig;

use crate::auth::OAuthFlow;
use crate::error::{SpotifyError, SpotifyResult};
use crate::models::ErrorEnvelope;
use crate::token::{Token, TokenStore, DEFAULT_EXPIRY_BUFFER_SECS};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default number of retry attempts for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Authenticated Spotify Web API client
pub struct ApiClient {
    http_client: Client,
    config: SpotifyConfig,
    store: TokenStore,
    oauth: OAuthFlow,
    max_retries: u32,
    retry_base_delay_ms: u64,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ApiClient {
    /// Create a new client over a token store
    pub fn new(config: SpotifyConfig, store: TokenStore) -> SpotifyResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("Chorus/1.0")
            .build()?;

        let oauth = OAuthFlow::new(http_client.clone(), config.clone());

        Ok(Self {
            http_client,
            config,
            store,
            oauth,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
        })
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, attempts: u32, base_delay_ms: u64) -> Self {
        self.max_retries = attempts;
        self.retry_base_delay_ms = base_delay_ms;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Access the token store
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Build the user-facing authorization URL for the given scopes
    pub fn authorize_url(&self, scopes: &[&str], state: &str) -> SpotifyResult<String> {
        self.oauth.authorize_url(scopes, state)
    }

    /// Exchange an authorization code for a token and persist it
    pub async fn exchange_code(&self, code: &str) -> SpotifyResult<Token> {
        let token = self.oauth.exchange_code(code).await?;
        self.store.set(token.clone()).await;
        Ok(token)
    }

    /// Check whether a non-expired token is currently held
    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    /// Check whether the client holds a usable (valid or refreshable) token
    pub async fn has_usable_credentials(&self) -> bool {
        self.store.is_refreshable().await
    }

    /// Make an authenticated API request.
    ///
    /// `path` is relative to the API base URL and may carry a query string.
    /// A 204 or empty-body response yields `{"success": true}` rather than a
    /// parse error. A 401 triggers exactly one refresh-and-retry; if the
    /// retry also fails the error surfaces as [`SpotifyError::Auth`].
    #[instrument(skip(self, body), fields(method = %method))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SpotifyResult<Value> {
        let access_token = self.ensure_fresh_token().await?;

        match self
            .send_with_retry(method.clone(), path, body.clone(), &access_token)
            .await
        {
            Err(SpotifyError::Api { status: 401, .. }) => {
                debug!(path, "Got 401 mid-call, refreshing token and retrying once");
                let access_token = self.refresh_now().await?;
                match self.send_with_retry(method, path, body, &access_token).await {
                    Err(SpotifyError::Api {
                        status: 401,
                        message,
                        ..
                    }) => Err(SpotifyError::Auth(format!(
                        "request rejected after token refresh: {}",
                        message
                    ))),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Return a fresh access token, refreshing under the store lock if the
    /// held token is expired.
    async fn ensure_fresh_token(&self) -> SpotifyResult<String> {
        let mut guard = self.store.lock().await;
        match guard.as_ref() {
            None => Err(SpotifyError::Auth(
                "no token available, authorization required".to_string(),
            )),
            Some(token) if !token.is_expired(DEFAULT_EXPIRY_BUFFER_SECS) => {
                Ok(token.access_token.clone())
            }
            Some(_) => self.refresh_locked(&mut guard).await,
        }
    }

    /// Force a refresh regardless of expiry (401 recovery path)
    async fn refresh_now(&self) -> SpotifyResult<String> {
        let mut guard = self.store.lock().await;
        self.refresh_locked(&mut guard).await
    }

    /// Refresh the token while holding the store lock.
    ///
    /// On success the token is mutated in place and persisted. On failure
    /// the in-memory token is cleared and an auth error is returned; the
    /// caller must re-authenticate.
    async fn refresh_locked(
        &self,
        guard: &mut tokio::sync::MutexGuard<'_, Option<Token>>,
    ) -> SpotifyResult<String> {
        let refresh_token = match guard.as_ref().and_then(|t| t.refresh_token.clone()) {
            Some(rt) => rt,
            None => {
                **guard = None;
                return Err(SpotifyError::Auth(
                    "token expired and no refresh token is available".to_string(),
                ));
            }
        };

        match self.oauth.refresh_grant(&refresh_token).await {
            Ok(refreshed) => match guard.as_mut() {
                Some(token) => {
                    token.apply_refresh(refreshed);
                    self.store.persist(token);
                    debug!("Token refreshed");
                    Ok(token.access_token.clone())
                }
                // unreachable: the lock is held across the refresh
                None => Err(SpotifyError::Auth("token cleared during refresh".to_string())),
            },
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing token");
                **guard = None;
                Err(SpotifyError::Auth(format!("token refresh failed: {}", e)))
            }
        }
    }

    /// Execute an operation with retry logic for transient failures
    async fn with_retry<T, F, Fut>(&self, operation: F) -> SpotifyResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SpotifyResult<T>>,
    {
        if self.max_retries == 0 {
            return operation().await;
        }

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    } else if attempt < self.max_retries - 1 {
                        let delay = self.retry_base_delay_ms * 2_u64.pow(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_retries,
                            delay_ms = delay,
                            error = %e,
                            "Retrying after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        last_error = Some(e);
                        break;
                    }
                }
            }
        }

        Err(SpotifyError::RetriesExhausted {
            attempts: self.max_retries,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        access_token: &str,
    ) -> SpotifyResult<Value> {
        self.with_retry(|| {
            let method = method.clone();
            let body = body.clone();
            async move { self.send_once(method, path, body, access_token).await }
        })
        .await
    }

    /// One request/response cycle against the API
    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        access_token: &str,
    ) -> SpotifyResult<Value> {
        let url = self.config.api_url(path);
        let mut request = self
            .http_client
            .request(method, &url)
            .bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SpotifyError::Timeout
            } else {
                SpotifyError::Http(e)
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(path, "Spotify API rate limited");
            return Err(SpotifyError::RateLimited);
        }

        let text = response.text().await.map_err(SpotifyError::Http)?;

        if status.is_success() {
            // 204 and empty bodies are success, not a parse error
            if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
                return Ok(json!({"success": true}));
            }
            return Ok(serde_json::from_str(&text)?);
        }

        Err(Self::api_error(status, &text))
    }

    /// Wrap a non-2xx response into a typed error, reading the provider's
    /// error envelope when present
    fn api_error(status: StatusCode, body: &str) -> SpotifyError {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => SpotifyError::Api {
                status: envelope.error.status.unwrap_or(status.as_u16()),
                code: envelope.error.reason,
                message: envelope.error.message,
            },
            Err(_) => SpotifyError::Api {
                status: status.as_u16(),
                code: None,
                message: format!("HTTP {}", status.as_u16()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_parses_reason() {
        let body = r#"{"error": {"status": 404, "message": "No active device found", "reason": "NO_ACTIVE_DEVICE"}}"#;
        let err = ApiClient::api_error(StatusCode::NOT_FOUND, body);
        assert!(err.is_no_active_device());
    }

    #[test]
    fn test_api_error_without_envelope() {
        let err = ApiClient::api_error(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        match err {
            SpotifyError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 502);
                assert!(code.is_none());
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_client_debug_redacts_secret() {
        let config = SpotifyConfig::new("id", "hunter2");
        let store = TokenStore::empty("/tmp/does-not-matter.json");
        let client = ApiClient::new(config, store).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
