//! OAuth2 authorization-code flow against the Spotify accounts service

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use chorus_shared_config::SpotifyConfig;

use crate::error::{SpotifyError, SpotifyResult};
use crate::token::Token;

/// Wire shape of a token-endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    scope: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl From<TokenResponse> for Token {
    fn from(raw: TokenResponse) -> Self {
        let expires_at = Utc::now() + Duration::seconds(raw.expires_in);
        Self {
            access_token: raw.access_token,
            token_type: raw.token_type,
            scope: raw.scope,
            expires_in: raw.expires_in,
            refresh_token: raw.refresh_token,
            expires_at: Some(expires_at),
        }
    }
}

/// Wire shape of a token-endpoint error response
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 authorization-code flow client
///
/// Stateless over the HTTP client and configuration; token custody belongs
/// to [`crate::TokenStore`].
#[derive(Clone)]
pub struct OAuthFlow {
    http_client: Client,
    config: SpotifyConfig,
}

impl std::fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.config.token_url)
            .finish()
    }
}

impl OAuthFlow {
    /// Create a flow over an existing HTTP client
    pub fn new(http_client: Client, config: SpotifyConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Build the user-facing authorization URL for the given scopes
    pub fn authorize_url(&self, scopes: &[&str], state: &str) -> SpotifyResult<String> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| SpotifyError::Auth(format!("invalid authorize URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange an authorization code for a token
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> SpotifyResult<Token> {
        debug!("Exchanging authorization code for token");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
        ])
        .await
    }

    /// Exchange a refresh token for a fresh access token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_grant(&self, refresh_token: &str) -> SpotifyResult<Token> {
        debug!("Refreshing access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// POST to the token endpoint with client credentials via Basic auth
    async fn token_request(&self, form: &[(&str, &str)]) -> SpotifyResult<Token> {
        let credentials = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header("Authorization", format!("Basic {}", credentials))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpotifyError::Timeout
                } else {
                    SpotifyError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(SpotifyError::Http)?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned HTTP {}", status.as_u16()),
            };
            warn!(status = status.as_u16(), "Token request rejected");
            return Err(SpotifyError::Auth(message));
        }

        let raw: TokenResponse = serde_json::from_str(&body)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_oauth_params() {
        let config = SpotifyConfig::new("my-client", "my-secret");
        let flow = OAuthFlow::new(Client::new(), config);

        let url = flow
            .authorize_url(&["user-read-playback-state", "user-modify-playback-state"], "xyz")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("client_id".into(), "my-client".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "user-read-playback-state user-modify-playback-state".into()
        )));
        assert!(pairs.contains(&("state".into(), "xyz".into())));
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let config = SpotifyConfig::new("my-client", "super-secret");
        let flow = OAuthFlow::new(Client::new(), config);
        let debug_str = format!("{:?}", flow);
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_response_computes_expires_at() {
        let raw = TokenResponse {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            scope: String::new(),
            expires_in: 3600,
            refresh_token: None,
        };
        let token: Token = raw.into();
        assert!(token.expires_at.is_some());
        assert!(!token.is_expired(60));
    }
}
