//! Spotify Web API configuration types

use crate::{get_env_or_default, get_required_env, ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;

/// Default Spotify accounts service authorize endpoint
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

/// Default Spotify accounts service token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Default Spotify Web API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Spotify Web API configuration
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    /// OAuth2 client ID
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// OAuth2 redirect URI registered with the provider
    pub redirect_uri: String,

    /// Path to the persisted token file
    pub token_file: PathBuf,

    /// Authorize endpoint (overridable for tests)
    pub authorize_url: String,

    /// Token endpoint (overridable for tests)
    pub token_url: String,

    /// API base URL (overridable for tests)
    pub api_base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl SpotifyConfig {
    /// Load Spotify configuration from environment variables
    ///
    /// Returns an error if the client ID or secret are not set. This allows
    /// consumers to call `.ok()` to get `Option<SpotifyConfig>`.
    pub fn from_env() -> ConfigResult<Self> {
        let client_id = get_required_env("SPOTIFY_CLIENT_ID")?;
        let client_secret = get_required_env("SPOTIFY_CLIENT_SECRET")?;

        if client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "SPOTIFY_CLIENT_ID".to_string(),
                "client ID cannot be empty".to_string(),
            ));
        }
        if client_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "SPOTIFY_CLIENT_SECRET".to_string(),
                "client secret cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: get_env_or_default(
                "SPOTIFY_REDIRECT_URI",
                "http://127.0.0.1:8898/callback",
            ),
            token_file: PathBuf::from(get_env_or_default(
                "SPOTIFY_TOKEN_FILE",
                ".cache/spotify_token.json",
            )),
            authorize_url: get_env_or_default("SPOTIFY_AUTHORIZE_URL", DEFAULT_AUTHORIZE_URL),
            token_url: get_env_or_default("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_base_url: get_env_or_default("SPOTIFY_API_BASE_URL", DEFAULT_API_BASE_URL),
            timeout_secs: crate::parse_env("SPOTIFY_TIMEOUT", 10)?,
        })
    }

    /// Check if Spotify is configured (both client ID and secret are set)
    pub fn is_configured() -> bool {
        env::var("SPOTIFY_CLIENT_ID").is_ok() && env::var("SPOTIFY_CLIENT_SECRET").is_ok()
    }

    /// Create a configuration with custom credentials (useful for testing)
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: "http://127.0.0.1:8898/callback".to_string(),
            token_file: PathBuf::from(".cache/spotify_token.json"),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Point the client at a different API base URL (useful for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Point the client at a different token endpoint (useful for testing)
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the token file path
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    /// Get the full URL for an API endpoint path
    pub fn api_url(&self, path: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
