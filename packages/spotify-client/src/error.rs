//! Spotify Web API error types

use thiserror::Error;

/// Errors that can occur when talking to the Spotify Web API
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Token is missing, invalid, or could not be refreshed.
    /// Recovery requires re-authentication.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a provider response
    #[error("failed to parse Spotify response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Spotify returned a non-2xx response
    #[error("Spotify API error {status}: {message}")]
    Api {
        status: u16,
        /// Provider reason code when present (e.g. "NO_ACTIVE_DEVICE")
        code: Option<String>,
        message: String,
    },

    /// Rate limited by Spotify (HTTP 429)
    #[error("rate limited by Spotify API")]
    RateLimited,

    /// Request timed out
    #[error("request to Spotify timed out")]
    Timeout,

    /// All retry attempts exhausted
    #[error("all {attempts} retry attempts failed, last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl SpotifyError {
    /// Check if this error is retryable (transient failure)
    ///
    /// Retries on timeouts, rate limiting, transport errors, and 5xx
    /// responses. Does NOT retry other 4xx responses; 401 is handled one
    /// layer up by the refresh-and-retry logic.
    pub fn is_retryable(&self) -> bool {
        match self {
            SpotifyError::Timeout | SpotifyError::RateLimited => true,
            SpotifyError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            SpotifyError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this is the provider's "no active device" condition.
    ///
    /// Spotify reports it as a 404 on the player endpoints with the
    /// NO_ACTIVE_DEVICE reason. Dispatch happens on this typed value, never
    /// on message text.
    pub fn is_no_active_device(&self) -> bool {
        matches!(
            self,
            SpotifyError::Api { status: 404, code: Some(reason), .. }
                if reason == "NO_ACTIVE_DEVICE"
        )
    }

    /// Check if this error requires re-authentication
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Auth(_))
    }
}

/// Result type for Spotify operations
pub type SpotifyResult<T> = Result<T, SpotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SpotifyError::Timeout.is_retryable());
        assert!(SpotifyError::RateLimited.is_retryable());
        assert!(SpotifyError::Api {
            status: 503,
            code: None,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!SpotifyError::Auth("expired".into()).is_retryable());
        assert!(!SpotifyError::Api {
            status: 404,
            code: None,
            message: "not found".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_no_active_device_detection() {
        let err = SpotifyError::Api {
            status: 404,
            code: Some("NO_ACTIVE_DEVICE".into()),
            message: "Player command failed: No active device found".into(),
        };
        assert!(err.is_no_active_device());

        let err = SpotifyError::Api {
            status: 404,
            code: None,
            message: "Not found".into(),
        };
        assert!(!err.is_no_active_device());
    }
}
