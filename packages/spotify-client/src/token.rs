//! OAuth2 token record and on-disk persistence
//!
//! The token file is plain JSON holding the fields Spotify returns from the
//! token endpoint plus a computed `expires_at`. Persistence is best-effort:
//! a failed write is logged and never fatal, and a missing or corrupt file
//! loads as "no token" rather than an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default safety buffer applied when checking token expiry, in seconds
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

/// An OAuth2 token as issued by the Spotify accounts service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Bearer access token
    pub access_token: String,
    /// Token type, always "Bearer" in practice
    pub token_type: String,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds as reported at issue time
    pub expires_in: i64,
    /// Refresh token; Spotify only returns a new one occasionally
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Absolute expiry instant, computed at issue/refresh time
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Check whether the token is expired, applying a safety buffer.
    ///
    /// A token with no `expires_at` is always treated as expired.
    pub fn is_expired(&self, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at - Duration::seconds(buffer_secs),
            None => true,
        }
    }

    /// Apply a refresh response to this token in place.
    ///
    /// The access token and expiry are always replaced; the refresh token is
    /// replaced only when the provider returned a new one.
    pub fn apply_refresh(&mut self, refreshed: Token) {
        self.access_token = refreshed.access_token;
        self.token_type = refreshed.token_type;
        self.expires_in = refreshed.expires_in;
        self.expires_at = refreshed.expires_at;
        if !refreshed.scope.is_empty() {
            self.scope = refreshed.scope;
        }
        if refreshed.refresh_token.is_some() {
            self.refresh_token = refreshed.refresh_token;
        }
    }
}

/// Persists and restores the token record
///
/// The store is the single owner of the in-memory token. All access goes
/// through an async mutex so that at most one refresh is in flight at a
/// time; concurrent callers wait on the lock and observe the refreshed
/// token instead of duplicating the network call.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    token: Mutex<Option<Token>>,
}

impl TokenStore {
    /// Load the persisted token from disk.
    ///
    /// Any failure (missing file, unreadable file, parse error) results in
    /// an empty store rather than an error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Token>(&contents) {
                Ok(token) => {
                    debug!(path = %path.display(), "Loaded persisted token");
                    Some(token)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Token file is corrupt, ignoring");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path,
            token: Mutex::new(token),
        }
    }

    /// Create an empty store that will persist to the given path
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            token: Mutex::new(None),
        }
    }

    /// Create a store seeded with a token (useful for testing)
    pub fn with_token(path: impl AsRef<Path>, token: Token) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            token: Mutex::new(Some(token)),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the store for token access.
    ///
    /// The client holds this guard across expiry check, refresh, and
    /// persistence so the whole cycle is atomic with respect to other
    /// callers.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, Option<Token>> {
        self.token.lock().await
    }

    /// Snapshot the current token, if any
    pub async fn current(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Check whether a non-expired token is present
    pub async fn is_authenticated(&self) -> bool {
        match &*self.token.lock().await {
            Some(token) => !token.is_expired(DEFAULT_EXPIRY_BUFFER_SECS),
            None => false,
        }
    }

    /// Check whether any token with a refresh token is present.
    ///
    /// An expired token still counts: it can be refreshed on the next call.
    pub async fn is_refreshable(&self) -> bool {
        match &*self.token.lock().await {
            Some(token) => {
                !token.is_expired(DEFAULT_EXPIRY_BUFFER_SECS) || token.refresh_token.is_some()
            }
            None => false,
        }
    }

    /// Replace the stored token and persist it
    pub async fn set(&self, token: Token) {
        let mut guard = self.token.lock().await;
        self.persist(&token);
        *guard = Some(token);
    }

    /// Drop the stored token without touching the file
    pub async fn clear(&self) {
        *self.token.lock().await = None;
    }

    /// Write a token to disk, best-effort.
    ///
    /// Persistence failure is logged, never propagated.
    pub fn persist(&self, token: &Token) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        match serde_json::to_string_pretty(token) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "Failed to persist token");
                } else {
                    debug!(path = %self.path.display(), "Persisted token");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize token for persistence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(secs: i64) -> Token {
        Token {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            scope: "user-modify-playback-state".to_string(),
            expires_in: 3600,
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::seconds(secs)),
        }
    }

    #[test]
    fn test_fresh_token_not_expired() {
        let token = token_expiring_in(3600);
        assert!(!token.is_expired(60));
    }

    #[test]
    fn test_expired_ten_seconds_ago_with_buffer() {
        // expires_at = now - 10s, buffer = 60s
        let token = token_expiring_in(-10);
        assert!(token.is_expired(60));
    }

    #[test]
    fn test_buffer_pulls_expiry_forward() {
        // Expires in 30s, but the 60s buffer treats it as already expired
        let token = token_expiring_in(30);
        assert!(token.is_expired(60));
        assert!(!token.is_expired(0));
    }

    #[test]
    fn test_token_without_expires_at_is_always_expired() {
        let mut token = token_expiring_in(3600);
        token.expires_at = None;
        assert!(token.is_expired(0));
        assert!(token.is_expired(60));
    }

    #[test]
    fn test_apply_refresh_keeps_old_refresh_token() {
        let mut token = token_expiring_in(-10);
        let mut refreshed = token_expiring_in(3600);
        refreshed.access_token = "new-access".to_string();
        refreshed.refresh_token = None;

        token.apply_refresh(refreshed);
        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
        assert!(!token.is_expired(60));
    }

    #[test]
    fn test_apply_refresh_rotates_refresh_token_when_returned() {
        let mut token = token_expiring_in(-10);
        let mut refreshed = token_expiring_in(3600);
        refreshed.refresh_token = Some("rotated".to_string());

        token.apply_refresh(refreshed);
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let store = TokenStore::empty(&path);
        store.set(token_expiring_in(3600)).await;

        let reloaded = TokenStore::load(&path);
        let token = reloaded.current().await.expect("token should reload");
        assert_eq!(token.access_token, "access");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
        assert!(reloaded.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("nope.json"));
        assert!(store.current().await.is_none());
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TokenStore::load(&path);
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_with_refresh_is_refreshable() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::with_token(dir.path().join("t.json"), token_expiring_in(-10));
        assert!(!store.is_authenticated().await);
        assert!(store.is_refreshable().await);
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_is_not_refreshable() {
        let dir = tempfile::tempdir().unwrap();
        let mut token = token_expiring_in(-10);
        token.refresh_token = None;
        let store = TokenStore::with_token(dir.path().join("t.json"), token);
        assert!(!store.is_refreshable().await);
    }
}
