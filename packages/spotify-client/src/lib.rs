//! Spotify Web API client for Chorus
//!
//! This crate provides the remote half of the playback control plane:
//! - OAuth2 authorization-code flow with persisted tokens and serialized refresh
//! - An authenticated HTTP client with transparent token refresh, a single
//!   401 refresh-and-retry, and bounded retries for transient failures
//! - Typed wrappers for the playback, device, and search endpoints
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus_shared_config::SpotifyConfig;
//! use chorus_spotify_client::{ApiClient, TokenStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SpotifyConfig::from_env()?;
//! let store = TokenStore::load(&config.token_file);
//! let client = ApiClient::new(config, store)?;
//!
//! if client.is_authenticated().await {
//!     let devices = client.devices().await?;
//!     for device in devices {
//!         println!("{} (active: {})", device.name, device.is_active);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! - `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`: OAuth2 client credentials
//! - `SPOTIFY_TOKEN_FILE`: path to the persisted token JSON (optional)

mod api;
mod auth;
mod client;
mod error;
mod models;
mod token;

pub use auth::OAuthFlow;
pub use client::ApiClient;
pub use error::{SpotifyError, SpotifyResult};
pub use models::{
    Device, PlaybackState, SearchItem, SearchResourceKind, SearchResults, TrackInfo,
};
pub use token::{Token, TokenStore, DEFAULT_EXPIRY_BUFFER_SECS};
