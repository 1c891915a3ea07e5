//! Shared test utilities for the Chorus workspace
//!
//! This crate provides a mock Spotify accounts service and Web API for
//! testing the playback control plane without network dependencies.
//!
//! # Example
//!
//! ```rust,ignore
//! use chorus_test_utils::{MockSpotifyServer, DeviceFixture};
//!
//! #[tokio::test]
//! async fn test_with_mock() {
//!     let server = MockSpotifyServer::start().await;
//!     server.mock_devices(vec![DeviceFixture::active("d1", "Office")]).await;
//!
//!     // Point SpotifyConfig's api_base_url and token_url at server.url()
//! }
//! ```

mod spotify;

pub use spotify::{DeviceFixture, MockSpotifyServer, TrackFixture};
