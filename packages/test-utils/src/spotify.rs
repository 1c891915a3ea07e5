//! Mock Spotify accounts service and Web API for testing
//!
//! Provides a [`MockSpotifyServer`] that simulates the token endpoint and
//! the playback/device/search endpoints, plus fixtures for devices and
//! search results. Call-count properties ("the play endpoint was never
//! hit", "exactly one search was issued") are expressed through wiremock
//! expectations and checked by [`MockSpotifyServer::verify`].

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A device entry for the device-listing endpoint
#[derive(Debug, Clone)]
pub struct DeviceFixture {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub is_restricted: bool,
}

impl DeviceFixture {
    /// An inactive, unrestricted device
    pub fn inactive(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            is_active: false,
            is_restricted: false,
        }
    }

    /// An active device
    pub fn active(id: &str, name: &str) -> Self {
        Self {
            is_active: true,
            ..Self::inactive(id, name)
        }
    }

    /// A restricted device (rejects transfer commands)
    pub fn restricted(id: &str, name: &str) -> Self {
        Self {
            is_restricted: true,
            ..Self::inactive(id, name)
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "is_active": self.is_active,
            "is_restricted": self.is_restricted,
            "type": "Computer",
            "volume_percent": 100
        })
    }
}

/// A track entry for the search endpoint
#[derive(Debug, Clone)]
pub struct TrackFixture {
    pub name: String,
    pub artist: String,
    pub uri: String,
}

impl TrackFixture {
    pub fn new(name: &str, artist: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            artist: artist.to_string(),
            uri: uri.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "uri": self.uri,
            "artists": [{"name": self.artist}]
        })
    }
}

/// Mock Spotify server for testing the playback control plane
pub struct MockSpotifyServer {
    server: MockServer,
}

impl MockSpotifyServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL, used for both the API base and the token endpoint
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.server.uri())
    }

    /// Access the underlying wiremock server for custom mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Assert all mounted expectations
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    // ---- Token endpoint ----

    /// Mount a mock for a successful authorization-code exchange
    pub async fn mock_token_exchange(&self, access_token: &str, refresh_token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "scope": "user-read-playback-state user-modify-playback-state",
                "expires_in": 3600,
                "refresh_token": refresh_token
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a successful refresh grant.
    ///
    /// `expected_calls` pins how many refreshes the scenario may perform.
    pub async fn mock_token_refresh(&self, access_token: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "scope": "",
                "expires_in": 3600
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a refresh grant that rotates the refresh token
    pub async fn mock_token_refresh_with_rotation(
        &self,
        access_token: &str,
        new_refresh_token: &str,
    ) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "scope": "",
                "expires_in": 3600,
                "refresh_token": new_refresh_token
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a rejected refresh grant
    pub async fn mock_token_refresh_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Refresh token revoked"
            })))
            .mount(&self.server)
            .await;
    }

    // ---- Device endpoints ----

    /// Mount a mock for the device listing
    pub async fn mock_devices(&self, devices: Vec<DeviceFixture>) {
        let devices_json: Vec<serde_json::Value> = devices.iter().map(|d| d.to_json()).collect();
        Mock::given(method("GET"))
            .and(path("/me/player/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "devices": devices_json
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for an empty device listing
    pub async fn mock_devices_empty(&self) {
        self.mock_devices(Vec::new()).await;
    }

    /// Mount a one-shot device listing, consumed by the first request.
    ///
    /// wiremock matches in mount order, so mount one-shots before any
    /// permanent listing for the same path.
    pub async fn mock_devices_once(&self, devices: Vec<DeviceFixture>) {
        let devices_json: Vec<serde_json::Value> = devices.iter().map(|d| d.to_json()).collect();
        Mock::given(method("GET"))
            .and(path("/me/player/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "devices": devices_json
            })))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a successful transfer, expecting a call count
    pub async fn mock_transfer_success(&self, expected_calls: u64) {
        Mock::given(method("PUT"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    // ---- Playback endpoints ----

    /// Mount a mock for the play endpoint, expecting a call count.
    ///
    /// Responds 204 with no body; the client must treat that as success.
    pub async fn mock_play_success(&self, expected_calls: u64) {
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(204))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock rejecting play with the NO_ACTIVE_DEVICE reason
    pub async fn mock_play_no_active_device(&self) {
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "status": 404,
                    "message": "Player command failed: No active device found",
                    "reason": "NO_ACTIVE_DEVICE"
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a one-shot NO_ACTIVE_DEVICE rejection for the play endpoint
    pub async fn mock_play_no_active_device_once(&self) {
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "status": 404,
                    "message": "Player command failed: No active device found",
                    "reason": "NO_ACTIVE_DEVICE"
                }
            })))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Mount a one-shot 401 for the play endpoint
    pub async fn mock_play_unauthorized_once(&self) {
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"status": 401, "message": "The access token expired"}
            })))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Mount a one-shot 429 for the play endpoint
    pub async fn mock_play_rate_limited_once(&self) {
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"status": 429, "message": "API rate limit exceeded"}
            })))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the pause endpoint, expecting a call count
    pub async fn mock_pause_success(&self, expected_calls: u64) {
        Mock::given(method("PUT"))
            .and(path("/me/player/pause"))
            .respond_with(ResponseTemplate::new(204))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mount mocks for the skip endpoints
    pub async fn mock_skip_success(&self) {
        Mock::given(method("POST"))
            .and(path("/me/player/next"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/me/player/previous"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the current playback state
    pub async fn mock_playback_state(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock reporting no playback anywhere (empty 204)
    pub async fn mock_playback_state_empty(&self) {
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    // ---- Search endpoint ----

    /// Mount a mock for a track search, expecting a call count
    pub async fn mock_search_tracks(&self, tracks: Vec<TrackFixture>, expected_calls: u64) {
        let items: Vec<serde_json::Value> = tracks.iter().map(|t| t.to_json()).collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "track"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": {"items": items}
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for an album search
    pub async fn mock_search_albums(&self, albums: Vec<TrackFixture>) {
        let items: Vec<serde_json::Value> = albums.iter().map(|t| t.to_json()).collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "album"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "albums": {"items": items}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for an artist search
    pub async fn mock_search_artists(&self, artists: Vec<TrackFixture>) {
        let items: Vec<serde_json::Value> = artists.iter().map(|t| t.to_json()).collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "artist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": {"items": items}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for an empty search result for any resource type
    pub async fn mock_search_empty(&self) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": {"items": []},
                "albums": {"items": []},
                "artists": {"items": []},
                "playlists": {"items": []}
            })))
            .mount(&self.server)
            .await;
    }
}
