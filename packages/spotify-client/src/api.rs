//! Typed wrappers for the playback, device, and search endpoints

use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::client::ApiClient;
use crate::error::SpotifyResult;
use crate::models::{
    Device, PlaybackState, RawDeviceList, RawPlaybackState, RawSearchPage, SearchItem,
    SearchResourceKind, SearchResults,
};

/// Append a `device_id` query parameter when a target device is given
fn player_path(base: &str, device_id: Option<&str>) -> String {
    match device_id {
        Some(id) if !id.is_empty() => {
            let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
            format!("{}?device_id={}", base, encoded)
        }
        _ => base.to_string(),
    }
}

impl ApiClient {
    /// Read the current playback state.
    ///
    /// Returns `None` when nothing is playing anywhere (the provider answers
    /// with an empty 204 in that case).
    #[instrument(skip(self))]
    pub async fn playback_state(&self) -> SpotifyResult<Option<PlaybackState>> {
        let value = self.request(Method::GET, "me/player", None).await?;
        // An empty 204 comes back as the synthetic success marker
        if value.get("is_playing").is_none() {
            return Ok(None);
        }
        let raw: RawPlaybackState = serde_json::from_value(value)?;
        Ok(Some(raw.into()))
    }

    /// Resume playback, optionally on a specific device
    pub async fn resume(&self, device_id: Option<&str>) -> SpotifyResult<()> {
        self.request(Method::PUT, &player_path("me/player/play", device_id), None)
            .await?;
        Ok(())
    }

    /// Start playback of specific track URIs
    pub async fn play_uris(&self, uris: &[String], device_id: Option<&str>) -> SpotifyResult<()> {
        self.request(
            Method::PUT,
            &player_path("me/player/play", device_id),
            Some(json!({ "uris": uris })),
        )
        .await?;
        Ok(())
    }

    /// Start playback of a context (album, artist, or playlist URI)
    pub async fn play_context(
        &self,
        context_uri: &str,
        device_id: Option<&str>,
    ) -> SpotifyResult<()> {
        self.request(
            Method::PUT,
            &player_path("me/player/play", device_id),
            Some(json!({ "context_uri": context_uri })),
        )
        .await?;
        Ok(())
    }

    /// Pause playback
    pub async fn pause(&self, device_id: Option<&str>) -> SpotifyResult<()> {
        self.request(Method::PUT, &player_path("me/player/pause", device_id), None)
            .await?;
        Ok(())
    }

    /// Skip to the next track
    pub async fn next_track(&self, device_id: Option<&str>) -> SpotifyResult<()> {
        self.request(Method::POST, &player_path("me/player/next", device_id), None)
            .await?;
        Ok(())
    }

    /// Skip to the previous track
    pub async fn previous_track(&self, device_id: Option<&str>) -> SpotifyResult<()> {
        self.request(
            Method::POST,
            &player_path("me/player/previous", device_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// List available devices.
    ///
    /// Always fetched fresh; device state is never cached across calls.
    #[instrument(skip(self))]
    pub async fn devices(&self) -> SpotifyResult<Vec<Device>> {
        let value = self.request(Method::GET, "me/player/devices", None).await?;
        let raw: RawDeviceList = serde_json::from_value(value)?;
        let devices: Vec<Device> = raw.devices.into_iter().map(Into::into).collect();
        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Transfer playback to a device, optionally starting playback there
    #[instrument(skip(self))]
    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> SpotifyResult<()> {
        self.request(
            Method::PUT,
            "me/player",
            Some(json!({ "device_ids": [device_id], "play": play })),
        )
        .await?;
        Ok(())
    }

    /// Search for resources of a single type
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        kind: SearchResourceKind,
        limit: u32,
    ) -> SpotifyResult<SearchResults> {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let path = format!(
            "search?q={}&type={}&limit={}",
            encoded,
            kind.api_type(),
            limit
        );
        let value = self.request(Method::GET, &path, None).await?;

        let items = match value.get(kind.api_results_key()) {
            Some(page) => {
                let raw: RawSearchPage = serde_json::from_value(page.clone())?;
                raw.items.into_iter().map(SearchItem::from).collect()
            }
            None => Vec::new(),
        };

        debug!(query, kind = kind.api_type(), result_count = items.len(), "Search completed");
        Ok(SearchResults { items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_path_without_device() {
        assert_eq!(player_path("me/player/play", None), "me/player/play");
        assert_eq!(player_path("me/player/play", Some("")), "me/player/play");
    }

    #[test]
    fn test_player_path_with_device() {
        assert_eq!(
            player_path("me/player/pause", Some("d1")),
            "me/player/pause?device_id=d1"
        );
    }

    #[test]
    fn test_player_path_encodes_device_id() {
        assert_eq!(
            player_path("me/player/play", Some("a b")),
            "me/player/play?device_id=a+b"
        );
    }
}
