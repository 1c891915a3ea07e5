//! Spotify Web API response models

use serde::{Deserialize, Serialize};

/// A playback device as reported by the provider
///
/// Devices are fetched fresh for every operation and never cached; ownership
/// is purely request-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Provider device id (empty when the provider withholds it)
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Whether this device currently owns playback
    pub is_active: bool,
    /// Restricted devices reject transfer and playback commands
    pub is_restricted: bool,
}

/// Currently playing track details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track name
    pub name: String,
    /// Primary artist name
    pub artist: String,
    /// Fully-qualified resource URI
    pub uri: String,
    /// Album name, when reported
    pub album: Option<String>,
}

/// Snapshot of the current playback state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Whether playback is running
    pub is_playing: bool,
    /// Device owning playback, if any
    pub device: Option<Device>,
    /// Currently playing track, if any
    pub track: Option<TrackInfo>,
    /// Progress into the track in milliseconds
    pub progress_ms: Option<u64>,
}

/// The resource types addressable by a fully-qualified URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResourceKind {
    Track,
    Album,
    Artist,
    Playlist,
}

impl SearchResourceKind {
    /// The fixed URI prefix for this resource type
    pub fn uri_prefix(&self) -> &'static str {
        match self {
            Self::Track => "spotify:track:",
            Self::Album => "spotify:album:",
            Self::Artist => "spotify:artist:",
            Self::Playlist => "spotify:playlist:",
        }
    }

    /// The `type` parameter value for the search endpoint
    pub fn api_type(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
        }
    }

    /// The plural key under which the search endpoint nests results
    pub fn api_results_key(&self) -> &'static str {
        match self {
            Self::Track => "tracks",
            Self::Album => "albums",
            Self::Artist => "artists",
            Self::Playlist => "playlists",
        }
    }

    /// Recognize a fully-qualified resource URI of any known type
    pub fn of_uri(identifier: &str) -> Option<Self> {
        [Self::Track, Self::Album, Self::Artist, Self::Playlist]
            .into_iter()
            .find(|kind| identifier.starts_with(kind.uri_prefix()))
    }
}

/// A single search result candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    /// Fully-qualified resource URI
    pub uri: String,
    /// Resource name
    pub name: String,
    /// Primary artist, when the resource type carries one
    pub artist: Option<String>,
}

/// Search results for a single resource type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<SearchItem>,
}

// Internal response types for deserialization

#[derive(Debug, Deserialize)]
pub(crate) struct RawDeviceList {
    pub devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDevice {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        Self {
            id: raw.id.unwrap_or_default(),
            name: raw.name,
            is_active: raw.is_active,
            is_restricted: raw.is_restricted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaybackState {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub device: Option<RawDevice>,
    #[serde(default)]
    pub item: Option<RawTrack>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrack {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<RawArtistRef>,
    #[serde(default)]
    pub album: Option<RawAlbumRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbumRef {
    pub name: String,
}

impl From<RawPlaybackState> for PlaybackState {
    fn from(raw: RawPlaybackState) -> Self {
        Self {
            is_playing: raw.is_playing,
            device: raw.device.map(Into::into),
            track: raw.item.map(|item| TrackInfo {
                artist: item
                    .artists
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                album: item.album.map(|a| a.name),
                name: item.name,
                uri: item.uri,
            }),
            progress_ms: raw.progress_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchPage {
    #[serde(default)]
    pub items: Vec<RawSearchItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchItem {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<RawArtistRef>,
}

impl From<RawSearchItem> for SearchItem {
    fn from(raw: RawSearchItem) -> Self {
        Self {
            artist: raw.artists.first().map(|a| a.name.clone()),
            name: raw.name,
            uri: raw.uri,
        }
    }
}

/// Spotify error envelope: `{"error": {"status": 404, "message": "...", "reason": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
}
