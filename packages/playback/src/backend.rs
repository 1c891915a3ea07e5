//! The playback capability contract

use async_trait::async_trait;

use crate::result::{BackendKind, PlaybackResult};

/// Capability interface implemented by the two playback backends.
///
/// Every operation returns a [`PlaybackResult`]; implementations never let
/// an error escape this boundary. `is_available` is a side-channel used only
/// for backend selection, never for business branching once selected.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Identity for logging and introspection
    fn kind(&self) -> BackendKind;

    /// Whether this backend can currently service operations
    async fn is_available(&self) -> bool;

    /// Resume playback
    async fn play(&self) -> PlaybackResult;

    /// Pause playback
    async fn pause(&self) -> PlaybackResult;

    /// Report what is currently playing
    async fn get_status(&self) -> PlaybackResult;

    /// Play a track by resource URI or free-text query
    async fn play_track(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult;

    /// Play an album by resource URI or free-text query
    async fn play_album(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult;

    /// Play an artist by resource URI or free-text query
    async fn play_artist(&self, identifier: &str) -> PlaybackResult;

    /// Skip to the next track
    async fn next_track(&self) -> PlaybackResult;

    /// Skip to the previous track
    async fn previous_track(&self) -> PlaybackResult;
}
