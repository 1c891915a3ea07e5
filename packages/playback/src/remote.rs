//! Remote backend over the Spotify Web API
//!
//! Adds two behaviors on top of the raw client: resolution of free-text
//! queries to resource URIs via search-and-score, and device activation
//! when the provider reports that no device currently owns playback.
//!
//! Device state is always fetched fresh; nothing here caches a device
//! across calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use chorus_shared_config::PlaybackConfig;
use chorus_spotify_client::{ApiClient, Device, SearchResourceKind, SpotifyError};

use crate::backend::PlaybackBackend;
use crate::resolve::best_match;
use crate::result::{BackendKind, ErrorKind, PlaybackAction, PlaybackResult};

/// How many candidates to request per search call
const SEARCH_LIMIT: u32 = 10;

/// A player mutation to issue, with or without an explicit target device
#[derive(Debug, Clone)]
enum PlayerCommand {
    Resume,
    Pause,
    Next,
    Previous,
    Uris(Vec<String>),
    Context(String),
}

impl PlayerCommand {
    fn success_message(&self) -> &'static str {
        match self {
            Self::Resume => "Playback resumed",
            Self::Pause => "Playback paused",
            Self::Next => "Skipped to next track",
            Self::Previous => "Skipped to previous track",
            Self::Uris(_) | Self::Context(_) => "Started playback",
        }
    }
}

/// Playback backend driving the remote provider
pub struct RemoteBackend {
    api: Arc<ApiClient>,
    preferred_devices: Vec<String>,
    target_device: Option<String>,
    activation_delay: Duration,
    min_match_score: f64,
}

impl RemoteBackend {
    /// Create a backend over an API client, taking the activation policy
    /// from the playback configuration
    pub fn new(api: Arc<ApiClient>, config: &PlaybackConfig) -> Self {
        Self {
            api,
            preferred_devices: config.preferred_devices.clone(),
            target_device: None,
            activation_delay: Duration::from_millis(config.activation_delay_ms),
            min_match_score: config.min_match_score,
        }
    }

    /// Explicitly target a device id; it becomes the first activation candidate
    pub fn with_target_device(mut self, device_id: impl Into<String>) -> Self {
        self.target_device = Some(device_id.into());
        self
    }

    /// Map a client error into a failed result
    fn failure(&self, action: PlaybackAction, err: &SpotifyError) -> PlaybackResult {
        let (kind, retry_possible) = match err {
            SpotifyError::Auth(_) => (ErrorKind::Auth, false),
            SpotifyError::Timeout => (ErrorKind::Timeout, true),
            SpotifyError::Parse(_) => (ErrorKind::Provider, false),
            _ => (ErrorKind::Provider, err.is_retryable()),
        };
        PlaybackResult::failed(action, BackendKind::Remote, kind, err.to_string())
            .with_retry_possible(retry_possible)
    }

    /// Issue a player command, optionally against an explicit device
    async fn send(
        &self,
        command: &PlayerCommand,
        device_id: Option<&str>,
    ) -> Result<(), SpotifyError> {
        match command {
            PlayerCommand::Resume => self.api.resume(device_id).await,
            PlayerCommand::Pause => self.api.pause(device_id).await,
            PlayerCommand::Next => self.api.next_track(device_id).await,
            PlayerCommand::Previous => self.api.previous_track(device_id).await,
            PlayerCommand::Uris(uris) => self.api.play_uris(uris, device_id).await,
            PlayerCommand::Context(uri) => self.api.play_context(uri, device_id).await,
        }
    }

    /// Run a player command with the no-devices short-circuit and the
    /// no-active-device recovery cycle.
    ///
    /// State machine: list devices → attempt → [no active device] →
    /// activate → retry the original command exactly once.
    async fn run_player_command(
        &self,
        action: PlaybackAction,
        command: PlayerCommand,
    ) -> PlaybackResult {
        let devices = match self.api.devices().await {
            Ok(devices) => devices,
            Err(e) => return self.failure(action, &e),
        };

        if devices.is_empty() {
            debug!(action = %action, "No devices listed, short-circuiting");
            return PlaybackResult::failed(
                action,
                BackendKind::Remote,
                ErrorKind::NoDevicesAvailable,
                "no playback devices are available",
            );
        }

        match self.send(&command, None).await {
            Ok(()) => PlaybackResult::ok(action, BackendKind::Remote, command.success_message()),
            Err(e) if e.is_no_active_device() => {
                debug!(action = %action, "No active device, starting activation");
                match self.activate_device(&devices).await {
                    Some(device) => match self.send(&command, Some(&device.id)).await {
                        Ok(()) => PlaybackResult::ok(
                            action,
                            BackendKind::Remote,
                            format!("{} on {}", command.success_message(), device.name),
                        ),
                        Err(e) => self.failure(action, &e),
                    },
                    None => PlaybackResult::failed(
                        action,
                        BackendKind::Remote,
                        ErrorKind::DeviceActivationFailed,
                        "no device could be activated for playback",
                    ),
                }
            }
            Err(e) => self.failure(action, &e),
        }
    }

    /// Activation candidates in strict priority order: the explicit target
    /// id first, then the configured preferred device names in order, then
    /// all remaining devices in listing order. Restricted devices and
    /// devices without an id are not usable transfer targets.
    fn candidate_order<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        let mut ordered: Vec<&'a Device> = Vec::new();
        let mut push = |device: &'a Device, ordered: &mut Vec<&'a Device>| {
            if !ordered.iter().any(|d| d.id == device.id) {
                ordered.push(device);
            }
        };

        if let Some(target) = &self.target_device {
            if let Some(device) = devices.iter().find(|d| &d.id == target) {
                push(device, &mut ordered);
            }
        }
        for name in &self.preferred_devices {
            if let Some(device) = devices.iter().find(|d| &d.name == name) {
                push(device, &mut ordered);
            }
        }
        for device in devices {
            push(device, &mut ordered);
        }

        ordered.retain(|d| !d.id.is_empty() && !d.is_restricted);
        ordered
    }

    /// Try to hand playback to a candidate device.
    ///
    /// Per candidate: transfer with play, wait a fixed delay, re-list and
    /// check the candidate reports active. Stops at the first success.
    #[instrument(skip(self, devices))]
    async fn activate_device(&self, devices: &[Device]) -> Option<Device> {
        for candidate in self.candidate_order(devices) {
            debug!(device_id = %candidate.id, device_name = %candidate.name, "Trying activation candidate");

            if let Err(e) = self.api.transfer_playback(&candidate.id, true).await {
                warn!(device_id = %candidate.id, error = %e, "Transfer request failed");
                continue;
            }

            tokio::time::sleep(self.activation_delay).await;

            match self.api.devices().await {
                Ok(current) => {
                    if current.iter().any(|d| d.id == candidate.id && d.is_active) {
                        debug!(device_id = %candidate.id, "Device activated");
                        return Some(candidate.clone());
                    }
                    debug!(device_id = %candidate.id, "Device did not activate");
                }
                Err(e) => warn!(error = %e, "Device re-listing failed during activation"),
            }
        }
        None
    }

    /// Resolve a free-text query to the best-matching resource of one type.
    ///
    /// Exactly one search call is issued; identifiers that already carry a
    /// resource URI never reach this path.
    async fn resolve(
        &self,
        action: PlaybackAction,
        query: &str,
        artist_hint: Option<&str>,
        kind: SearchResourceKind,
    ) -> Result<chorus_spotify_client::SearchItem, PlaybackResult> {
        let search_query = match artist_hint {
            Some(hint) => format!("{} artist:{}", query, hint),
            None => query.to_string(),
        };

        let results = self
            .api
            .search(&search_query, kind, SEARCH_LIMIT)
            .await
            .map_err(|e| self.failure(action, &e))?;

        match best_match(&results.items, query, artist_hint, self.min_match_score) {
            Some(item) => Ok(item.clone()),
            None => Err(PlaybackResult::failed(
                action,
                BackendKind::Remote,
                ErrorKind::ResourceNotFound,
                format!("no {} matching '{}'", kind.api_type(), query),
            )),
        }
    }
}

#[async_trait]
impl PlaybackBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    /// Available when a valid or refreshable token is held
    async fn is_available(&self) -> bool {
        self.api.has_usable_credentials().await
    }

    async fn play(&self) -> PlaybackResult {
        self.run_player_command(PlaybackAction::Play, PlayerCommand::Resume)
            .await
    }

    async fn pause(&self) -> PlaybackResult {
        self.run_player_command(PlaybackAction::Pause, PlayerCommand::Pause)
            .await
    }

    async fn get_status(&self) -> PlaybackResult {
        match self.api.playback_state().await {
            Err(e) => self.failure(PlaybackAction::Status, &e),
            Ok(None) => PlaybackResult::ok(
                PlaybackAction::Status,
                BackendKind::Remote,
                "Nothing is currently playing",
            ),
            Ok(Some(state)) => {
                let verb = if state.is_playing { "Playing" } else { "Paused" };
                match state.track {
                    Some(track) => PlaybackResult::ok(
                        PlaybackAction::Status,
                        BackendKind::Remote,
                        format!("{}: {} by {}", verb, track.name, track.artist),
                    )
                    .with_track(track.name, Some(track.artist)),
                    None => PlaybackResult::ok(
                        PlaybackAction::Status,
                        BackendKind::Remote,
                        verb.to_string(),
                    ),
                }
            }
        }
    }

    async fn play_track(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let action = PlaybackAction::PlayTrack;
        if let Some(kind) = SearchResourceKind::of_uri(identifier) {
            let command = match kind {
                SearchResourceKind::Track => PlayerCommand::Uris(vec![identifier.to_string()]),
                _ => PlayerCommand::Context(identifier.to_string()),
            };
            return self.run_player_command(action, command).await;
        }

        let item = match self
            .resolve(action, identifier, artist_hint, SearchResourceKind::Track)
            .await
        {
            Ok(item) => item,
            Err(result) => return result,
        };

        let result = self
            .run_player_command(action, PlayerCommand::Uris(vec![item.uri.clone()]))
            .await;
        if result.success {
            result.with_track(item.name, item.artist)
        } else {
            result
        }
    }

    async fn play_album(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let action = PlaybackAction::PlayAlbum;
        if SearchResourceKind::of_uri(identifier).is_some() {
            return self
                .run_player_command(action, PlayerCommand::Context(identifier.to_string()))
                .await;
        }

        let item = match self
            .resolve(action, identifier, artist_hint, SearchResourceKind::Album)
            .await
        {
            Ok(item) => item,
            Err(result) => return result,
        };

        let result = self
            .run_player_command(action, PlayerCommand::Context(item.uri.clone()))
            .await;
        if result.success {
            result.with_track(item.name, item.artist)
        } else {
            result
        }
    }

    async fn play_artist(&self, identifier: &str) -> PlaybackResult {
        let action = PlaybackAction::PlayArtist;
        if SearchResourceKind::of_uri(identifier).is_some() {
            return self
                .run_player_command(action, PlayerCommand::Context(identifier.to_string()))
                .await;
        }

        let item = match self
            .resolve(action, identifier, None, SearchResourceKind::Artist)
            .await
        {
            Ok(item) => item,
            Err(result) => return result,
        };

        let result = self
            .run_player_command(action, PlayerCommand::Context(item.uri.clone()))
            .await;
        if result.success {
            result.with_track(item.name, None)
        } else {
            result
        }
    }

    async fn next_track(&self) -> PlaybackResult {
        self.run_player_command(PlaybackAction::NextTrack, PlayerCommand::Next)
            .await
    }

    async fn previous_track(&self) -> PlaybackResult {
        self.run_player_command(PlaybackAction::PreviousTrack, PlayerCommand::Previous)
            .await
    }
}
