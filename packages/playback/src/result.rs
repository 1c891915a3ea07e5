//! The unified result value crossing the control-plane boundary
//!
//! Every backend operation returns exactly one [`PlaybackResult`]; it is the
//! sole channel for success/failure information leaving the core.

use serde::{Deserialize, Serialize};

/// Which backend produced a result
///
/// For introspection, logging, and test assertions only. Business branching
/// goes through the [`crate::PlaybackBackend`] trait, never through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Remote,
    Local,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// The operation a result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackAction {
    Play,
    Pause,
    Status,
    PlayTrack,
    PlayAlbum,
    PlayArtist,
    NextTrack,
    PreviousTrack,
}

impl std::fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Status => "status",
            Self::PlayTrack => "play_track",
            Self::PlayAlbum => "play_album",
            Self::PlayArtist => "play_artist",
            Self::NextTrack => "next_track",
            Self::PreviousTrack => "previous_track",
        };
        write!(f, "{}", name)
    }
}

/// Typed failure classification for user-visible errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Token invalid, missing, or unrefreshable; re-authentication required
    Auth,
    /// The provider reported no devices at all
    NoDevicesAvailable,
    /// Every activation candidate failed to take over playback
    DeviceActivationFailed,
    /// Track/album/artist resolution found no acceptable match
    ResourceNotFound,
    /// Capability absent on the selected backend
    NotSupported,
    /// Generic non-2xx remote failure
    Provider,
    /// The local application is not running or cannot be found
    BackendNotRunning,
    /// The scripting layer reported a failure
    Scripting,
    /// A call exceeded its bounded timeout
    Timeout,
    /// Input rejected before any backend call
    Validation,
    /// Neither backend is configured and usable
    NoBackendAvailable,
}

impl ErrorKind {
    /// Default retry hint for this failure class.
    ///
    /// Individual results may override it; a scripting syntax error, for
    /// example, is a [`ErrorKind::Scripting`] that retrying verbatim cannot
    /// fix.
    pub fn default_retry_possible(&self) -> bool {
        matches!(
            self,
            Self::DeviceActivationFailed | Self::Provider | Self::Scripting | Self::Timeout
        )
    }
}

/// Outcome of a single playback operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// The operation this result refers to
    pub action: PlaybackAction,
    /// Human-readable outcome description
    pub message: String,
    /// Track name, when the operation touched one
    pub track: Option<String>,
    /// Artist name, when known
    pub artist: Option<String>,
    /// Which backend handled the operation.
    ///
    /// When selection itself fails (`NoBackendAvailable`) no backend ran;
    /// this then carries the configured preference so logs still show
    /// which side was asked for.
    pub backend: BackendKind,
    /// Failure classification, present iff `success` is false
    pub error_kind: Option<ErrorKind>,
    /// Human-readable failure description
    pub error_message: Option<String>,
    /// Whether re-issuing the same request could help
    pub retry_possible: bool,
}

impl PlaybackResult {
    /// Create a successful result
    pub fn ok(action: PlaybackAction, backend: BackendKind, message: impl Into<String>) -> Self {
        Self {
            success: true,
            action,
            message: message.into(),
            track: None,
            artist: None,
            backend,
            error_kind: None,
            error_message: None,
            retry_possible: false,
        }
    }

    /// Create a failed result with the kind's default retry hint
    pub fn failed(
        action: PlaybackAction,
        backend: BackendKind,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            success: false,
            action,
            message: message.clone(),
            track: None,
            artist: None,
            backend,
            error_kind: Some(kind),
            error_message: Some(message),
            retry_possible: kind.default_retry_possible(),
        }
    }

    /// Attach track/artist details
    pub fn with_track(mut self, track: impl Into<String>, artist: Option<String>) -> Self {
        self.track = Some(track.into());
        self.artist = artist;
        self
    }

    /// Override the retry hint
    pub fn with_retry_possible(mut self, retry_possible: bool) -> Self {
        self.retry_possible = retry_possible;
        self
    }

    /// Log the result at an appropriate level
    pub fn log(&self) {
        if self.success {
            tracing::info!(
                action = %self.action,
                backend = %self.backend,
                track = self.track.as_deref(),
                "Playback operation succeeded"
            );
        } else {
            tracing::warn!(
                action = %self.action,
                backend = %self.backend,
                error_kind = ?self.error_kind,
                retry_possible = self.retry_possible,
                error = self.error_message.as_deref(),
                "Playback operation failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_result_has_no_error() {
        let result = PlaybackResult::ok(PlaybackAction::Play, BackendKind::Remote, "resumed");
        assert!(result.success);
        assert!(result.error_kind.is_none());
        assert!(result.error_message.is_none());
        assert!(!result.retry_possible);
    }

    #[test]
    fn test_failed_result_carries_kind_and_message() {
        let result = PlaybackResult::failed(
            PlaybackAction::PlayTrack,
            BackendKind::Local,
            ErrorKind::NotSupported,
            "resource URIs are not supported by the local backend",
        );
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NotSupported));
        assert!(!result.retry_possible);
        assert!(result.error_message.is_some());
    }

    #[test]
    fn test_default_retry_hints() {
        assert!(ErrorKind::DeviceActivationFailed.default_retry_possible());
        assert!(ErrorKind::Timeout.default_retry_possible());
        assert!(!ErrorKind::Auth.default_retry_possible());
        assert!(!ErrorKind::NotSupported.default_retry_possible());
        assert!(!ErrorKind::Validation.default_retry_possible());
        assert!(!ErrorKind::NoBackendAvailable.default_retry_possible());
    }

    #[test]
    fn test_retry_override() {
        let result = PlaybackResult::failed(
            PlaybackAction::PlayTrack,
            BackendKind::Local,
            ErrorKind::Scripting,
            "syntax error in command",
        )
        .with_retry_possible(false);
        assert!(!result.retry_possible);
    }
}
