//! Backend selection and the public playback surface
//!
//! [`PlaybackService`] owns up to two backends and picks one per call:
//! a forced backend wins outright, otherwise availability is probed in
//! preference order. Selection is per call; a backend that was down a
//! moment ago gets a fresh chance on the next operation.

use std::sync::Arc;

use tracing::debug;

use chorus_shared_config::PlaybackConfig;

use crate::backend::PlaybackBackend;
use crate::local::LocalBackend;
use crate::remote::RemoteBackend;
use crate::result::{BackendKind, ErrorKind, PlaybackAction, PlaybackResult};

/// Unified playback entry point over the configured backends
pub struct PlaybackService {
    remote: Option<Arc<dyn PlaybackBackend>>,
    local: Option<Arc<dyn PlaybackBackend>>,
    config: PlaybackConfig,
    forced: Option<BackendKind>,
}

impl PlaybackService {
    /// Create a service with no backends; attach them with
    /// [`with_remote`](Self::with_remote) and [`with_local`](Self::with_local)
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            remote: None,
            local: None,
            config,
            forced: None,
        }
    }

    /// Attach the remote backend
    pub fn with_remote(mut self, backend: Arc<RemoteBackend>) -> Self {
        self.remote = Some(backend);
        self
    }

    /// Attach the local backend
    pub fn with_local(mut self, backend: Arc<LocalBackend>) -> Self {
        self.local = Some(backend);
        self
    }

    /// Pin all subsequent operations to one backend, or `None` to restore
    /// per-call selection. A forced backend is used without probing its
    /// availability.
    pub fn force_backend(&mut self, kind: Option<BackendKind>) {
        self.forced = kind;
    }

    /// Kinds of backends that are configured and currently available
    pub async fn available_backends(&self) -> Vec<BackendKind> {
        let mut kinds = Vec::new();
        for backend in [&self.remote, &self.local].into_iter().flatten() {
            if backend.is_available().await {
                kinds.push(backend.kind());
            }
        }
        kinds
    }

    fn backend_of_kind(&self, kind: BackendKind) -> Option<Arc<dyn PlaybackBackend>> {
        match kind {
            BackendKind::Remote => self.remote.clone(),
            BackendKind::Local => self.local.clone(),
        }
    }

    /// Terminal selection failure; no backend ran, so the result is
    /// attributed to the configured preference
    fn no_backend(&self, action: PlaybackAction, message: &str) -> PlaybackResult {
        let kind = if self.config.prefer_remote {
            BackendKind::Remote
        } else {
            BackendKind::Local
        };
        PlaybackResult::failed(action, kind, ErrorKind::NoBackendAvailable, message)
    }

    /// Pick the backend for one operation
    async fn select(&self, action: PlaybackAction) -> Result<Arc<dyn PlaybackBackend>, PlaybackResult> {
        if let Some(kind) = self.forced {
            return self
                .backend_of_kind(kind)
                .ok_or_else(|| self.no_backend(action, "forced backend is not configured"));
        }

        let mut candidates: Vec<Arc<dyn PlaybackBackend>> = Vec::new();
        if self.config.prefer_remote {
            candidates.extend(self.remote.clone());
            if self.config.allow_local_fallback {
                candidates.extend(self.local.clone());
            }
        } else {
            candidates.extend(self.local.clone());
            candidates.extend(self.remote.clone());
        }

        for backend in candidates {
            if backend.is_available().await {
                debug!(action = %action, backend = %backend.kind(), "Selected backend");
                return Ok(backend);
            }
        }

        Err(self.no_backend(action, "no playback backend is available"))
    }

    pub async fn play(&self) -> PlaybackResult {
        let result = match self.select(PlaybackAction::Play).await {
            Ok(backend) => backend.play().await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn pause(&self) -> PlaybackResult {
        let result = match self.select(PlaybackAction::Pause).await {
            Ok(backend) => backend.pause().await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn get_status(&self) -> PlaybackResult {
        let result = match self.select(PlaybackAction::Status).await {
            Ok(backend) => backend.get_status().await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn play_track(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let result = match self.select(PlaybackAction::PlayTrack).await {
            Ok(backend) => backend.play_track(identifier, artist_hint).await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn play_album(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let result = match self.select(PlaybackAction::PlayAlbum).await {
            Ok(backend) => backend.play_album(identifier, artist_hint).await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn play_artist(&self, identifier: &str) -> PlaybackResult {
        let result = match self.select(PlaybackAction::PlayArtist).await {
            Ok(backend) => backend.play_artist(identifier).await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn next_track(&self) -> PlaybackResult {
        let result = match self.select(PlaybackAction::NextTrack).await {
            Ok(backend) => backend.next_track().await,
            Err(result) => result,
        };
        result.log();
        result
    }

    pub async fn previous_track(&self) -> PlaybackResult {
        let result = match self.select(PlaybackAction::PreviousTrack).await {
            Ok(backend) => backend.previous_track().await,
            Err(result) => result,
        };
        result.log();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        kind: BackendKind,
        available: bool,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(kind: BackendKind, available: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                available,
                calls: AtomicUsize::new(0),
            })
        }

        fn record(&self) -> PlaybackResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PlaybackResult::ok(PlaybackAction::Play, self.kind, "ok")
        }
    }

    #[async_trait]
    impl PlaybackBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn play(&self) -> PlaybackResult {
            self.record()
        }

        async fn pause(&self) -> PlaybackResult {
            self.record()
        }

        async fn get_status(&self) -> PlaybackResult {
            self.record()
        }

        async fn play_track(&self, _identifier: &str, _hint: Option<&str>) -> PlaybackResult {
            self.record()
        }

        async fn play_album(&self, _identifier: &str, _hint: Option<&str>) -> PlaybackResult {
            self.record()
        }

        async fn play_artist(&self, _identifier: &str) -> PlaybackResult {
            self.record()
        }

        async fn next_track(&self) -> PlaybackResult {
            self.record()
        }

        async fn previous_track(&self) -> PlaybackResult {
            self.record()
        }
    }

    fn service_with(
        remote: Option<Arc<FakeBackend>>,
        local: Option<Arc<FakeBackend>>,
        config: PlaybackConfig,
    ) -> PlaybackService {
        PlaybackService {
            remote: remote.map(|b| b as Arc<dyn PlaybackBackend>),
            local: local.map(|b| b as Arc<dyn PlaybackBackend>),
            config,
            forced: None,
        }
    }

    #[tokio::test]
    async fn test_no_backends_gives_no_backend_available() {
        let service = service_with(None, None, PlaybackConfig::default());
        let result = service.play().await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NoBackendAvailable));
        assert!(!result.retry_possible);
        // No backend ran; the result is attributed to the preferred side
        assert_eq!(result.backend, BackendKind::Remote);
    }

    #[tokio::test]
    async fn test_prefers_remote_when_available() {
        let remote = FakeBackend::new(BackendKind::Remote, true);
        let local = FakeBackend::new(BackendKind::Local, true);
        let service = service_with(
            Some(remote.clone()),
            Some(local.clone()),
            PlaybackConfig::default(),
        );

        let result = service.play().await;
        assert_eq!(result.backend, BackendKind::Remote);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_local_when_remote_unavailable() {
        let remote = FakeBackend::new(BackendKind::Remote, false);
        let local = FakeBackend::new(BackendKind::Local, true);
        let service = service_with(
            Some(remote),
            Some(local.clone()),
            PlaybackConfig::default(),
        );

        let result = service.pause().await;
        assert_eq!(result.backend, BackendKind::Local);
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled_gives_no_backend_available() {
        let remote = FakeBackend::new(BackendKind::Remote, false);
        let local = FakeBackend::new(BackendKind::Local, true);
        let config = PlaybackConfig::default().without_local_fallback();
        let service = service_with(Some(remote), Some(local.clone()), config);

        let result = service.play().await;
        assert_eq!(result.error_kind, Some(ErrorKind::NoBackendAvailable));
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prefer_local_policy() {
        let remote = FakeBackend::new(BackendKind::Remote, true);
        let local = FakeBackend::new(BackendKind::Local, true);
        let config = PlaybackConfig {
            prefer_remote: false,
            ..PlaybackConfig::default()
        };
        let service = service_with(Some(remote), Some(local.clone()), config);

        let result = service.next_track().await;
        assert_eq!(result.backend, BackendKind::Local);
    }

    #[tokio::test]
    async fn test_forced_backend_skips_availability_probe() {
        let remote = FakeBackend::new(BackendKind::Remote, true);
        let local = FakeBackend::new(BackendKind::Local, false);
        let mut service = service_with(
            Some(remote),
            Some(local.clone()),
            PlaybackConfig::default(),
        );

        service.force_backend(Some(BackendKind::Local));
        let result = service.play().await;
        assert_eq!(result.backend, BackendKind::Local);
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);

        service.force_backend(None);
        let result = service.play().await;
        assert_eq!(result.backend, BackendKind::Remote);
    }

    #[tokio::test]
    async fn test_forced_unconfigured_backend_fails_cleanly() {
        let mut service = service_with(None, None, PlaybackConfig::default());
        service.force_backend(Some(BackendKind::Remote));
        let result = service.play().await;
        assert_eq!(result.error_kind, Some(ErrorKind::NoBackendAvailable));
    }

    #[tokio::test]
    async fn test_available_backends_lists_only_available() {
        let remote = FakeBackend::new(BackendKind::Remote, false);
        let local = FakeBackend::new(BackendKind::Local, true);
        let service = service_with(Some(remote), Some(local), PlaybackConfig::default());

        assert_eq!(service.available_backends().await, vec![BackendKind::Local]);
    }
}
