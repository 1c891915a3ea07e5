//! Integration tests for the local scripting backend
//!
//! The scripting interpreter is replaced with small shell scripts that
//! emit canned output on the SUCCESS:/ERROR: contract, so the full
//! spawn/timeout/parse path runs without a real player application.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chorus_playback::{BackendKind, ErrorKind, LocalBackend, PlaybackBackend};
use chorus_shared_config::LocalPlayerConfig;

fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-osascript");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn backend_with_script(dir: &Path, body: &str) -> LocalBackend {
    let binary = fake_interpreter(dir, body);
    let config = LocalPlayerConfig::default()
        .with_script_binary(binary.to_string_lossy())
        .with_timeout_secs(2);
    LocalBackend::new(config)
}

#[tokio::test]
async fn resource_uris_are_rejected_without_spawning_anything() {
    // A nonexistent interpreter would fail with a scripting error if the
    // process were spawned; NotSupported proves validation ran first
    let config = LocalPlayerConfig::default().with_script_binary("/nonexistent/osascript");
    let backend = LocalBackend::new(config);

    let result = backend.play_track("spotify:track:abc", None).await;
    assert!(!result.success);
    assert_eq!(result.backend, BackendKind::Local);
    assert_eq!(result.error_kind, Some(ErrorKind::NotSupported));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn empty_queries_are_rejected_without_spawning_anything() {
    let config = LocalPlayerConfig::default().with_script_binary("/nonexistent/osascript");
    let backend = LocalBackend::new(config);

    let result = backend.play_track("   ", None).await;
    assert_eq!(result.error_kind, Some(ErrorKind::Validation));
    assert!(!result.retry_possible);

    let result = backend.play_album("", None).await;
    assert_eq!(result.error_kind, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn successful_play_parses_track_and_artist() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo 'SUCCESS: playing Karma Police by Radiohead'"#,
    );

    let result = backend.play_track("karma police", None).await;
    assert!(result.success);
    assert_eq!(result.backend, BackendKind::Local);
    assert_eq!(result.track.as_deref(), Some("Karma Police"));
    assert_eq!(result.artist.as_deref(), Some("Radiohead"));
}

#[tokio::test]
async fn no_results_maps_to_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(dir.path(), r#"echo 'ERROR: no results for xyzzy'"#);

    let result = backend.play_track("xyzzy", None).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ResourceNotFound));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn couldnt_find_maps_to_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo "ERROR: couldn't find any song named xyzzy""#,
    );

    let result = backend.play_track("xyzzy", None).await;
    assert_eq!(result.error_kind, Some(ErrorKind::ResourceNotFound));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn missing_application_maps_to_backend_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo 'ERROR: application Music not found'"#,
    );

    let result = backend.play().await;
    assert_eq!(result.error_kind, Some(ErrorKind::BackendNotRunning));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn player_not_running_maps_to_backend_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo "ERROR: Music got an error: Application isn't running. (-600)""#,
    );

    let result = backend.play().await;
    assert_eq!(result.error_kind, Some(ErrorKind::BackendNotRunning));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn interpreter_stderr_maps_to_scripting_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo 'execution error: something odd (-1728)' >&2; exit 1"#,
    );

    let result = backend.pause().await;
    assert_eq!(result.error_kind, Some(ErrorKind::Scripting));
    assert!(result.retry_possible);
}

#[tokio::test]
async fn syntax_errors_are_not_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(
        dir.path(),
        r#"echo 'syntax error: Expected end of line (-2741)' >&2; exit 1"#,
    );

    let result = backend.pause().await;
    assert_eq!(result.error_kind, Some(ErrorKind::Scripting));
    assert!(!result.retry_possible);
}

#[tokio::test]
async fn missing_interpreter_maps_to_scripting_error() {
    let config = LocalPlayerConfig::default().with_script_binary("/nonexistent/osascript");
    let backend = LocalBackend::new(config);

    let result = backend.play().await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Scripting));
}

#[tokio::test]
async fn timed_out_script_does_not_keep_running() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    // The script would create the marker after the timeout elapses; it
    // must be killed before it gets the chance
    let binary = fake_interpreter(
        dir.path(),
        &format!("sleep 2\ntouch {}", marker.display()),
    );
    let config = LocalPlayerConfig::default()
        .with_script_binary(binary.to_string_lossy())
        .with_timeout_secs(1);
    let backend = LocalBackend::new(config);

    let result = backend.play().await;
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn hung_script_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let binary = fake_interpreter(dir.path(), "sleep 30");
    let config = LocalPlayerConfig::default()
        .with_script_binary(binary.to_string_lossy())
        .with_timeout_secs(1);
    let backend = LocalBackend::new(config);

    let result = backend.play().await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert!(result.retry_possible);
}

#[tokio::test]
async fn availability_follows_the_running_check() {
    let dir = tempfile::tempdir().unwrap();
    let running = backend_with_script(dir.path(), r#"echo 'SUCCESS: running'"#);
    assert!(running.is_available().await);

    let dir = tempfile::tempdir().unwrap();
    let stopped = backend_with_script(dir.path(), r#"echo 'ERROR: not running'"#);
    assert!(!stopped.is_available().await);
}

#[tokio::test]
async fn skip_operations_report_their_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend_with_script(dir.path(), r#"echo 'SUCCESS: skipped to next track'"#);

    let result = backend.next_track().await;
    assert!(result.success);
    assert_eq!(result.message, "skipped to next track");
}
