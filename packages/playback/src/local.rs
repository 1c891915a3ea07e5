//! Local backend driving a desktop player through UI scripting
//!
//! Speaks to the player application by name via `osascript`. No network,
//! no credentials; the player's own library is the only catalog. Scripts
//! follow a fixed stdout contract: a single line starting with `SUCCESS:`
//! or `ERROR:` describing the outcome.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use chorus_shared_config::LocalPlayerConfig;
use chorus_spotify_client::SearchResourceKind;

use crate::backend::PlaybackBackend;
use crate::result::{BackendKind, ErrorKind, PlaybackAction, PlaybackResult};

/// Playback backend scripting a local player application
pub struct LocalBackend {
    config: LocalPlayerConfig,
}

impl LocalBackend {
    pub fn new(config: LocalPlayerConfig) -> Self {
        Self { config }
    }

    /// Escape a value for embedding inside a double-quoted script string
    fn escape(input: &str) -> String {
        input.replace('\\', "\\\\").replace('"', "\\\"")
    }

    /// Reject input that must never reach the scripting layer.
    ///
    /// Returns the failure result to hand back, or `None` when the
    /// identifier is usable.
    fn validate_query(&self, action: PlaybackAction, identifier: &str) -> Option<PlaybackResult> {
        if identifier.trim().is_empty() {
            return Some(PlaybackResult::failed(
                action,
                BackendKind::Local,
                ErrorKind::Validation,
                "empty query",
            ));
        }
        if SearchResourceKind::of_uri(identifier).is_some() {
            return Some(PlaybackResult::failed(
                action,
                BackendKind::Local,
                ErrorKind::NotSupported,
                "resource URIs are not supported by the local backend",
            ));
        }
        None
    }

    /// Classify a failure message from the scripting layer.
    ///
    /// No-results messages are checked first: "no results found" would
    /// otherwise match the not-found pattern below.
    fn classify_failure(message: &str) -> ErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("no results")
            || lower.contains("nothing matched")
            || lower.contains("couldn't find")
        {
            ErrorKind::ResourceNotFound
        } else if lower.contains("not running")
            || lower.contains("isn't running")
            || lower.contains("can't be found")
            || lower.contains("not found")
            || lower.contains("-600")
        {
            ErrorKind::BackendNotRunning
        } else {
            ErrorKind::Scripting
        }
    }

    /// Build a failed result from a scripting-layer message.
    ///
    /// Malformed scripts fail identically on every retry, so syntax and
    /// parse errors override the default scripting retry hint.
    fn failure_from_message(action: PlaybackAction, message: &str) -> PlaybackResult {
        let kind = Self::classify_failure(message);
        let result = PlaybackResult::failed(action, BackendKind::Local, kind, message);
        let lower = message.to_lowercase();
        if kind == ErrorKind::Scripting
            && (lower.contains("syntax error") || lower.contains("parse"))
        {
            return result.with_retry_possible(false);
        }
        result
    }

    /// Interpret the stdout/stderr of a finished scripting call
    fn parse_output(action: PlaybackAction, stdout: &str, stderr: &str) -> PlaybackResult {
        for line in stdout.lines() {
            let line = line.trim();
            if let Some(message) = line.strip_prefix("SUCCESS:") {
                return PlaybackResult::ok(action, BackendKind::Local, message.trim());
            }
            if let Some(message) = line.strip_prefix("ERROR:") {
                return Self::failure_from_message(action, message.trim());
            }
        }

        // No contract line on stdout; the interpreter itself failed
        let message = if stderr.trim().is_empty() {
            "script produced no output".to_string()
        } else {
            stderr.trim().to_string()
        };
        Self::failure_from_message(action, &message)
    }

    /// Run one script with a bounded timeout
    async fn run_script(&self, action: PlaybackAction, script: &str) -> PlaybackResult {
        debug!(action = %action, binary = %self.config.script_binary, "Running player script");

        // kill_on_drop: a timed-out call must not leave the interpreter
        // running against the player
        let child = Command::new(&self.config.script_binary)
            .arg("-e")
            .arg(script)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child,
        )
        .await
        {
            Err(_) => {
                warn!(action = %action, timeout_secs = self.config.timeout_secs, "Player script timed out");
                return PlaybackResult::failed(
                    action,
                    BackendKind::Local,
                    ErrorKind::Timeout,
                    format!("script timed out after {}s", self.config.timeout_secs),
                );
            }
            Ok(Err(e)) => {
                return PlaybackResult::failed(
                    action,
                    BackendKind::Local,
                    ErrorKind::Scripting,
                    format!("failed to run {}: {}", self.config.script_binary, e),
                );
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Self::parse_output(action, &stdout, &stderr)
    }

    /// Wrap a player statement in the standard try/on-error contract
    fn simple_script(&self, statement: &str, success_message: &str) -> String {
        format!(
            r#"try
    tell application "{app}" to {statement}
    return "SUCCESS: {success}"
on error errMsg
    return "ERROR: " & errMsg
end try"#,
            app = Self::escape(&self.config.application),
            statement = statement,
            success = success_message,
        )
    }

    /// Search the player library and start the first match.
    ///
    /// `only_clause` narrows the search to one resource type; `describe`
    /// is a script expression over `theTrack` for the success message.
    fn search_and_play_script(&self, query: &str, only_clause: &str, describe: &str) -> String {
        format!(
            r#"try
    tell application "{app}"
        set matches to (search library playlist 1 for "{query}"{only})
        if matches is {{}} then return "ERROR: no results for {query}"
        set theTrack to item 1 of matches
        play theTrack
        return "SUCCESS: playing " & {describe}
    end tell
on error errMsg
    return "ERROR: " & errMsg
end try"#,
            app = Self::escape(&self.config.application),
            query = Self::escape(query),
            only = only_clause,
            describe = describe,
        )
    }

    /// Parse "<track> by <artist>" out of a now-playing message
    fn split_now_playing(message: &str) -> Option<(String, String)> {
        let rest = message.strip_prefix("playing ")?;
        let (track, artist) = rest.rsplit_once(" by ")?;
        Some((track.to_string(), artist.to_string()))
    }

    fn attach_track_info(result: PlaybackResult) -> PlaybackResult {
        match Self::split_now_playing(&result.message) {
            Some((track, artist)) => result.with_track(track, Some(artist)),
            None => result,
        }
    }
}

#[async_trait]
impl PlaybackBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    /// Available when the player application is running.
    ///
    /// `is running` does not launch the application.
    async fn is_available(&self) -> bool {
        let script = format!(
            r#"if application "{app}" is running then
    return "SUCCESS: running"
else
    return "ERROR: not running"
end if"#,
            app = Self::escape(&self.config.application),
        );
        self.run_script(PlaybackAction::Status, &script).await.success
    }

    async fn play(&self) -> PlaybackResult {
        let script = self.simple_script("play", "playback resumed");
        self.run_script(PlaybackAction::Play, &script).await
    }

    async fn pause(&self) -> PlaybackResult {
        let script = self.simple_script("pause", "playback paused");
        self.run_script(PlaybackAction::Pause, &script).await
    }

    async fn get_status(&self) -> PlaybackResult {
        let script = format!(
            r#"try
    tell application "{app}"
        if player state is playing then
            return "SUCCESS: playing " & (name of current track) & " by " & (artist of current track)
        else if player state is paused then
            return "SUCCESS: paused"
        else
            return "SUCCESS: stopped"
        end if
    end tell
on error errMsg
    return "ERROR: " & errMsg
end try"#,
            app = Self::escape(&self.config.application),
        );
        let result = self.run_script(PlaybackAction::Status, &script).await;
        if result.success {
            Self::attach_track_info(result)
        } else {
            result
        }
    }

    async fn play_track(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let action = PlaybackAction::PlayTrack;
        if let Some(result) = self.validate_query(action, identifier) {
            return result;
        }

        let query = match artist_hint {
            Some(hint) if !hint.trim().is_empty() => format!("{} {}", identifier, hint),
            _ => identifier.to_string(),
        };
        let script = self.search_and_play_script(
            &query,
            " only songs",
            r#"(name of theTrack) & " by " & (artist of theTrack)"#,
        );
        let result = self.run_script(action, &script).await;
        if result.success {
            Self::attach_track_info(result)
        } else {
            result
        }
    }

    async fn play_album(&self, identifier: &str, artist_hint: Option<&str>) -> PlaybackResult {
        let action = PlaybackAction::PlayAlbum;
        if let Some(result) = self.validate_query(action, identifier) {
            return result;
        }

        let query = match artist_hint {
            Some(hint) if !hint.trim().is_empty() => format!("{} {}", identifier, hint),
            _ => identifier.to_string(),
        };
        let script = self.search_and_play_script(
            &query,
            " only albums",
            r#""album " & (album of theTrack)"#,
        );
        self.run_script(action, &script).await
    }

    async fn play_artist(&self, identifier: &str) -> PlaybackResult {
        let action = PlaybackAction::PlayArtist;
        if let Some(result) = self.validate_query(action, identifier) {
            return result;
        }

        let script = self.search_and_play_script(
            identifier,
            " only artists",
            r#""music by " & (artist of theTrack)"#,
        );
        self.run_script(action, &script).await
    }

    async fn next_track(&self) -> PlaybackResult {
        let script = self.simple_script("next track", "skipped to next track");
        self.run_script(PlaybackAction::NextTrack, &script).await
    }

    async fn previous_track(&self) -> PlaybackResult {
        let script = self.simple_script("previous track", "skipped to previous track");
        self.run_script(PlaybackAction::PreviousTrack, &script).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(LocalBackend::escape(r#"Say "hi"\now"#), r#"Say \"hi\"\\now"#);
    }

    #[test]
    fn test_no_results_classified_before_not_found() {
        // "no results found" also contains "not found"; it must classify
        // as a resolution miss, not a missing application
        assert_eq!(
            LocalBackend::classify_failure("no results found for karma police"),
            ErrorKind::ResourceNotFound
        );
    }

    #[test]
    fn test_couldnt_find_is_a_resolution_miss() {
        assert_eq!(
            LocalBackend::classify_failure("couldn't find any song named xyzzy"),
            ErrorKind::ResourceNotFound
        );
    }

    #[test]
    fn test_not_running_classification() {
        assert_eq!(
            LocalBackend::classify_failure("Music got an error: Application isn't running. (-600)"),
            ErrorKind::BackendNotRunning
        );
        assert_eq!(
            LocalBackend::classify_failure("application \"Music\" can't be found"),
            ErrorKind::BackendNotRunning
        );
        assert_eq!(
            LocalBackend::classify_failure("application \"Music\" not found"),
            ErrorKind::BackendNotRunning
        );
    }

    #[test]
    fn test_unknown_failure_is_scripting() {
        assert_eq!(
            LocalBackend::classify_failure("syntax error: Expected end of line"),
            ErrorKind::Scripting
        );
    }

    #[test]
    fn test_parse_output_success_line() {
        let result = LocalBackend::parse_output(
            PlaybackAction::Play,
            "SUCCESS: playback resumed\n",
            "",
        );
        assert!(result.success);
        assert_eq!(result.message, "playback resumed");
    }

    #[test]
    fn test_parse_output_error_line() {
        let result = LocalBackend::parse_output(
            PlaybackAction::PlayTrack,
            "ERROR: no results for xyzzy\n",
            "",
        );
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ResourceNotFound));
    }

    #[test]
    fn test_parse_output_falls_back_to_stderr() {
        let result = LocalBackend::parse_output(
            PlaybackAction::Play,
            "",
            "osascript: execution error: something odd\n",
        );
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Scripting));
        assert!(result.retry_possible);
    }

    #[test]
    fn test_syntax_errors_are_not_retryable() {
        let result = LocalBackend::failure_from_message(
            PlaybackAction::Play,
            "syntax error: Expected end of line (-2741)",
        );
        assert_eq!(result.error_kind, Some(ErrorKind::Scripting));
        assert!(!result.retry_possible);
    }

    #[test]
    fn test_split_now_playing() {
        let parsed = LocalBackend::split_now_playing("playing Karma Police by Radiohead");
        assert_eq!(
            parsed,
            Some(("Karma Police".to_string(), "Radiohead".to_string()))
        );
        assert_eq!(LocalBackend::split_now_playing("paused"), None);
    }
}
