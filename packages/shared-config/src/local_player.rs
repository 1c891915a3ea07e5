//! Local player (UI scripting) configuration types

use crate::{get_env_or_default, parse_env, ConfigResult};

/// Configuration for the local scripting-driven player
#[derive(Debug, Clone)]
pub struct LocalPlayerConfig {
    /// Name of the application the scripts address (e.g. "Music")
    pub application: String,

    /// Scripting interpreter binary (overridable for tests)
    pub script_binary: String,

    /// Timeout for a single scripting call in seconds
    pub timeout_secs: u64,
}

impl Default for LocalPlayerConfig {
    fn default() -> Self {
        Self {
            application: "Music".to_string(),
            script_binary: "osascript".to_string(),
            timeout_secs: 10,
        }
    }
}

impl LocalPlayerConfig {
    /// Load local player configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            application: get_env_or_default("LOCAL_PLAYER_APP", "Music"),
            script_binary: get_env_or_default("LOCAL_PLAYER_SCRIPT_BINARY", "osascript"),
            timeout_secs: parse_env("LOCAL_PLAYER_TIMEOUT", 10)?,
        })
    }

    /// Create a configuration addressing a specific application (useful for testing)
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            ..Self::default()
        }
    }

    /// Override the scripting binary (useful for testing)
    pub fn with_script_binary(mut self, binary: impl Into<String>) -> Self {
        self.script_binary = binary.into();
        self
    }

    /// Override the per-call timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LocalPlayerConfig::default();
        assert_eq!(config.application, "Music");
        assert_eq!(config.script_binary, "osascript");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_new_config() {
        let config = LocalPlayerConfig::new("Spotify").with_timeout_secs(5);
        assert_eq!(config.application, "Spotify");
        assert_eq!(config.timeout_secs, 5);
    }
}
