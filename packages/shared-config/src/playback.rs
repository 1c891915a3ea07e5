//! Backend selection and device activation policy configuration

use crate::{get_env_or_default, parse_env, ConfigResult};
use std::env;

/// Policy configuration for the playback service
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Prefer the remote backend when it is available
    pub prefer_remote: bool,

    /// Allow falling back to the local backend
    pub allow_local_fallback: bool,

    /// Ordered device names to try first during device activation
    pub preferred_devices: Vec<String>,

    /// Delay between a transfer request and the activation re-check, in milliseconds
    pub activation_delay_ms: u64,

    /// Minimum match score required to accept a search candidate
    pub min_match_score: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            prefer_remote: true,
            allow_local_fallback: true,
            preferred_devices: Vec::new(),
            activation_delay_ms: 1000,
            min_match_score: 0.6,
        }
    }
}

impl PlaybackConfig {
    /// Load playback policy configuration from environment variables
    ///
    /// `PLAYBACK_PREFERRED_DEVICES` is a comma-separated ordered list.
    pub fn from_env() -> ConfigResult<Self> {
        let preferred_devices = env::var("PLAYBACK_PREFERRED_DEVICES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            prefer_remote: get_env_or_default("PLAYBACK_PREFER_REMOTE", "true")
                .eq_ignore_ascii_case("true"),
            allow_local_fallback: get_env_or_default("PLAYBACK_LOCAL_FALLBACK", "true")
                .eq_ignore_ascii_case("true"),
            preferred_devices,
            activation_delay_ms: parse_env("PLAYBACK_ACTIVATION_DELAY_MS", 1000)?,
            min_match_score: parse_env("PLAYBACK_MIN_MATCH_SCORE", 0.6)?,
        })
    }

    /// Set the ordered preferred device list
    pub fn with_preferred_devices(mut self, devices: Vec<String>) -> Self {
        self.preferred_devices = devices;
        self
    }

    /// Disable the local fallback backend
    pub fn without_local_fallback(mut self) -> Self {
        self.allow_local_fallback = false;
        self
    }

    /// Shorten the activation delay (useful for testing)
    pub fn with_activation_delay_ms(mut self, ms: u64) -> Self {
        self.activation_delay_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = PlaybackConfig::default();
        assert!(config.prefer_remote);
        assert!(config.allow_local_fallback);
        assert!(config.preferred_devices.is_empty());
        assert!((config.min_match_score - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builders() {
        let config = PlaybackConfig::default()
            .with_preferred_devices(vec!["Kitchen".to_string(), "Office".to_string()])
            .without_local_fallback();
        assert_eq!(config.preferred_devices, vec!["Kitchen", "Office"]);
        assert!(!config.allow_local_fallback);
    }
}
