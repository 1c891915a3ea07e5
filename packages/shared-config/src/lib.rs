//! Shared configuration types for the Chorus playback services
//!
//! This crate provides the configuration surface for the playback control
//! plane: remote provider credentials, local player settings, and the
//! backend selection policy. Everything loads from environment variables
//! with `new(..)` constructors available for tests.

mod error;
mod local_player;
mod playback;
mod spotify;

pub use error::{ConfigError, ConfigResult};
pub use local_player::LocalPlayerConfig;
pub use playback::PlaybackConfig;
pub use spotify::SpotifyConfig;

use std::env;

/// Load variables from a `.env` file when one is present.
///
/// Call once at process startup, before any `from_env` constructor.
pub fn load_env() {
    dotenvy::dotenv().ok();
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
