//! Unified playback control plane for Chorus
//!
//! One interface over two structurally different backends:
//!
//! - [`RemoteBackend`] drives the Spotify Web API through
//!   `chorus-spotify-client`, resolving free-text queries to resource URIs
//!   and activating a target device when the provider reports none.
//! - [`LocalBackend`] drives a local, unauthenticated player through UI
//!   scripting (`osascript`), addressing the application by name.
//!
//! [`PlaybackService`] selects a backend per call and returns a
//! [`PlaybackResult`] for every operation; no error escapes the public
//! surface. The only top-level failure shape is the
//! `NoBackendAvailable` result when neither backend is usable.

mod backend;
mod local;
mod remote;
mod resolve;
mod result;
mod service;

pub use backend::PlaybackBackend;
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use result::{BackendKind, ErrorKind, PlaybackAction, PlaybackResult};
pub use service::PlaybackService;
