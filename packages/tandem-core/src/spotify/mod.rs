//! Spotify Web API integration.
//!
//! # Module Structure
//!
//! - `types` - Domain types for playback state, tracks and audio features
//! - `traits` - Trait abstractions for testability
//! - `web_api` - Low-level authenticated HTTP transport and error type
//! - `client` - `SpotifyClient` concrete trait implementation

pub mod client;
pub mod traits;
pub mod types;
pub mod web_api;

// Re-export trait abstractions
pub use traits::{MusicLibrary, PlaybackProvider, SpotifyApi};

// Re-export concrete implementation
pub use client::SpotifyClient;

pub use types::{AudioFeatures, CurrentPlayback, TopTrack};
pub use web_api::{PlaybackError, PlaybackResult};
