//! Domain types returned by the music service.

use serde::{Deserialize, Serialize};

/// What an account is playing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPlayback {
    /// URI of the track being played (e.g. `spotify:track:...`).
    pub track_uri: String,
    /// Playback position within the track, in milliseconds.
    pub position_ms: u64,
    /// Device the account is playing on, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// One entry of an account's top tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTrack {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub name: String,
}

/// Audio analysis summary for a single track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub tempo: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    pub valence: f64,
}
