//! High-level Spotify client commands.
//!
//! Implements [`PlaybackProvider`] and [`MusicLibrary`] over the Web API.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::json;

use super::traits::{MusicLibrary, PlaybackProvider};
use super::types::{AudioFeatures, CurrentPlayback, TopTrack};
use super::web_api::{build_api_url, send_api_request, PlaybackError, PlaybackResult};

// ─────────────────────────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlayerState {
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    item: Option<PlayerItem>,
    #[serde(default)]
    device: Option<PlayerDevice>,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct PlayerDevice {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

/// Converts a player state response into the domain type.
///
/// A state without a track item means nothing is playing.
fn parse_player_state(state: PlayerState) -> PlaybackResult<CurrentPlayback> {
    let item = state.item.ok_or(PlaybackError::NoActiveSession)?;
    Ok(CurrentPlayback {
        track_uri: item.uri,
        position_ms: state.progress_ms.unwrap_or(0),
        device_id: state.device.and_then(|d| d.id),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Web API client for playback control and library access.
///
/// Holds a shared `reqwest::Client` for connection pooling. The client's
/// request timeout bounds every call.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    api_base: String,
}

impl SpotifyClient {
    /// Creates a new client against `api_base` (e.g. `https://api.spotify.com/v1`).
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    fn url(&self, segments: &[&str]) -> PlaybackResult<String> {
        build_api_url(&self.api_base, segments, &[])
    }

    fn url_with_query(&self, segments: &[&str], query: &[(&str, &str)]) -> PlaybackResult<String> {
        build_api_url(&self.api_base, segments, query)
    }
}

#[async_trait]
impl PlaybackProvider for SpotifyClient {
    async fn current_playback(&self, account_token: &str) -> PlaybackResult<CurrentPlayback> {
        let res = send_api_request(
            &self.client,
            Method::GET,
            &self.url(&["me", "player"])?,
            account_token,
            None,
        )
        .await?;

        if res.is_empty() {
            return Err(PlaybackError::NoActiveSession);
        }
        parse_player_state(res.json()?)
    }

    async fn start_playback(
        &self,
        account_token: &str,
        track_uri: &str,
        position_ms: u64,
    ) -> PlaybackResult<()> {
        let body = json!({
            "uris": [track_uri],
            "position_ms": position_ms,
        });
        send_api_request(
            &self.client,
            Method::PUT,
            &self.url(&["me", "player", "play"])?,
            account_token,
            Some(&body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MusicLibrary for SpotifyClient {
    async fn top_tracks(&self, account_token: &str, limit: u32) -> PlaybackResult<Vec<TopTrack>> {
        let limit = limit.to_string();
        let url = self.url_with_query(&["me", "top", "tracks"], &[("limit", limit.as_str())])?;
        let res = send_api_request(&self.client, Method::GET, &url, account_token, None).await?;
        let page: Paged<TopTrack> = res.json()?;
        Ok(page.items)
    }

    async fn audio_features(
        &self,
        account_token: &str,
        track_ids: &[String],
    ) -> PlaybackResult<Vec<AudioFeatures>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = track_ids.join(",");
        let url = self.url_with_query(&["audio-features"], &[("ids", ids.as_str())])?;
        let res = send_api_request(&self.client, Method::GET, &url, account_token, None).await?;
        let parsed: AudioFeaturesResponse = res.json()?;
        Ok(parsed.audio_features.into_iter().flatten().collect())
    }

    async fn current_user_id(&self, account_token: &str) -> PlaybackResult<String> {
        let url = self.url(&["me"])?;
        let res = send_api_request(&self.client, Method::GET, &url, account_token, None).await?;
        let profile: Profile = res.json()?;
        Ok(profile.id)
    }

    async fn create_playlist(
        &self,
        account_token: &str,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> PlaybackResult<String> {
        let body = json!({
            "name": name,
            "description": description,
        });
        let res = send_api_request(
            &self.client,
            Method::POST,
            &self.url(&["users", user_id, "playlists"])?,
            account_token,
            Some(&body),
        )
        .await?;
        let created: CreatedPlaylist = res.json()?;
        log::info!("[SpotifyClient] Created playlist {}", created.id);
        Ok(created.id)
    }

    async fn add_tracks(
        &self,
        account_token: &str,
        playlist_id: &str,
        track_uris: &[String],
    ) -> PlaybackResult<()> {
        let body = json!({ "uris": track_uris });
        send_api_request(
            &self.client,
            Method::POST,
            &self.url(&["playlists", playlist_id, "tracks"])?,
            account_token,
            Some(&body),
        )
        .await?;
        Ok(())
    }
}
