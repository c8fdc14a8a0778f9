//! Trait abstractions for music service operations.
//!
//! These traits enable dependency injection for testability and modularity.
//! Services depend on traits rather than concrete implementations.

use async_trait::async_trait;

use super::types::{AudioFeatures, CurrentPlayback, TopTrack};
use super::web_api::PlaybackResult;

/// Trait for reading and controlling an account's playback.
///
/// Used by `PlaybackSynchronizer` to read the caller's track and push it to
/// every group member.
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Fetches the track and position currently playing on an account.
    ///
    /// # Arguments
    /// * `account_token` - The linked external-account token
    ///
    /// # Errors
    /// [`PlaybackError::NoActiveSession`](super::PlaybackError::NoActiveSession)
    /// if nothing is playing.
    async fn current_playback(&self, account_token: &str) -> PlaybackResult<CurrentPlayback>;

    /// Starts playback of `track_uri` at `position_ms` on an account.
    ///
    /// # Arguments
    /// * `account_token` - The linked external-account token of the target member
    /// * `track_uri` - Track to play
    /// * `position_ms` - Offset into the track, in milliseconds
    async fn start_playback(
        &self,
        account_token: &str,
        track_uri: &str,
        position_ms: u64,
    ) -> PlaybackResult<()>;
}

/// Trait for library and playlist operations.
///
/// Used by `ProfileService` for listening personality and playlist creation.
#[async_trait]
pub trait MusicLibrary: Send + Sync {
    /// Returns the account's most-played tracks, at most `limit`.
    async fn top_tracks(&self, account_token: &str, limit: u32) -> PlaybackResult<Vec<TopTrack>>;

    /// Returns audio features for the given track ids.
    ///
    /// Tracks without analysis are omitted from the result.
    async fn audio_features(
        &self,
        account_token: &str,
        track_ids: &[String],
    ) -> PlaybackResult<Vec<AudioFeatures>>;

    /// Returns the service-side user id of the account.
    async fn current_user_id(&self, account_token: &str) -> PlaybackResult<String>;

    /// Creates a playlist owned by `user_id` and returns its id.
    async fn create_playlist(
        &self,
        account_token: &str,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> PlaybackResult<String>;

    /// Appends tracks to a playlist.
    async fn add_tracks(
        &self,
        account_token: &str,
        playlist_id: &str,
        track_uris: &[String],
    ) -> PlaybackResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for all music service operations.
///
/// Used by the composition root to share one client between services.
#[async_trait]
pub trait SpotifyApi: PlaybackProvider + MusicLibrary {}

/// Blanket implementation for any type implementing both traits.
impl<T: PlaybackProvider + MusicLibrary> SpotifyApi for T {}
