//! Listening profile features built on a user's top tracks.
//!
//! - Personality: a coarse summary of the audio features of the top tracks
//! - Playlist: copies another user's top tracks into a new playlist owned by
//!   the caller

use std::sync::Arc;

use serde::Serialize;

use crate::error::{TandemError, TandemResult};
use crate::protocol_constants::TOP_TRACKS_LIMIT;
use crate::spotify::{AudioFeatures, MusicLibrary};
use crate::utils::required_field;

use super::repository::DatasetRepository;

/// Whether a listener leans towards instrumental or vocal music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Instrumental,
    Vocal,
}

/// Whether a listener's music is mostly upbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Positive,
    Negative,
}

/// Listening personality derived from audio features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Personality {
    /// Average danceability on a 0-10 scale.
    pub dance: i64,
    /// Average tempo in BPM.
    pub agitation: i64,
    pub preference: Preference,
    pub attitude: Attitude,
}

/// A playlist created from someone's top tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPlaylist {
    pub playlist_id: String,
    pub track_count: usize,
}

/// Summarizes audio features into a personality.
///
/// Returns `None` when there are no features to average.
pub fn compute_personality(features: &[AudioFeatures]) -> Option<Personality> {
    if features.is_empty() {
        return None;
    }

    let n = features.len() as f64;
    let avg = |f: fn(&AudioFeatures) -> f64| features.iter().map(f).sum::<f64>() / n;

    let danceability = avg(|f| f.danceability);
    let tempo = avg(|f| f.tempo);
    let instrumentalness = avg(|f| f.instrumentalness);
    let speechiness = avg(|f| f.speechiness);
    let valence = avg(|f| f.valence);

    Some(Personality {
        dance: (danceability * 10.0).round() as i64,
        agitation: tempo.round() as i64,
        preference: if instrumentalness > speechiness {
            Preference::Instrumental
        } else {
            Preference::Vocal
        },
        attitude: if valence > 0.5 {
            Attitude::Positive
        } else {
            Attitude::Negative
        },
    })
}

/// Profile features backed by the music library.
pub struct ProfileService {
    repo: Arc<DatasetRepository>,
    library: Arc<dyn MusicLibrary>,
}

impl ProfileService {
    /// Creates a new ProfileService.
    pub fn new(repo: Arc<DatasetRepository>, library: Arc<dyn MusicLibrary>) -> Self {
        Self { repo, library }
    }

    async fn linked_token(&self, user_id: &str) -> TandemResult<String> {
        let dataset = self.repo.snapshot().await?;
        dataset
            .account_token(user_id)
            .map(str::to_string)
            .ok_or_else(|| {
                TandemError::InvalidRequest(format!("{} has no linked account", user_id))
            })
    }

    /// Computes the caller's listening personality from their top tracks.
    ///
    /// # Errors
    /// `InvalidRequest` if the caller has no linked account or no top tracks;
    /// `UpstreamUnavailable` if the music service fails.
    pub async fn personality(&self, user_id: &str) -> TandemResult<Personality> {
        let token = self.linked_token(user_id).await?;

        let tracks = self.library.top_tracks(&token, TOP_TRACKS_LIMIT).await?;
        if tracks.is_empty() {
            return Err(TandemError::InvalidRequest(format!(
                "{} has no top tracks",
                user_id
            )));
        }

        let ids: Vec<String> = tracks.into_iter().map(|t| t.id).collect();
        let features = self.library.audio_features(&token, &ids).await?;

        compute_personality(&features).ok_or_else(|| {
            TandemError::InvalidRequest(format!("no audio features for {}'s top tracks", user_id))
        })
    }

    /// Creates a playlist on the caller's account from `source`'s top tracks.
    ///
    /// # Errors
    /// `InvalidRequest` if the source is unknown, either user lacks a linked
    /// account, or the source has no top tracks.
    pub async fn playlist_from_top_tracks(
        &self,
        caller: &str,
        source: &str,
    ) -> TandemResult<CreatedPlaylist> {
        let source = required_field(source)
            .ok_or_else(|| TandemError::InvalidRequest("source username is required".to_string()))?;
        let source_token = self.linked_token(source).await?;
        let caller_token = self.linked_token(caller).await?;

        let tracks = self
            .library
            .top_tracks(&source_token, TOP_TRACKS_LIMIT)
            .await?;
        if tracks.is_empty() {
            return Err(TandemError::InvalidRequest(format!(
                "{} has no top tracks",
                source
            )));
        }
        let uris: Vec<String> = tracks.into_iter().map(|t| t.uri).collect();

        let owner = self.library.current_user_id(&caller_token).await?;
        let playlist_id = self
            .library
            .create_playlist(
                &caller_token,
                &owner,
                &format!("Top 10 Tracks Playlist from {}", source),
                &format!("Created from {}'s top tracks.", source),
            )
            .await?;
        self.library
            .add_tracks(&caller_token, &playlist_id, &uris)
            .await?;

        log::info!(
            "[ProfileService] {} copied {} track(s) from {} into {}",
            caller,
            uris.len(),
            source,
            playlist_id
        );

        Ok(CreatedPlaylist {
            playlist_id,
            track_count: uris.len(),
        })
    }
}
