//! Playback fan-out across a listening group.
//!
//! Responsibilities:
//! - Reading the caller's current track and position
//! - Pushing that track to every member's linked account concurrently
//! - Reporting one outcome per member without failing the batch
//! - Reading every member's current track for group views
//!
//! All calls to the music service run under a per-call deadline. Fan-out is
//! all-settled: a failing or stalled member never cancels the others.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::config::{MissingAccountPolicy, SyncConfig};
use crate::error::{TandemError, TandemResult};
use crate::spotify::{CurrentPlayback, PlaybackError, PlaybackProvider, PlaybackResult};

use super::group_registry::GroupRegistry;
use super::repository::DatasetRepository;

/// Result of pushing playback to a single member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSyncResult {
    pub member_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemberSyncResult {
    fn succeeded(member_id: String) -> Self {
        Self {
            member_id,
            success: true,
            error: None,
        }
    }

    fn failed(member_id: String, error: impl Into<String>) -> Self {
        Self {
            member_id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// What a member is listening to right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTrack {
    pub member: String,
    pub track: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Awaits a music service call, failing with `PlaybackError::Timeout` past `limit`.
async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = PlaybackResult<T>>,
) -> PlaybackResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(PlaybackError::Timeout(limit.as_millis() as u64)),
    }
}

/// Broadcasts the caller's playback to their group.
pub struct PlaybackSynchronizer {
    repo: Arc<DatasetRepository>,
    registry: Arc<GroupRegistry>,
    playback: Arc<dyn PlaybackProvider>,
    config: SyncConfig,
}

impl PlaybackSynchronizer {
    /// Creates a new PlaybackSynchronizer.
    pub fn new(
        repo: Arc<DatasetRepository>,
        registry: Arc<GroupRegistry>,
        playback: Arc<dyn PlaybackProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            repo,
            registry,
            playback,
            config,
        }
    }

    /// Starts the caller's current track, at the caller's position, on every
    /// member of the caller's group.
    ///
    /// Results follow group member order. A member without a linked account
    /// is reported as failed or left out, per `sync.missing_account`.
    ///
    /// # Errors
    /// - `InvalidRequest` if the caller has no linked account
    /// - `UpstreamUnavailable` if the caller's playback cannot be read
    /// - `NotAMember` if the caller belongs to no group
    pub async fn sync_current_track(&self, caller: &str) -> TandemResult<Vec<MemberSyncResult>> {
        let dataset = self.repo.snapshot().await?;

        let caller_token = dataset.account_token(caller).ok_or_else(|| {
            TandemError::InvalidRequest(format!("{} has no linked account", caller))
        })?;

        let current = with_deadline(
            self.config.call_timeout(),
            self.playback.current_playback(caller_token),
        )
        .await
        .map_err(|e| {
            log::warn!(
                "[PlaybackSync] Could not read playback for {}: {}",
                caller,
                e
            );
            TandemError::from(e)
        })?;

        let group = self
            .registry
            .group_of(caller)
            .await?
            .ok_or_else(|| TandemError::NotAMember(caller.to_string()))?;

        let targets: Vec<(&str, Option<&str>)> = group
            .members
            .iter()
            .filter(|m| self.config.include_caller || m.as_str() != caller)
            .filter_map(|m| {
                let token = dataset.account_token(m);
                if token.is_none() && self.config.missing_account == MissingAccountPolicy::Skip {
                    log::debug!("[PlaybackSync] Skipping {} (no linked account)", m);
                    return None;
                }
                Some((m.as_str(), token))
            })
            .collect();

        log::info!(
            "[PlaybackSync] {} syncing {} at {} ms to {} member(s) of {}",
            caller,
            current.track_uri,
            current.position_ms,
            targets.len(),
            group.name
        );

        let futures = targets
            .into_iter()
            .map(|(member, token)| self.push_to_member(member, token, &current));
        let results = join_all(futures).await;

        let failures = results.iter().filter(|r| !r.success).count();
        if failures > 0 {
            log::warn!(
                "[PlaybackSync] {}/{} member(s) of {} failed to sync",
                failures,
                results.len(),
                group.name
            );
        }

        Ok(results)
    }

    /// Reads each member's current track concurrently.
    ///
    /// The output is index-aligned with `members`. A member without a linked
    /// account, with nothing playing, or whose call fails yields `None`.
    pub async fn member_current_tracks(
        &self,
        members: &[String],
    ) -> TandemResult<Vec<Option<MemberTrack>>> {
        let dataset = self.repo.snapshot().await?;
        let limit = self.config.call_timeout();

        let futures = members.iter().map(|member| {
            let token = dataset.account_token(member);
            async move {
                let Some(token) = token else {
                    return None;
                };
                match with_deadline(limit, self.playback.current_playback(token)).await {
                    Ok(current) => Some(MemberTrack {
                        member: member.clone(),
                        track: current.track_uri,
                        device: current.device_id,
                    }),
                    Err(e) if e.is_timeout() => {
                        log::warn!("[PlaybackSync] Playback read for {} timed out", member);
                        None
                    }
                    Err(e) => {
                        log::debug!("[PlaybackSync] No current track for {}: {}", member, e);
                        None
                    }
                }
            }
        });

        Ok(join_all(futures).await)
    }

    async fn push_to_member(
        &self,
        member: &str,
        token: Option<&str>,
        current: &CurrentPlayback,
    ) -> MemberSyncResult {
        let Some(token) = token else {
            return MemberSyncResult::failed(member.to_string(), "no linked account");
        };

        let result = with_deadline(
            self.config.call_timeout(),
            self.playback
                .start_playback(token, &current.track_uri, current.position_ms),
        )
        .await;

        match result {
            Ok(()) => MemberSyncResult::succeeded(member.to_string()),
            Err(e) if e.is_timeout() => {
                log::warn!("[PlaybackSync] {} did not respond in time", member);
                MemberSyncResult::failed(member.to_string(), e.to_string())
            }
            Err(e) => {
                log::warn!("[PlaybackSync] Failed to sync {}: {}", member, e);
                MemberSyncResult::failed(member.to_string(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    use crate::events::NoopEventEmitter;
    use crate::store::{Dataset, Group, MemoryStore, User};

    // ─────────────────────────────────────────────────────────────────────────────
    // Test doubles
    // ─────────────────────────────────────────────────────────────────────────────

    #[derive(Clone, Copy)]
    enum Behavior {
        Healthy,
        Fail,
        Stall,
        Idle,
    }

    /// Playback provider keyed by account token.
    struct MockPlayback {
        behaviors: HashMap<String, Behavior>,
        started: Mutex<Vec<(String, String, u64)>>,
    }

    impl MockPlayback {
        fn new(behaviors: &[(&str, Behavior)]) -> Self {
            Self {
                behaviors: behaviors
                    .iter()
                    .map(|(t, b)| (t.to_string(), *b))
                    .collect(),
                started: Mutex::new(Vec::new()),
            }
        }

        fn behavior(&self, token: &str) -> Behavior {
            self.behaviors.get(token).copied().unwrap_or(Behavior::Healthy)
        }
    }

    #[async_trait]
    impl PlaybackProvider for MockPlayback {
        async fn current_playback(&self, account_token: &str) -> PlaybackResult<CurrentPlayback> {
            match self.behavior(account_token) {
                Behavior::Healthy => Ok(CurrentPlayback {
                    track_uri: format!("spotify:track:{}", account_token),
                    position_ms: 42_000,
                    device_id: Some(format!("device-{}", account_token)),
                }),
                Behavior::Fail => Err(PlaybackError::HttpStatus(502, "bad gateway".into())),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(PlaybackError::NoActiveSession)
                }
                Behavior::Idle => Err(PlaybackError::NoActiveSession),
            }
        }

        async fn start_playback(
            &self,
            account_token: &str,
            track_uri: &str,
            position_ms: u64,
        ) -> PlaybackResult<()> {
            match self.behavior(account_token) {
                Behavior::Fail => Err(PlaybackError::HttpStatus(
                    404,
                    "No active device found".into(),
                )),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
                Behavior::Healthy | Behavior::Idle => {
                    self.started.lock().push((
                        account_token.to_string(),
                        track_uri.to_string(),
                        position_ms,
                    ));
                    Ok(())
                }
            }
        }
    }

    fn user(name: &str, token: Option<&str>) -> User {
        User {
            username: name.to_string(),
            password_hash: String::new(),
            spotify_token: token.map(str::to_string),
        }
    }

    /// alice (leader), bob, carol in "jazz"; dave in no group.
    fn dataset(carol_token: Option<&str>) -> Dataset {
        Dataset {
            users: vec![
                user("alice", Some("tok-alice")),
                user("bob", Some("tok-bob")),
                user("carol", carol_token),
                user("dave", Some("tok-dave")),
            ],
            groups: vec![Group {
                name: "jazz".to_string(),
                leader: "alice".to_string(),
                members: vec!["alice".into(), "bob".into(), "carol".into()],
            }],
        }
    }

    fn synchronizer(
        dataset: Dataset,
        playback: Arc<MockPlayback>,
        config: SyncConfig,
    ) -> PlaybackSynchronizer {
        let store = Arc::new(MemoryStore::with_dataset(dataset));
        let repo = Arc::new(DatasetRepository::new(store));
        let registry = Arc::new(GroupRegistry::new(
            repo.clone(),
            Arc::new(NoopEventEmitter),
        ));
        PlaybackSynchronizer::new(repo, registry, playback, config)
    }

    fn ids(results: &[MemberSyncResult]) -> Vec<&str> {
        results.iter().map(|r| r.member_id.as_str()).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // sync_current_track
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn pushes_callers_track_to_every_member() {
        let playback = Arc::new(MockPlayback::new(&[]));
        let sync = synchronizer(
            dataset(Some("tok-carol")),
            playback.clone(),
            SyncConfig::default(),
        );

        let results = sync.sync_current_track("bob").await.unwrap();

        assert_eq!(ids(&results), vec!["alice", "bob", "carol"]);
        assert!(results.iter().all(|r| r.success));

        let started = playback.started.lock();
        assert_eq!(started.len(), 3);
        assert!(started
            .iter()
            .all(|(_, uri, pos)| uri == "spotify:track:tok-bob" && *pos == 42_000));
    }

    #[tokio::test]
    async fn one_failing_member_does_not_affect_others() {
        let playback = Arc::new(MockPlayback::new(&[("tok-bob", Behavior::Fail)]));
        let sync = synchronizer(dataset(Some("tok-carol")), playback, SyncConfig::default());

        let results = sync.sync_current_track("alice").await.unwrap();

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].member_id, "bob");
        assert!(failed[0]
            .error
            .as_deref()
            .unwrap()
            .contains("No active device"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_member_times_out_alone() {
        let playback = Arc::new(MockPlayback::new(&[("tok-carol", Behavior::Stall)]));
        let config = SyncConfig {
            call_timeout_ms: 50,
            ..SyncConfig::default()
        };
        let sync = synchronizer(dataset(Some("tok-carol")), playback, config);

        let results = sync.sync_current_track("alice").await.unwrap();

        assert_eq!(ids(&results), vec!["alice", "bob", "carol"]);
        assert!(results[0].success && results[1].success);
        assert!(!results[2].success);
        assert!(results[2].error.as_deref().unwrap().contains("Timed out"));
    }

    #[tokio::test]
    async fn member_without_account_is_reported_failed_by_default() {
        let sync = synchronizer(
            dataset(None),
            Arc::new(MockPlayback::new(&[])),
            SyncConfig::default(),
        );

        let results = sync.sync_current_track("alice").await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[2],
            MemberSyncResult {
                member_id: "carol".to_string(),
                success: false,
                error: Some("no linked account".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn member_without_account_is_omitted_when_skipping() {
        let config = SyncConfig {
            missing_account: MissingAccountPolicy::Skip,
            ..SyncConfig::default()
        };
        let sync = synchronizer(dataset(None), Arc::new(MockPlayback::new(&[])), config);

        let results = sync.sync_current_track("alice").await.unwrap();

        assert_eq!(ids(&results), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn caller_can_be_excluded() {
        let playback = Arc::new(MockPlayback::new(&[]));
        let config = SyncConfig {
            include_caller: false,
            ..SyncConfig::default()
        };
        let sync = synchronizer(dataset(Some("tok-carol")), playback.clone(), config);

        let results = sync.sync_current_track("bob").await.unwrap();

        assert_eq!(ids(&results), vec!["alice", "carol"]);
        assert!(!playback
            .started
            .lock()
            .iter()
            .any(|(token, _, _)| token == "tok-bob"));
    }

    #[tokio::test]
    async fn caller_without_account_is_invalid_request() {
        let sync = synchronizer(
            dataset(None),
            Arc::new(MockPlayback::new(&[])),
            SyncConfig::default(),
        );
        let err = sync.sync_current_track("carol").await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[tokio::test]
    async fn caller_with_nothing_playing_is_upstream_unavailable() {
        let playback = Arc::new(MockPlayback::new(&[("tok-alice", Behavior::Idle)]));
        let sync = synchronizer(
            dataset(Some("tok-carol")),
            playback.clone(),
            SyncConfig::default(),
        );

        let err = sync.sync_current_track("alice").await.unwrap_err();

        assert_eq!(err.code(), "upstream_unavailable");
        assert!(playback.started.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_caller_read_is_upstream_unavailable() {
        let playback = Arc::new(MockPlayback::new(&[("tok-alice", Behavior::Stall)]));
        let config = SyncConfig {
            call_timeout_ms: 50,
            ..SyncConfig::default()
        };
        let sync = synchronizer(dataset(Some("tok-carol")), playback.clone(), config);

        let started = tokio::time::Instant::now();
        let err = sync.sync_current_track("alice").await.unwrap_err();

        assert_eq!(err.code(), "upstream_unavailable");
        assert!(err.to_string().contains("Timed out after 50 ms"));
        assert!(started.elapsed() < Duration::from_secs(60));
        assert!(playback.started.lock().is_empty());
    }

    #[tokio::test]
    async fn group_is_resolved_from_current_membership() {
        let store = Arc::new(MemoryStore::with_dataset(dataset(Some("tok-carol"))));
        let repo = Arc::new(DatasetRepository::new(store));
        let registry = Arc::new(GroupRegistry::new(
            repo.clone(),
            Arc::new(NoopEventEmitter),
        ));
        let playback = Arc::new(MockPlayback::new(&[]));
        let sync = PlaybackSynchronizer::new(
            repo,
            registry.clone(),
            playback,
            SyncConfig::default(),
        );

        registry.join_group("dave", "jazz").await.unwrap();
        let results = sync.sync_current_track("dave").await.unwrap();

        assert_eq!(ids(&results), vec!["alice", "bob", "carol", "dave"]);
    }

    #[tokio::test]
    async fn caller_outside_any_group_is_not_a_member() {
        let sync = synchronizer(
            dataset(None),
            Arc::new(MockPlayback::new(&[])),
            SyncConfig::default(),
        );
        let err = sync.sync_current_track("dave").await.unwrap_err();
        assert!(matches!(err, TandemError::NotAMember(_)));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // member_current_tracks
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn current_tracks_are_index_aligned() {
        let playback = Arc::new(MockPlayback::new(&[("tok-bob", Behavior::Fail)]));
        let sync = synchronizer(dataset(None), playback, SyncConfig::default());
        let members = vec![
            "alice".to_string(),
            "bob".to_string(),
            "carol".to_string(),
            "nobody".to_string(),
        ];

        let tracks = sync.member_current_tracks(&members).await.unwrap();

        assert_eq!(tracks.len(), 4);
        assert_eq!(
            tracks[0],
            Some(MemberTrack {
                member: "alice".to_string(),
                track: "spotify:track:tok-alice".to_string(),
                device: Some("device-tok-alice".to_string()),
            })
        );
        assert!(tracks[1].is_none());
        assert!(tracks[2].is_none());
        assert!(tracks[3].is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_member_has_no_current_track() {
        let playback = Arc::new(MockPlayback::new(&[("tok-bob", Behavior::Stall)]));
        let config = SyncConfig {
            call_timeout_ms: 50,
            ..SyncConfig::default()
        };
        let sync = synchronizer(dataset(Some("tok-carol")), playback, config);
        let members = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];

        let started = tokio::time::Instant::now();
        let tracks = sync.member_current_tracks(&members).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(tracks.len(), 3);
        assert!(tracks[0].is_some());
        assert!(tracks[1].is_none());
        assert_eq!(
            tracks[2].as_ref().map(|t| t.track.as_str()),
            Some("spotify:track:tok-carol")
        );
    }

    #[test]
    fn sync_result_omits_empty_error() {
        let json = serde_json::to_value(MemberSyncResult::succeeded("alice".into())).unwrap();
        assert_eq!(json["memberId"], "alice");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }
}
