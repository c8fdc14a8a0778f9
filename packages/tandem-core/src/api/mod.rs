//! Request-level API.
//!
//! [`TandemApi`] is the surface front ends call. Every operation except
//! registration and login takes a bearer credential, verifies it through
//! the injected [`AuthProvider`], and delegates to a service. It holds no
//! business logic of its own beyond shaping responses.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{strip_bearer, AuthProvider};
use crate::error::{TandemError, TandemResult};
use crate::services::{
    AccountService, CreatedPlaylist, GroupRegistry, GroupSummary, JoinOutcome, LoginResponse,
    MemberSyncResult, Personality, PlaybackSynchronizer, ProfileService,
};

/// A group member as shown to other members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: String,
    pub is_leader: bool,
    /// Track the member is playing, if it could be read.
    pub current_track: Option<String>,
    /// Device the member is playing on, if reported.
    pub device: Option<String>,
}

/// The caller's group with live playback per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub group: String,
    pub members: Vec<MemberView>,
}

/// Authenticated entry point to every Tandem operation.
pub struct TandemApi {
    auth: Arc<dyn AuthProvider>,
    accounts: Arc<AccountService>,
    registry: Arc<GroupRegistry>,
    sync: Arc<PlaybackSynchronizer>,
    profiles: Arc<ProfileService>,
}

impl TandemApi {
    /// Creates a new TandemApi.
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        accounts: Arc<AccountService>,
        registry: Arc<GroupRegistry>,
        sync: Arc<PlaybackSynchronizer>,
        profiles: Arc<ProfileService>,
    ) -> Self {
        Self {
            auth,
            accounts,
            registry,
            sync,
            profiles,
        }
    }

    /// Verifies a bearer credential and returns the user it belongs to.
    ///
    /// Accepts the raw token or an `Authorization` value (`Bearer <token>`).
    pub async fn authenticate(&self, credential: &str) -> TandemResult<String> {
        let token = strip_bearer(credential);
        if token.is_empty() {
            return Err(TandemError::Unauthenticated(
                "missing credential".to_string(),
            ));
        }
        self.auth.verify(token).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers a user.
    pub async fn register(&self, username: &str, password: &str) -> TandemResult<()> {
        self.accounts.register(username, password).await
    }

    /// Logs a user in and returns a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> TandemResult<LoginResponse> {
        self.accounts.login(username, password).await
    }

    /// Links an external music account to the caller.
    pub async fn link_account(&self, credential: &str, account_token: &str) -> TandemResult<()> {
        let user = self.authenticate(credential).await?;
        self.accounts.link_account(&user, account_token).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────────────

    /// Moves the caller into `group_name`.
    pub async fn join_group(
        &self,
        credential: &str,
        group_name: &str,
    ) -> TandemResult<JoinOutcome> {
        let user = self.authenticate(credential).await?;
        self.registry.join_group(&user, group_name).await
    }

    /// Lists every group.
    pub async fn group_list(&self, credential: &str) -> TandemResult<Vec<GroupSummary>> {
        self.authenticate(credential).await?;
        self.registry.group_list().await
    }

    /// Lists the caller's group with what each member is playing.
    ///
    /// A member whose playback cannot be read is still listed, without a
    /// track or device.
    pub async fn group_members(&self, credential: &str) -> TandemResult<GroupView> {
        let user = self.authenticate(credential).await?;
        let group = self.registry.group_members(&user).await?;

        let ids: Vec<String> = group.members.iter().map(|m| m.user_id.clone()).collect();
        let tracks = self.sync.member_current_tracks(&ids).await?;

        let members = group
            .members
            .into_iter()
            .zip(tracks)
            .map(|(role, track)| {
                let (current_track, device) = match track {
                    Some(t) => (Some(t.track), t.device),
                    None => (None, None),
                };
                MemberView {
                    user_id: role.user_id,
                    is_leader: role.is_leader,
                    current_track,
                    device,
                }
            })
            .collect();

        Ok(GroupView {
            group: group.group,
            members,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────────────

    /// Pushes the caller's current track to their whole group.
    pub async fn sync_current_track(
        &self,
        credential: &str,
    ) -> TandemResult<Vec<MemberSyncResult>> {
        let user = self.authenticate(credential).await?;
        self.sync.sync_current_track(&user).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────────

    /// Returns the caller's listening personality.
    pub async fn personality(&self, credential: &str) -> TandemResult<Personality> {
        let user = self.authenticate(credential).await?;
        self.profiles.personality(&user).await
    }

    /// Copies `source`'s top tracks into a new playlist on the caller's account.
    pub async fn playlist_from_top_tracks(
        &self,
        credential: &str,
        source: &str,
    ) -> TandemResult<CreatedPlaylist> {
        let user = self.authenticate(credential).await?;
        self.profiles.playlist_from_top_tracks(&user, source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::bootstrap::{bootstrap_with_spotify, BootstrappedServices};
    use crate::config::Config;
    use crate::spotify::{
        AudioFeatures, CurrentPlayback, MusicLibrary, PlaybackError, PlaybackProvider,
        PlaybackResult, TopTrack,
    };
    use crate::store::MemoryStore;

    const SECRET: &str = "api-test-secret-0123456789";

    /// Music service where only accounts in `playing` have a session.
    #[derive(Default)]
    struct FakeSpotify {
        playing: Vec<String>,
        started: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PlaybackProvider for FakeSpotify {
        async fn current_playback(&self, token: &str) -> PlaybackResult<CurrentPlayback> {
            if self.playing.iter().any(|t| t == token) {
                Ok(CurrentPlayback {
                    track_uri: format!("spotify:track:{}", token),
                    position_ms: 1_000,
                    device_id: Some("speaker".to_string()),
                })
            } else {
                Err(PlaybackError::NoActiveSession)
            }
        }

        async fn start_playback(&self, token: &str, _uri: &str, _pos: u64) -> PlaybackResult<()> {
            self.started.lock().push(token.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl MusicLibrary for FakeSpotify {
        async fn top_tracks(&self, _token: &str, _limit: u32) -> PlaybackResult<Vec<TopTrack>> {
            Ok(Vec::new())
        }

        async fn audio_features(
            &self,
            _token: &str,
            _ids: &[String],
        ) -> PlaybackResult<Vec<AudioFeatures>> {
            Ok(Vec::new())
        }

        async fn current_user_id(&self, token: &str) -> PlaybackResult<String> {
            Ok(token.to_string())
        }

        async fn create_playlist(
            &self,
            _token: &str,
            _user_id: &str,
            _name: &str,
            _description: &str,
        ) -> PlaybackResult<String> {
            Ok("pl".to_string())
        }

        async fn add_tracks(
            &self,
            _token: &str,
            _playlist_id: &str,
            _uris: &[String],
        ) -> PlaybackResult<()> {
            Ok(())
        }
    }

    fn services(spotify: Arc<FakeSpotify>) -> BootstrappedServices {
        bootstrap_with_spotify(
            &Config::default(),
            Arc::new(MemoryStore::new()),
            Some(SECRET),
            spotify,
        )
        .unwrap()
    }

    /// Registers, logs in and links `user`, returning a bearer header value.
    async fn sign_up(api: &TandemApi, user: &str) -> String {
        api.register(user, "pw").await.unwrap();
        let login = api.login(user, "pw").await.unwrap();
        let bearer = format!("Bearer {}", login.token);
        api.link_account(&bearer, &format!("tok-{}", user))
            .await
            .unwrap();
        bearer
    }

    #[tokio::test]
    async fn operations_require_a_valid_credential() {
        let svc = services(Arc::new(FakeSpotify::default()));

        let missing = svc.api.join_group("", "jazz").await.unwrap_err();
        assert_eq!(missing.code(), "unauthenticated");

        let forged = svc.api.group_list("Bearer abc.def").await.unwrap_err();
        assert_eq!(forged.code(), "unauthenticated");
    }

    #[tokio::test]
    async fn group_members_are_enriched_with_current_tracks() {
        let spotify = Arc::new(FakeSpotify {
            playing: vec!["tok-alice".to_string()],
            ..Default::default()
        });
        let svc = services(spotify);
        let alice = sign_up(&svc.api, "alice").await;
        let bob = sign_up(&svc.api, "bob").await;

        svc.api.join_group(&alice, "jazz").await.unwrap();
        svc.api.join_group(&bob, "jazz").await.unwrap();

        let view = svc.api.group_members(&bob).await.unwrap();
        assert_eq!(view.group, "jazz");
        assert_eq!(
            view.members,
            vec![
                MemberView {
                    user_id: "alice".to_string(),
                    is_leader: true,
                    current_track: Some("spotify:track:tok-alice".to_string()),
                    device: Some("speaker".to_string()),
                },
                MemberView {
                    user_id: "bob".to_string(),
                    is_leader: false,
                    current_track: None,
                    device: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn sync_reaches_every_member() {
        let spotify = Arc::new(FakeSpotify {
            playing: vec!["tok-alice".to_string()],
            ..Default::default()
        });
        let svc = services(spotify.clone());
        let alice = sign_up(&svc.api, "alice").await;
        let bob = sign_up(&svc.api, "bob").await;
        svc.api.join_group(&alice, "jazz").await.unwrap();
        svc.api.join_group(&bob, "jazz").await.unwrap();

        let results = svc.api.sync_current_track(&alice).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(*spotify.started.lock(), vec!["tok-alice", "tok-bob"]);
    }

    #[tokio::test]
    async fn group_members_outside_group_is_not_a_member() {
        let svc = services(Arc::new(FakeSpotify::default()));
        let carol = sign_up(&svc.api, "carol").await;
        let err = svc.api.group_members(&carol).await.unwrap_err();
        assert_eq!(err.code(), "not_a_member");
    }

    #[test]
    fn member_view_serializes_nulls_for_missing_playback() {
        let view = MemberView {
            user_id: "bob".to_string(),
            is_leader: false,
            current_track: None,
            device: None,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["userId"], "bob");
        assert!(json["currentTrack"].is_null());
    }
}
