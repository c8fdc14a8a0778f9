//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together. Front ends choose the
//! [`Store`] and token secret; everything else is built from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::TandemApi;
use crate::auth::{AuthProvider, TokenAuthority};
use crate::config::{Config, SpotifyConfig};
use crate::error::{TandemError, TandemResult};
use crate::events::{EventEmitter, LoggingEventEmitter};
use crate::services::{
    AccountService, DatasetRepository, GroupRegistry, PlaybackSynchronizer, ProfileService,
};
use crate::spotify::{MusicLibrary, PlaybackProvider, SpotifyApi, SpotifyClient};
use crate::store::Store;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Serialized access to the dataset.
    pub repo: Arc<DatasetRepository>,
    /// Issues and verifies bearer tokens.
    pub tokens: Arc<TokenAuthority>,
    /// Registration, login and account linking.
    pub accounts: Arc<AccountService>,
    /// Group membership state machine.
    pub registry: Arc<GroupRegistry>,
    /// Playback fan-out.
    pub sync: Arc<PlaybackSynchronizer>,
    /// Personality and playlists.
    pub profiles: Arc<ProfileService>,
    /// Request facade over all of the above.
    pub api: Arc<TandemApi>,
}

/// Creates the shared HTTP client for all Web API communication.
///
/// Using a shared client enables connection pooling.
fn create_http_client(config: &SpotifyConfig) -> TandemResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| TandemError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Creates the token authority from a configured secret, or a random one.
fn create_token_authority(config: &Config, secret: Option<&str>) -> TandemResult<TokenAuthority> {
    let ttl = Duration::from_secs(config.auth.token_ttl_secs);
    match secret {
        Some(secret) => Ok(TokenAuthority::new(secret, ttl)?),
        None => {
            log::warn!(
                "[Bootstrap] No token secret configured, using a random one; \
                 issued tokens will not survive a restart"
            );
            Ok(TokenAuthority::with_random_secret(ttl))
        }
    }
}

/// Bootstraps all services against the Spotify Web API.
///
/// # Arguments
/// * `config` - Core configuration
/// * `store` - Dataset persistence
/// * `token_secret` - HMAC secret for bearer tokens; random if `None`
///
/// # Errors
/// `Configuration` if the configuration is invalid, the secret is too short,
/// or the HTTP client cannot be built.
pub fn bootstrap_services(
    config: &Config,
    store: Arc<dyn Store>,
    token_secret: Option<&str>,
) -> TandemResult<BootstrappedServices> {
    let http_client = create_http_client(&config.spotify)?;
    let spotify = Arc::new(SpotifyClient::new(
        http_client,
        config.spotify.api_base.clone(),
    ));
    bootstrap_with_spotify(config, store, token_secret, spotify)
}

/// Bootstraps all services against an injected music service implementation.
///
/// The wiring order follows the dependency order:
///
/// 1. Dataset repository (depends on store)
/// 2. Token authority
/// 3. Services (depend on repository, music service, event emitter; the
///    synchronizer also depends on the group registry)
/// 4. Request facade (depends on everything above)
pub fn bootstrap_with_spotify<S>(
    config: &Config,
    store: Arc<dyn Store>,
    token_secret: Option<&str>,
    spotify: Arc<S>,
) -> TandemResult<BootstrappedServices>
where
    S: SpotifyApi + 'static,
{
    config.validate().map_err(TandemError::Configuration)?;

    let repo = Arc::new(DatasetRepository::new(store));
    let tokens = Arc::new(create_token_authority(config, token_secret)?);
    let emitter: Arc<dyn EventEmitter> = Arc::new(LoggingEventEmitter);

    let accounts = Arc::new(AccountService::new(Arc::clone(&repo), Arc::clone(&tokens)));
    let registry = Arc::new(GroupRegistry::new(Arc::clone(&repo), emitter));
    let sync = Arc::new(PlaybackSynchronizer::new(
        Arc::clone(&repo),
        Arc::clone(&registry),
        Arc::clone(&spotify) as Arc<dyn PlaybackProvider>,
        config.sync.clone(),
    ));
    let profiles = Arc::new(ProfileService::new(
        Arc::clone(&repo),
        spotify as Arc<dyn MusicLibrary>,
    ));

    let api = Arc::new(TandemApi::new(
        Arc::clone(&tokens) as Arc<dyn AuthProvider>,
        Arc::clone(&accounts),
        Arc::clone(&registry),
        Arc::clone(&sync),
        Arc::clone(&profiles),
    ));

    log::debug!(
        "[Bootstrap] Services ready (include_caller={}, missing_account={:?})",
        config.sync.include_caller,
        config.sync.missing_account
    );

    Ok(BootstrappedServices {
        repo,
        tokens,
        accounts,
        registry,
        sync,
        profiles,
        api,
    })
}
