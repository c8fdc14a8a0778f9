//! Core configuration types.
//!
//! [`Config`] is the single configuration object handed to
//! [`bootstrap_services`](crate::bootstrap::bootstrap_services). Front ends
//! build it from their own sources (the CLI reads YAML plus environment).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    HTTP_TIMEOUT_SECS, PLAYBACK_CALL_TIMEOUT_MS, SPOTIFY_API_BASE, TOKEN_TTL_SECS,
};

/// How the synchronizer treats a member with no linked external account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAccountPolicy {
    /// Include the member in the results with `success: false`.
    #[default]
    ReportFailed,
    /// Leave the member out of the results.
    Skip,
}

/// Configuration for playback fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether the caller also receives the play command.
    pub include_caller: bool,

    /// Treatment of members without a linked account.
    pub missing_account: MissingAccountPolicy,

    /// Deadline for each playback call (milliseconds).
    pub call_timeout_ms: u64,
}

impl SyncConfig {
    /// Returns the per-call deadline as a `Duration`.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include_caller: true,
            missing_account: MissingAccountPolicy::ReportFailed,
            call_timeout_ms: PLAYBACK_CALL_TIMEOUT_MS,
        }
    }
}

/// Configuration for the Web API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Base URL of the Web API.
    pub api_base: String,

    /// HTTP request timeout (seconds).
    pub http_timeout_secs: u64,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base: SPOTIFY_API_BASE.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

/// Configuration for bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of issued tokens (seconds).
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: TOKEN_TTL_SECS,
        }
    }
}

/// Configuration for the Tandem core.
///
/// All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback fan-out.
    pub sync: SyncConfig,

    /// Web API client.
    pub spotify: SpotifyConfig,

    /// Bearer tokens.
    pub auth: AuthConfig,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.sync.call_timeout_ms == 0 {
            return Err("sync.call_timeout_ms must be >= 1".to_string());
        }
        if self.spotify.http_timeout_secs == 0 {
            return Err("spotify.http_timeout_secs must be >= 1".to_string());
        }
        if self.spotify.api_base.trim().is_empty() {
            return Err("spotify.api_base must not be empty".to_string());
        }
        if self.auth.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be >= 1".to_string());
        }
        Ok(())
    }
}
