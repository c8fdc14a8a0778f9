//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tandem_core::MissingAccountPolicy;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON document holding users and groups.
    /// Override: `TANDEM_DATA_FILE` (via clap)
    pub data_file: PathBuf,

    /// HMAC secret for bearer tokens. Required: each command runs in a new
    /// process, so tokens from `login` must verify under the same secret.
    /// Override: `TANDEM_TOKEN_SECRET`
    pub token_secret: Option<String>,

    /// Lifetime of issued tokens in seconds.
    /// Override: `TANDEM_TOKEN_TTL_SECS`
    pub token_ttl_secs: u64,

    /// Whether `sync` also restarts the caller's own playback.
    /// Override: `TANDEM_INCLUDE_CALLER`
    pub include_caller: bool,

    /// `report_failed` or `skip` for members without a linked account.
    /// Override: `TANDEM_MISSING_ACCOUNT`
    pub missing_account: MissingAccountPolicy,

    /// Deadline for each playback call in milliseconds.
    /// Override: `TANDEM_CALL_TIMEOUT_MS`
    pub call_timeout_ms: u64,

    /// Base URL of the Spotify Web API.
    /// Override: `TANDEM_SPOTIFY_API_BASE`
    pub spotify_api_base: String,

    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let core = tandem_core::Config::default();
        Self {
            data_file: PathBuf::from("data.json"),
            token_secret: None,
            token_ttl_secs: core.auth.token_ttl_secs,
            include_caller: core.sync.include_caller,
            missing_account: core.sync.missing_account,
            call_timeout_ms: core.sync.call_timeout_ms,
            spotify_api_base: core.spotify.api_base,
            http_timeout_secs: core.spotify.http_timeout_secs,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("TANDEM_TOKEN_SECRET") {
            if !val.is_empty() {
                self.token_secret = Some(val);
            }
        }

        if let Some(val) = lookup("TANDEM_TOKEN_TTL_SECS") {
            if let Ok(ttl) = val.parse() {
                self.token_ttl_secs = ttl;
            }
        }

        if let Some(val) = lookup("TANDEM_INCLUDE_CALLER") {
            if let Ok(include) = val.parse() {
                self.include_caller = include;
            }
        }

        if let Some(val) = lookup("TANDEM_MISSING_ACCOUNT") {
            match val.as_str() {
                "report_failed" => self.missing_account = MissingAccountPolicy::ReportFailed,
                "skip" => self.missing_account = MissingAccountPolicy::Skip,
                other => log::warn!("Ignoring unknown TANDEM_MISSING_ACCOUNT value: {}", other),
            }
        }

        if let Some(val) = lookup("TANDEM_CALL_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.call_timeout_ms = timeout;
            }
        }

        if let Some(val) = lookup("TANDEM_SPOTIFY_API_BASE") {
            if !val.is_empty() {
                self.spotify_api_base = val;
            }
        }

        // Note: TANDEM_DATA_FILE is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Returns the configured token secret, or an error naming where to set it.
    pub fn require_token_secret(&self) -> Result<&str> {
        self.token_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .context(
                "No token secret configured: set TANDEM_TOKEN_SECRET or `token_secret` \
                 in the config file",
            )
    }

    /// Converts to tandem-core's Config type.
    pub fn to_core_config(&self) -> tandem_core::Config {
        let mut config = tandem_core::Config::default();
        config.auth.token_ttl_secs = self.token_ttl_secs;
        config.sync.include_caller = self.include_caller;
        config.sync.missing_account = self.missing_account;
        config.sync.call_timeout_ms = self.call_timeout_ms;
        config.spotify.api_base = self.spotify_api_base.clone();
        config.spotify.http_timeout_secs = self.http_timeout_secs;
        config
    }
}
