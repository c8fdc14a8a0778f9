//! Fixed constants of the external music service and token format.
//!
//! Tunable values live in [`Config`](crate::config::Config); these are
//! defaults and service-defined limits.

// ─────────────────────────────────────────────────────────────────────────────
// Spotify Web API
// ─────────────────────────────────────────────────────────────────────────────

/// Base URL of the Spotify Web API.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Timeout for a single HTTP request to the Web API (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Number of top tracks used for personality and playlist creation.
pub const TOP_TRACKS_LIMIT: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Playback fan-out
// ─────────────────────────────────────────────────────────────────────────────

/// Deadline for one playback read or command during sync (milliseconds).
///
/// Kept below [`HTTP_TIMEOUT_SECS`] so a stalled member is reported as a
/// timeout by the synchronizer rather than by the HTTP layer.
pub const PLAYBACK_CALL_TIMEOUT_MS: u64 = 8_000;

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Default lifetime of an issued bearer token (one day, seconds).
pub const TOKEN_TTL_SECS: u64 = 86_400;
