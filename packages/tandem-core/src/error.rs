//! Centralized error types for the Tandem core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Gives every error a stable machine-readable code
//! - Converts adapter errors (store, playback, token) into [`TandemError`]

use serde::Serialize;
use thiserror::Error;

use crate::auth::TokenError;
use crate::spotify::PlaybackError;
use crate::store::StoreError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "store_io_failed",
            Self::Serde(_) => "store_decode_failed",
            Self::Invalid(_) => "store_invalid_dataset",
        }
    }
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::NoActiveSession => "no_active_session",
            Self::Parse(_) => "upstream_parse_error",
            Self::InvalidUrl(_) => "upstream_invalid_url",
            Self::Timeout(_) => "upstream_timeout",
        }
    }
}

impl ErrorCode for TokenError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "token_malformed",
            Self::BadSignature => "token_bad_signature",
            Self::Expired => "token_expired",
            Self::WeakSecret(_) => "token_weak_secret",
        }
    }
}

/// Application-wide error type for Tandem operations.
///
/// Per-member playback failures inside a fan-out are not represented here;
/// they are reported in [`MemberSyncResult`](crate::services::MemberSyncResult)
/// and never abort the batch.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum TandemError {
    /// Client sent a request with a missing or empty field.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bearer credential missing, malformed, forged or expired.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Group-scoped operation by a user that belongs to no group.
    #[error("User {0} does not belong to any group")]
    NotAMember(String),

    /// External playback service failed, timed out, or has no active session.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Dataset read or write failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Resource already exists (duplicate username).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration (weak signing secret, zero timeouts).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TandemError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::NotAMember(_) => "not_a_member",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Persistence(_) => "persistence_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::spotify::PlaybackResult;
pub use crate::store::StoreResult;

/// Convenient Result alias for application-wide operations.
pub type TandemResult<T> = Result<T, TandemError>;

impl From<StoreError> for TandemError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(format!("{} ({})", err, err.code()))
    }
}

impl From<PlaybackError> for TandemError {
    fn from(err: PlaybackError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<TokenError> for TandemError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::WeakSecret(_) => Self::Configuration(err.to_string()),
            _ => Self::Unauthenticated(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_member_returns_correct_code() {
        let err = TandemError::NotAMember("alice".into());
        assert_eq!(err.code(), "not_a_member");
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn store_error_converts_to_persistence() {
        let err: TandemError = StoreError::Invalid("leader missing".into()).into();
        assert_eq!(err.code(), "persistence_error");
        assert!(err.to_string().contains("store_invalid_dataset"));
    }

    #[test]
    fn playback_error_converts_to_upstream_unavailable() {
        let err: TandemError = PlaybackError::NoActiveSession.into();
        assert_eq!(err.code(), "upstream_unavailable");
    }

    #[test]
    fn token_error_converts_to_unauthenticated() {
        let err: TandemError = TokenError::Expired.into();
        assert_eq!(err.code(), "unauthenticated");
    }

    #[test]
    fn weak_secret_converts_to_configuration() {
        let err: TandemError = TokenError::WeakSecret(4).into();
        assert_eq!(err.code(), "configuration_error");
    }

    #[test]
    fn error_serializes_with_type_tag() {
        let json = serde_json::to_value(TandemError::Conflict("bob".into())).unwrap();
        assert_eq!(json["type"], "Conflict");
        assert_eq!(json["details"], "bob");
    }
}
