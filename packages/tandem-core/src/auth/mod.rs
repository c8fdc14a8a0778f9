//! Credential verification and password hashing.
//!
//! - `token` - [`TokenAuthority`], HMAC-signed bearer tokens with expiry
//! - `password` - salted password hashing for stored credentials
//!
//! Services depend on the [`AuthProvider`] trait, not on the token format.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::TandemResult;

pub mod password;
pub mod token;

pub use token::TokenAuthority;

/// Errors produced while decoding or verifying a bearer token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not `<payload>.<signature>` or the payload does not decode.
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match the payload.
    #[error("Token signature mismatch")]
    BadSignature,

    /// Token expiry is in the past.
    #[error("Token expired")]
    Expired,

    /// Signing secret is shorter than the minimum length (bytes given).
    #[error("Signing secret too short ({0} bytes)")]
    WeakSecret(usize),
}

/// Trait for verifying bearer credentials.
///
/// Used by [`TandemApi`](crate::api::TandemApi) to turn a request credential
/// into a verified user identifier before any group operation runs.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies `credential` and returns the user it was issued to.
    ///
    /// # Errors
    /// Returns [`TandemError::Unauthenticated`](crate::TandemError::Unauthenticated)
    /// for a missing, malformed, forged or expired credential.
    async fn verify(&self, credential: &str) -> TandemResult<String>;
}

/// Strips an optional `Bearer ` prefix from an authorization value.
pub fn strip_bearer(authorization: &str) -> &str {
    let trimmed = authorization.trim();
    trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))
        .map(str::trim)
        .unwrap_or(trimmed)
}
