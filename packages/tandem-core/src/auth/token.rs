//! Signed bearer tokens.
//!
//! A token is `base64url(payload) "." base64url(hmac)` where the payload is
//! the JSON claims `{ "sub": <user>, "exp": <unix seconds> }` and the MAC is
//! HMAC-SHA256 over the encoded payload. Clients should treat tokens as opaque.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{AuthProvider, TokenError};
use crate::error::TandemResult;
use crate::utils::now_secs;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Length of a randomly generated secret in bytes.
const RANDOM_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// Issues and verifies signed, expiring bearer tokens.
pub struct TokenAuthority {
    mac: HmacSha256,
    ttl: Duration,
}

impl TokenAuthority {
    /// Creates an authority signing with `secret`; issued tokens live for `ttl`.
    ///
    /// # Errors
    /// Returns [`TokenError::WeakSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret(secret.len()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|_| TokenError::WeakSecret(secret.len()))?;
        Ok(Self { mac, ttl })
    }

    /// Creates an authority with a random secret.
    ///
    /// Tokens do not survive a restart. Useful for tests and single-process use.
    pub fn with_random_secret(ttl: Duration) -> Self {
        let mut secret = [0u8; RANDOM_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        let mac = match HmacSha256::new_from_slice(&secret) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length.
            Err(_) => unreachable!("HMAC key of {} bytes rejected", RANDOM_SECRET_LEN),
        };
        Self { mac, ttl }
    }

    /// Returns the lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id`, expiring `ttl` from now.
    pub fn issue(&self, user_id: &str) -> String {
        self.issue_with_expiry(user_id, now_secs().saturating_add(self.ttl.as_secs()))
    }

    fn issue_with_expiry(&self, user_id: &str, exp: u64) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };
        // Serializing two plain fields cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.sign(encoded.as_bytes());
        format!("{}.{}", encoded, URL_SAFE_NO_PAD.encode(signature))
    }

    /// Decodes and verifies a token, returning the user it was issued to.
    ///
    /// # Errors
    /// - [`TokenError::Malformed`] if the token cannot be decoded
    /// - [`TokenError::BadSignature`] if it was not signed with this secret
    /// - [`TokenError::Expired`] if its expiry has passed
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        self.decode_at(token, now_secs())
    }

    fn decode_at(&self, token: &str, now: u64) -> Result<String, TokenError> {
        let (encoded, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

#[async_trait]
impl AuthProvider for TokenAuthority {
    async fn verify(&self, credential: &str) -> TandemResult<String> {
        let token = super::strip_bearer(credential);
        if token.is_empty() {
            return Err(TokenError::Malformed.into());
        }
        self.decode(token).map_err(|e| {
            log::debug!("[Auth] Rejected credential: {}", e);
            e.into()
        })
    }
}
