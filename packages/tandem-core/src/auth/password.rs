//! Password hashing with bcrypt.
//!
//! Stored form is the standard modular crypt string (`$2b$<cost>$...`), so
//! the salt and cost travel with each hash.

use std::sync::OnceLock;

/// Work factor for new hashes.
#[cfg(not(test))]
const COST: u32 = 10;
#[cfg(test)]
const COST: u32 = 4;

/// Stand-in hash checked when the username is unknown.
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

#[cfg(test)]
pub(crate) static DECOY_CHECKS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, COST)
}

/// Checks `password` against a stored hash.
///
/// Returns `false` for a malformed stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(matched) => matched,
        Err(e) => {
            log::warn!("[Password] Unusable stored hash: {}", e);
            false
        }
    }
}

/// Runs a full verification against a throwaway hash. Always `false`.
pub fn verify_decoy(password: &str) -> bool {
    #[cfg(test)]
    DECOY_CHECKS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let decoy = DECOY_HASH.get_or_init(|| hash_password("tandem-decoy").ok());
    if let Some(hash) = decoy {
        let _ = bcrypt::verify(password, hash);
    }
    false
}
