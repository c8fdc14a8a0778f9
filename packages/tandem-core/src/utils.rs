//! General utilities shared across the application.

use std::time::{SystemTime, UNIX_EPOCH};

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns the current Unix timestamp in seconds.
#[must_use]
pub fn now_secs() -> u64 {
    now_millis() / 1000
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Trims a required text field, rejecting it if nothing is left.
///
/// Returns the trimmed value, or `None` for an empty or whitespace-only input.
pub fn required_field(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
