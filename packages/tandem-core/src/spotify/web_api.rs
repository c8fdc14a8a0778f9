//! Low-level authenticated transport for the Spotify Web API.
//!
//! This module handles request building, bearer authentication and status
//! checking. For typed operations, see `client.rs`.

use reqwest::{Client, Method, Url};
use serde_json::Value;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when talking to the music service.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// HTTP request to the service failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success HTTP status.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// The account has nothing playing.
    #[error("No active playback session")]
    NoActiveSession,

    /// Response body did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Configured API base is not a usable URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Call did not complete within its deadline (milliseconds).
    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

/// Convenient Result alias for music service operations.
pub type PlaybackResult<T> = Result<T, PlaybackError>;

impl PlaybackError {
    /// Returns true if the error came from the deadline rather than the service.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            PlaybackError::Timeout(_) => true,
            PlaybackError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response
// ─────────────────────────────────────────────────────────────────────────────

/// A successful response: status code and raw body.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Parses the body as JSON into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> PlaybackResult<T> {
        serde_json::from_str(&self.body).map_err(|e| PlaybackError::Parse(e.to_string()))
    }

    /// Returns true for `204 No Content` or an empty body.
    pub fn is_empty(&self) -> bool {
        self.status == 204 || self.body.trim().is_empty()
    }
}

/// Builds an endpoint URL under `base`.
///
/// Each path segment and query value is percent-encoded, so ids taken from
/// user data cannot alter the path or add parameters.
pub fn build_api_url(
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> PlaybackResult<String> {
    let mut url =
        Url::parse(base).map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| PlaybackError::InvalidUrl(format!("{}: cannot hold a path", base)))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// Sends an authenticated request to the Web API.
///
/// # Arguments
/// * `client` - The shared HTTP client
/// * `method` - HTTP method
/// * `url` - Full request URL
/// * `account_token` - Bearer token of the account the call acts for
/// * `body` - Optional JSON body
///
/// # Returns
/// The response on any 2xx status, or `PlaybackError::HttpStatus` otherwise.
pub async fn send_api_request(
    client: &Client,
    method: Method,
    url: &str,
    account_token: &str,
    body: Option<&Value>,
) -> PlaybackResult<ApiResponse> {
    log::debug!("[SpotifyApi] {} {}", method, url);

    let start = std::time::Instant::now();
    let mut request = client.request(method.clone(), url).bearer_auth(account_token);
    if let Some(body) = body {
        request = request.json(body);
    }

    let res = request.send().await;
    log::debug!(
        "[SpotifyApi] {} {} completed in {:?}: {:?}",
        method,
        url,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        return Err(PlaybackError::HttpStatus(status.as_u16(), extract_error_message(&text)));
    }

    Ok(ApiResponse {
        status: status.as_u16(),
        body: text,
    })
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_api_url_handles_slashes() {
        assert_eq!(
            build_api_url("https://api.spotify.com/v1/", &["me", "player"], &[]).unwrap(),
            "https://api.spotify.com/v1/me/player"
        );
        assert_eq!(
            build_api_url("http://localhost:9000", &["me"], &[]).unwrap(),
            "http://localhost:9000/me"
        );
    }

    #[test]
    fn build_api_url_encodes_segments_and_query() {
        let url = build_api_url(
            "https://api.spotify.com/v1",
            &["users", "dj/../me?x=1", "playlists"],
            &[("ids", "a,b&limit=50")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.spotify.com/v1/users/dj%2F..%2Fme%3Fx=1/playlists?ids=a%2Cb%26limit%3D50"
        );
    }

    #[test]
    fn build_api_url_rejects_bad_base() {
        let err = build_api_url("not a url", &["me"], &[]).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidUrl(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn extract_error_message_reads_nested_message() {
        let body = r#"{"error":{"status":404,"message":"Player command failed: No active device found"}}"#;
        assert_eq!(
            extract_error_message(body),
            "Player command failed: No active device found"
        );
    }

    #[test]
    fn extract_error_message_falls_back_to_body() {
        assert_eq!(extract_error_message(" bad gateway "), "bad gateway");
    }

    #[test]
    fn empty_response_detection() {
        let no_content = ApiResponse {
            status: 204,
            body: String::new(),
        };
        assert!(no_content.is_empty());

        let ok = ApiResponse {
            status: 200,
            body: "{}".to_string(),
        };
        assert!(!ok.is_empty());
    }

    #[test]
    fn timeout_variant_is_timeout() {
        assert!(PlaybackError::Timeout(50).is_timeout());
        assert!(!PlaybackError::NoActiveSession.is_timeout());
    }
}
