//! Wire payloads and response parsing helpers.
//!
//! Kept separate from [`super::http`] so the parsing rules (what counts as a
//! client-reported error, where the download name lives) are unit-testable
//! without a socket.

use crate::error::ApiError;
use crate::session::SessionId;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Response headers that may carry the download's file name, in lookup order.
pub const FILE_NAME_HEADERS: [&str; 2] = ["file_name", "file-name"];

/// Longest error body kept in [`ApiError::Server`].
const MAX_BODY_IN_ERROR: usize = 512;

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConvertResponse {
    pub new_file_name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Classify a non-success response.
///
/// A 4xx with a string `detail` is a client-reported error. Anything else
/// (5xx, validation lists, HTML error pages) is a server error, keeping a
/// string `detail` when the body had one.
pub fn error_from_status(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.detail);
    match detail {
        Some(detail) if (400..500).contains(&status) => ApiError::Rejected { status, detail },
        detail => ApiError::Server {
            status,
            body: truncate(body.trim(), MAX_BODY_IN_ERROR),
            detail,
        },
    }
}

/// Decode a success body, naming the endpoint in the error.
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::Malformed(format!(
            "{endpoint}: {e} (body: {})",
            truncate(&String::from_utf8_lossy(body), 120)
        ))
    })
}

/// The converted file's name from the download response headers.
pub fn file_name_from_headers(headers: &HeaderMap) -> Option<String> {
    FILE_NAME_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &s[..end])
}
