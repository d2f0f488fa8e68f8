//! Error types for the fileconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FileConvError`]: **fatal** for callers of the convenience drivers in
//!   [`crate::convert`]: the input file cannot be read, the configuration is
//!   invalid, the output cannot be written, or the conversion cycle ended
//!   without a downloaded artifact.
//!
//! * [`ApiError`]: **per call**: one backend endpoint failed. The
//!   [`crate::workflow::Workflow`] sequencer never lets these escape; each one
//!   becomes a feedback message plus an abort decision for the current cycle.

use crate::feedback::Feedback;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the fileconv library.
#[derive(Debug, Error)]
pub enum FileConvError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path has no usable file name (e.g. `..` or `/`).
    #[error("'{path}' does not name a file")]
    NotAFile { path: PathBuf },

    // ── Workflow errors ───────────────────────────────────────────────────
    /// The conversion cycle stopped before a file was downloaded.
    ///
    /// `feedback` is the message the workflow showed the user when it stopped.
    #[error("{}", feedback.message)]
    WorkflowFailed { feedback: Feedback },

    /// A single backend call failed outside the sequencer (e.g. `list_formats`).
    #[error(transparent)]
    Api(#[from] ApiError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the downloaded file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call to one backend endpoint.
///
/// [`ApiError::Rejected`] and an [`ApiError::Server`] carrying a `detail`
/// hold text meant for the user; everything else is logged for diagnostics
/// and replaced by a generic message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The backend refused the request with a 4xx status and a `{detail}` body.
    #[error("backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Any other non-success status. `detail` is the body's string `detail`
    /// field when it had one (5xx conversion failures report this way).
    #[error("backend returned HTTP {status}: {body}")]
    Server {
        status: u16,
        body: String,
        detail: Option<String>,
    },

    /// The request never produced a response (connection refused, timeout, …).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but its body or headers were not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// A client-reported (4xx) message to show the user verbatim.
    pub fn user_detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Any structured `detail` the backend sent, whatever the status.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => Some(detail),
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
