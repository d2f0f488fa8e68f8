//! The conversion backend as seen by the client.
//!
//! [`ConversionBackend`] is the seam between the workflow sequencer and the
//! network. [`HttpBackend`] is the production implementation; tests drive the
//! sequencer through in-memory fakes so call ordering can be asserted without
//! a server.
//!
//! ## Endpoints
//!
//! ```text
//! GET   /supported-formats/                         → ["PNG", …]
//! GET   /correct-format/?format=X                   → "JPEG"
//! GET   /supported-conversions/?format=X            → ["PNG", …]
//! GET   /is-valid-conversion/?from_format=A&to_format=B → true
//! POST  /upload/?session_id=S        (multipart)    → {session_id}
//! PATCH /convert/?session_id=S&to_format=B          → {new_file_name}
//! GET   /download/?session_id=S                     → bytes + `file_name` header
//! ```
//!
//! Error responses may carry `{"detail": "…"}`; see [`crate::error::ApiError`].

pub mod http;
pub mod wire;

pub use http::HttpBackend;

use crate::error::ApiError;
use crate::format::FormatToken;
use crate::session::SessionId;
use std::future::Future;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Session the file is now bound to. Fresh or reused.
    pub session_id: SessionId,
    /// File name as stored by the backend, when reported.
    pub file_name: Option<String>,
}

/// A downloaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Name from the `file_name`/`file-name` response header, if present.
    pub file_name: Option<String>,
    pub contents: Vec<u8>,
}

/// The seven backend operations the client consumes.
///
/// Every method is a single request; none retries.
pub trait ConversionBackend: Send + Sync {
    /// All formats the backend accepts as input.
    fn supported_formats(&self) -> impl Future<Output = Result<Vec<FormatToken>, ApiError>> + Send;

    /// Canonicalise a possibly aliased format (`JPG` → `JPEG`).
    fn correct_format(
        &self,
        raw: &FormatToken,
    ) -> impl Future<Output = Result<FormatToken, ApiError>> + Send;

    /// Formats reachable from `format`, in backend order.
    fn supported_conversions(
        &self,
        format: &FormatToken,
    ) -> impl Future<Output = Result<Vec<FormatToken>, ApiError>> + Send;

    /// Whether `from → to` is a conversion the backend will perform.
    fn is_valid_conversion(
        &self,
        from: &FormatToken,
        to: &FormatToken,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;

    /// Bind `contents` to `session` (or to a new session for [`SessionId::New`]).
    fn upload(
        &self,
        file_name: &str,
        contents: &[u8],
        session: &SessionId,
    ) -> impl Future<Output = Result<UploadReceipt, ApiError>> + Send;

    /// Convert the session's file. Returns the server-assigned file name.
    fn convert(
        &self,
        session: &SessionId,
        to: &FormatToken,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Fetch the session's converted file.
    fn download(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<DownloadedFile, ApiError>> + Send;
}
