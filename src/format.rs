//! Format tokens and source-format inference.
//!
//! A format token is an uppercase string such as `"PNG"` or `"JPEG"`. Tokens
//! are normalised on construction so every comparison in the crate is
//! case-insensitive without callers having to remember to upper-case.
//!
//! The source format of a local file is inferred from its **extension** by
//! default. MIME types are unreliable for many document and media formats
//! (`application/octet-stream` is common), so [`FormatInference::Mime`] is only
//! an opt-in that still falls back to the extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An uppercase file-format identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FormatToken(String);

impl FormatToken {
    /// Normalise `raw` into a token. Returns `None` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim().trim_start_matches('.');
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Deserialisation of backend payloads goes through here, so lists such as
// `["png", "Jpg"]` come out normalised.
impl From<String> for FormatToken {
    fn from(s: String) -> Self {
        Self(s.trim().to_uppercase())
    }
}

impl From<FormatToken> for String {
    fn from(t: FormatToken) -> Self {
        t.0
    }
}

impl AsRef<str> for FormatToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How the source format of a selected file is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatInference {
    /// Use the file-name extension (default).
    #[default]
    Extension,
    /// Use the MIME subtype (`image/png` → `PNG`), falling back to the extension.
    Mime,
}

impl FormatInference {
    /// Infer the raw (uncorrected) format of a file.
    pub fn infer(self, file_name: &str, mime: Option<&str>) -> Option<FormatToken> {
        match self {
            FormatInference::Extension => from_extension(file_name),
            FormatInference::Mime => mime
                .and_then(from_mime)
                .or_else(|| from_extension(file_name)),
        }
    }
}

/// Format from the last extension of `file_name` (`archive.tar.gz` → `GZ`).
pub fn from_extension(file_name: &str) -> Option<FormatToken> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(FormatToken::new)
}

/// Format from a MIME type's subtype, ignoring parameters and `+suffix`.
///
/// `image/svg+xml` → `SVG`, `audio/mpeg; codecs=mp3` → `MPEG`.
pub fn from_mime(mime: &str) -> Option<FormatToken> {
    let essence = mime.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.split('+').next()?;
    if subtype.eq_ignore_ascii_case("octet-stream") {
        return None;
    }
    FormatToken::new(subtype)
}
