//! Reading the user's chosen local file.
//!
//! The backend receives the raw bytes, so the whole file is read up front.
//! Existence and permission problems are reported as fatal
//! [`FileConvError`]s before any request is made.
//!
//! The MIME type is sniffed from the leading bytes, standing in for the type a
//! browser file picker would report. It only matters under
//! [`crate::format::FormatInference::Mime`].

use crate::error::FileConvError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file picked by the user, as handed to
/// [`crate::workflow::Workflow::select_file`].
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name without directories, e.g. `photo.jpg`.
    pub name: String,
    pub contents: Vec<u8>,
    /// MIME type if the picker reported one.
    pub mime: Option<String>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl std::fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("contents", &format_args!("<{} bytes>", self.contents.len()))
            .field("mime", &self.mime)
            .finish()
    }
}

/// Read `path` into a [`LocalFile`].
pub async fn read_local(path: impl AsRef<Path>) -> Result<LocalFile, FileConvError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FileConvError::NotAFile {
            path: path.to_path_buf(),
        })?
        .to_string();

    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| map_read_error(e, path.to_path_buf()))?;

    let mime = infer::get(&contents).map(|kind| kind.mime_type().to_string());
    debug!(
        "Read {} ({} bytes, mime {:?})",
        path.display(),
        contents.len(),
        mime
    );
    let mut file = LocalFile::new(name, contents);
    file.mime = mime;
    Ok(file)
}

fn map_read_error(e: std::io::Error, path: PathBuf) -> FileConvError {
    match e.kind() {
        ErrorKind::NotFound => FileConvError::FileNotFound { path },
        ErrorKind::PermissionDenied => FileConvError::PermissionDenied { path },
        ErrorKind::IsADirectory => FileConvError::NotAFile { path },
        _ => FileConvError::Internal(format!("reading {}: {e}", path.display())),
    }
}
