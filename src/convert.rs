//! Headless entry points: run a whole cycle without an interactive UI.
//!
//! These drive a [`Workflow`] against an [`HttpBackend`] and act as their own
//! UI adapter: feedback goes to the log, and the `SaveFile` command becomes an
//! atomic write into the output directory. The CLI binary uses the same
//! workflow with its own adapter for terminal output.

use crate::api::{ConversionBackend, HttpBackend};
use crate::config::ClientConfig;
use crate::error::FileConvError;
use crate::feedback::Feedback;
use crate::format::FormatToken;
use crate::input::{self, LocalFile};
use crate::progress::ProgressObserver;
use crate::workflow::{TargetOption, UiCommand, Workflow};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What a completed cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source_name: String,
    /// Corrected source format.
    pub source_format: FormatToken,
    pub target_format: FormatToken,
    /// Name assigned by the backend.
    pub file_name: String,
    pub output_path: PathBuf,
    pub bytes: usize,
    pub duration_ms: u64,
    /// Final feedback shown to the user.
    pub feedback: Feedback,
}

/// The source side of a conversion, without uploading anything.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInspection {
    pub file_name: String,
    /// Format inferred from the file.
    pub raw_format: FormatToken,
    /// Backend-canonical format.
    pub format: FormatToken,
    /// Whether the backend accepts `format` as input.
    pub accepted: bool,
    /// Formats `format` can be converted to.
    pub conversions: Vec<FormatToken>,
}

/// Convert the file at `input` to `to` and save the result into `output_dir`.
///
/// # Errors
/// - the input cannot be read ([`FileConvError::FileNotFound`], …)
/// - the cycle stopped before a download ([`FileConvError::WorkflowFailed`],
///   carrying the message the user would have seen)
/// - the artifact cannot be written ([`FileConvError::OutputWriteFailed`])
pub async fn convert_file(
    input: impl AsRef<Path>,
    to: &str,
    output_dir: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<ConversionReport, FileConvError> {
    let file = input::read_local(input).await?;
    let backend = HttpBackend::new(config)?;
    let workflow = Workflow::new(config.format_inference);
    run_cycle(&backend, workflow, file, to, output_dir.as_ref()).await
}

/// Like [`convert_file`], reporting stage changes to `progress`.
pub async fn convert_file_with_progress(
    input: impl AsRef<Path>,
    to: &str,
    output_dir: impl AsRef<Path>,
    config: &ClientConfig,
    progress: ProgressObserver,
) -> Result<ConversionReport, FileConvError> {
    let file = input::read_local(input).await?;
    let backend = HttpBackend::new(config)?;
    let workflow = Workflow::new(config.format_inference).with_progress(progress);
    run_cycle(&backend, workflow, file, to, output_dir.as_ref()).await
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_file_sync(
    input: impl AsRef<Path>,
    to: &str,
    output_dir: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<ConversionReport, FileConvError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FileConvError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(input, to, output_dir, config))
}

/// The backend's accepted input formats.
pub async fn list_formats(config: &ClientConfig) -> Result<Vec<FormatToken>, FileConvError> {
    let backend = HttpBackend::new(config)?;
    Ok(backend.supported_formats().await?)
}

/// Resolve the source format of `input` and list what it converts to.
///
/// Does not upload the file.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<SourceInspection, FileConvError> {
    let file = input::read_local(input).await?;
    let backend = HttpBackend::new(config)?;
    let mut workflow = Workflow::new(config.format_inference);
    workflow.load(&backend).await;
    if workflow.feedback().is_error() {
        return Err(failed(&workflow));
    }
    workflow.select_file(&backend, file).await;

    let Some(selected) = workflow.selected() else {
        return Err(failed(&workflow));
    };
    let conversions = workflow
        .options()
        .into_iter()
        .filter_map(|o| match o {
            TargetOption::Format(f) => Some(f),
            TargetOption::Placeholder => None,
        })
        .collect();

    Ok(SourceInspection {
        file_name: selected.file.name.clone(),
        raw_format: selected.raw_format.clone(),
        format: selected.format.clone(),
        accepted: workflow.valid_formats().contains(&selected.format),
        conversions,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Drive one full cycle and apply its commands headlessly.
pub(crate) async fn run_cycle<B: ConversionBackend>(
    backend: &B,
    mut workflow: Workflow,
    file: LocalFile,
    to: &str,
    output_dir: &Path,
) -> Result<ConversionReport, FileConvError> {
    let start = Instant::now();
    let source_name = file.name.clone();
    info!("Starting conversion: {} → {}", source_name, to);

    workflow.load(backend).await;
    if workflow.feedback().is_error() {
        return Err(failed(&workflow));
    }
    workflow.select_file(backend, file).await;
    let Some(source_format) = workflow.selected().map(|s| s.format.clone()) else {
        return Err(failed(&workflow));
    };
    // Unsupported sources are reported by select_file; choosing a target
    // would overwrite that message.
    if workflow.feedback().is_error() || !workflow.valid_formats().contains(&source_format) {
        return Err(failed(&workflow));
    }

    let target = FormatToken::new(to)
        .ok_or_else(|| FileConvError::InvalidConfig("Target format is empty".into()))?;
    let chosen = workflow.choose_target(Some(target.clone()));
    if !chosen.is_empty() {
        return Err(failed(&workflow));
    }

    let commands = workflow.submit(backend).await;
    let mut saved: Option<(String, PathBuf, usize)> = None;
    for command in commands {
        match command {
            UiCommand::SaveFile {
                file_name,
                contents,
            } => {
                let path = save_atomic(output_dir, &file_name, &contents).await?;
                saved = Some((file_name, path, contents.len()));
            }
            UiCommand::ShowFeedback(fb) => debug!("feedback [{:?}] {}", fb.severity, fb.message),
            other => debug!("ui: {:?}", other),
        }
    }

    let Some((file_name, output_path, bytes)) = saved else {
        return Err(failed(&workflow));
    };

    Ok(ConversionReport {
        source_name,
        source_format,
        target_format: target,
        file_name,
        output_path,
        bytes,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        feedback: workflow.feedback().clone(),
    })
}

fn failed(workflow: &Workflow) -> FileConvError {
    FileConvError::WorkflowFailed {
        feedback: workflow.feedback().clone(),
    }
}

/// Write `contents` into `dir` under the last path component of `file_name`.
///
/// Uses a temp file in the same directory plus rename so a reader never sees a
/// partial file.
pub async fn save_atomic(
    dir: &Path,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf, FileConvError> {
    let name = Path::new(file_name)
        .file_name()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FileConvError::NotAFile {
            path: PathBuf::from(file_name),
        })?;
    let path = dir.join(name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FileConvError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let dir_owned = dir.to_path_buf();
    let target = path.clone();
    let len = contents.len();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir_owned)?;
        tmp.write_all(&contents)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| FileConvError::Internal(format!("save task: {e}")))?
    .map_err(|e| FileConvError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    info!("Saved {} ({} bytes)", path.display(), len);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_atomic_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_atomic(dir.path(), "../../etc/photo.png", b"png")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("photo.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }

    #[tokio::test]
    async fn save_atomic_creates_missing_dir_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        save_atomic(&out, "a.wav", b"first").await.unwrap();
        let path = save_atomic(&out, "a.wav", b"second").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
        let entries = std::fs::read_dir(&out).unwrap().count();
        assert_eq!(entries, 1, "no temp files left behind");
    }

    #[tokio::test]
    async fn save_atomic_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_atomic(dir.path(), "..", b"x").await.unwrap_err();
        assert!(matches!(err, FileConvError::NotAFile { .. }), "got: {err}");
    }
}
