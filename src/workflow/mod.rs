//! The conversion workflow sequencer.
//!
//! [`Workflow`] owns every piece of client state (session id, cached formats,
//! current selection, the feedback slot) and exposes one entry point per user
//! action. Each entry point runs its backend calls strictly one after another
//! and returns the [`UiCommand`]s an adapter must apply; the workflow never
//! touches a terminal, page, or file system itself.
//!
//! ## Cycle
//!
//! ```text
//! load ──▶ select_file ──▶ choose_target ──▶ submit
//!                                              │
//!   upload ─▶ is-valid-conversion ─▶ convert ─▶ download ─▶ SaveFile
//! ```
//!
//! Failures never escape an entry point: each becomes a feedback message and
//! an abort of the current cycle. Nothing is retried.

mod stage;

pub use stage::Stage;

use crate::api::ConversionBackend;
use crate::error::ApiError;
use crate::feedback::{messages, Feedback};
use crate::format::{FormatInference, FormatToken};
use crate::input::LocalFile;
use crate::progress::{NoopProgress, ProgressObserver};
use crate::session::SessionId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Label adapters show for the "nothing chosen" option.
pub const PLACEHOLDER_LABEL: &str = "Select a format";

/// One entry of the target-format option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TargetOption {
    Placeholder,
    Format(FormatToken),
}

impl TargetOption {
    pub fn label(&self) -> &str {
        match self {
            TargetOption::Placeholder => PLACEHOLDER_LABEL,
            TargetOption::Format(f) => f.as_str(),
        }
    }
}

/// An instruction for the UI adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Replace the feedback slot.
    ShowFeedback(Feedback),
    /// Replace the target-format option list. Always starts with the placeholder.
    PopulateOptions {
        options: Vec<TargetOption>,
        selected: Option<FormatToken>,
    },
    /// Enable or disable the controls that only make sense after an upload.
    SetConversionControls(bool),
    /// Save a downloaded artifact under `file_name`.
    SaveFile {
        file_name: String,
        contents: Vec<u8>,
    },
}

/// The file currently selected, with its format already corrected.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file: LocalFile,
    /// Format as inferred locally, before correction.
    pub raw_format: FormatToken,
    /// Backend-canonical format; used for every later check.
    pub format: FormatToken,
}

/// Client state for one conversion cycle.
pub struct Workflow {
    stage: Stage,
    session: SessionId,
    valid_formats: BTreeSet<FormatToken>,
    formats_loaded: bool,
    selected: Option<SelectedFile>,
    /// Supported conversions for `selected`, in backend order.
    conversions: Vec<FormatToken>,
    target: Option<FormatToken>,
    feedback: Feedback,
    inference: FormatInference,
    progress: ProgressObserver,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(FormatInference::default())
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("stage", &self.stage)
            .field("session", &self.session)
            .field("valid_formats", &self.valid_formats)
            .field("selected", &self.selected.as_ref().map(|s| &s.file.name))
            .field("target", &self.target)
            .field("feedback", &self.feedback)
            .finish()
    }
}

impl Workflow {
    pub fn new(inference: FormatInference) -> Self {
        Self {
            stage: Stage::Idle,
            session: SessionId::New,
            valid_formats: BTreeSet::new(),
            formats_loaded: false,
            selected: None,
            conversions: Vec::new(),
            target: None,
            feedback: Feedback::default(),
            inference,
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_progress(mut self, progress: ProgressObserver) -> Self {
        self.progress = progress;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn valid_formats(&self) -> &BTreeSet<FormatToken> {
        &self.valid_formats
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn target(&self) -> Option<&FormatToken> {
        self.target.as_ref()
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// The option list as currently shown: placeholder first.
    pub fn options(&self) -> Vec<TargetOption> {
        std::iter::once(TargetOption::Placeholder)
            .chain(self.conversions.iter().cloned().map(TargetOption::Format))
            .collect()
    }

    // ── Entry points ─────────────────────────────────────────────────────

    /// Fetch the backend's accepted input formats. Runs once; later calls
    /// re-render the cached options without touching the network.
    pub async fn load<B: ConversionBackend>(&mut self, backend: &B) -> Vec<UiCommand> {
        let mut out = Vec::new();
        if !self.formats_loaded {
            match backend.supported_formats().await {
                Ok(formats) => {
                    info!("Backend accepts {} formats", formats.len());
                    self.valid_formats = formats.into_iter().collect();
                    self.formats_loaded = true;
                }
                Err(e) => {
                    error!("Loading supported formats failed: {}", e);
                    self.valid_formats.clear();
                    self.fail(&mut out, feedback_for(&e, messages::LOAD_FORMATS_FAILED));
                }
            }
        }
        self.push_options(&mut out);
        out
    }

    /// The user picked a file: infer and correct its format, then refresh the
    /// target options from the backend.
    pub async fn select_file<B: ConversionBackend>(
        &mut self,
        backend: &B,
        file: LocalFile,
    ) -> Vec<UiCommand> {
        let mut out = Vec::new();
        self.conversions.clear();
        self.target = None;

        let Some(raw) = self.inference.infer(&file.name, file.mime.as_deref()) else {
            warn!("No format could be inferred for '{}'", file.name);
            let message = messages::unknown_format(&file.name);
            self.selected = None;
            if self.stage != Stage::Idle {
                self.transition(Stage::Idle);
            }
            self.push_options(&mut out);
            self.show(&mut out, Feedback::warning(message));
            return out;
        };

        let format = match backend.correct_format(&raw).await {
            Ok(corrected) => corrected,
            Err(e) => {
                warn!("Format correction for {} failed, keeping it: {}", raw, e);
                raw.clone()
            }
        };
        if format != raw {
            debug!("Corrected format {} → {}", raw, format);
        }

        let name = file.name.clone();
        self.selected = Some(SelectedFile {
            file,
            raw_format: raw,
            format: format.clone(),
        });
        self.transition(Stage::FileSelected);

        match backend.supported_conversions(&format).await {
            Ok(conversions) => {
                self.conversions = conversions;
                if self.conversions.contains(&format) {
                    self.target = Some(format.clone());
                }
                self.push_options(&mut out);
                let feedback = if self.valid_formats.contains(&format) {
                    Feedback::neutral(messages::file_selected(&name, &format))
                } else {
                    Feedback::warning(messages::unsupported_format(&format))
                };
                self.show(&mut out, feedback);
            }
            Err(e) => {
                error!("Loading conversions for {} failed: {}", format, e);
                self.push_options(&mut out);
                self.fail(&mut out, feedback_for(&e, messages::CONVERSIONS_FAILED));
            }
        }
        out
    }

    /// Forget the selected file.
    pub fn clear_file(&mut self) -> Vec<UiCommand> {
        let mut out = Vec::new();
        self.selected = None;
        self.conversions.clear();
        self.target = None;
        if self.stage != Stage::Idle {
            self.transition(Stage::Idle);
        }
        self.push_options(&mut out);
        out
    }

    /// The user picked a target option. `None` is the placeholder.
    ///
    /// A format outside the current option list is treated as the placeholder.
    pub fn choose_target(&mut self, target: Option<FormatToken>) -> Vec<UiCommand> {
        let mut out = Vec::new();
        match target {
            Some(t) if self.conversions.contains(&t) => self.target = Some(t),
            Some(t) => {
                warn!("Target {} is not in the option list", t);
                self.target = None;
                self.show(&mut out, Feedback::warning(messages::NO_TARGET));
            }
            None => self.target = None,
        }
        out
    }

    /// Run upload → validity check → convert → download.
    pub async fn submit<B: ConversionBackend>(&mut self, backend: &B) -> Vec<UiCommand> {
        let mut out = Vec::new();

        // ── Local preconditions: warnings only, nothing sent ─────────────
        let Some(selected) = self.selected.clone() else {
            self.show(&mut out, Feedback::warning(messages::NO_FILE));
            return out;
        };
        let Some(target) = self.target.clone() else {
            self.show(&mut out, Feedback::warning(messages::NO_TARGET));
            return out;
        };
        if !self.valid_formats.contains(&selected.format) {
            self.show(
                &mut out,
                Feedback::warning(messages::unsupported_format(&selected.format)),
            );
            return out;
        }

        // ── Upload ───────────────────────────────────────────────────────
        self.transition(Stage::Uploading);
        self.show(&mut out, Feedback::neutral(messages::uploading(&selected.file.name)));
        let uploaded = backend
            .upload(&selected.file.name, &selected.file.contents, &self.session)
            .await;
        let receipt = match uploaded {
            Ok(r) => r,
            Err(e) => {
                error!("Upload of '{}' failed: {}", selected.file.name, e);
                let feedback = Feedback::error(e.user_detail().unwrap_or(messages::UPLOAD_FAILED));
                self.fail(&mut out, feedback);
                return out;
            }
        };
        info!("Uploaded '{}' to session {}", selected.file.name, receipt.session_id);
        self.session = receipt.session_id;
        self.transition(Stage::Uploaded);
        out.push(UiCommand::SetConversionControls(true));

        // ── Validity check ───────────────────────────────────────────────
        self.transition(Stage::CheckingConversion);
        let checked = backend.is_valid_conversion(&selected.format, &target).await;
        match checked {
            Ok(true) => {}
            Ok(false) => {
                info!("{} → {} rejected as invalid pair", selected.format, target);
                self.end_cycle(&mut out);
                self.transition(Stage::FileSelected);
                self.show(
                    &mut out,
                    Feedback::warning(messages::invalid_pair(&selected.format, &target)),
                );
                return out;
            }
            Err(e) => {
                error!("Validity check {} → {} failed: {}", selected.format, target, e);
                self.end_cycle(&mut out);
                self.fail(&mut out, feedback_for(&e, messages::CHECK_FAILED));
                return out;
            }
        }

        // ── Convert ──────────────────────────────────────────────────────
        self.transition(Stage::Converting);
        self.show(
            &mut out,
            Feedback::neutral(messages::converting(&selected.format, &target)),
        );
        let converted = backend.convert(&self.session, &target).await;
        let new_file_name = match converted {
            Ok(name) => name,
            Err(e) => {
                error!("Conversion in session {} failed: {}", self.session, e);
                self.end_cycle(&mut out);
                self.fail(&mut out, feedback_for(&e, messages::CONVERT_FAILED));
                return out;
            }
        };

        // ── Download ─────────────────────────────────────────────────────
        self.transition(Stage::Downloading);
        self.show(&mut out, Feedback::neutral(messages::downloading(&new_file_name)));
        let downloaded = backend.download(&self.session).await;
        // Terminal step: the session is spent whatever happened.
        self.end_cycle(&mut out);
        let file = match downloaded {
            Ok(file) => file,
            Err(e) => {
                error!("Download of '{}' failed: {}", new_file_name, e);
                self.fail(&mut out, feedback_for(&e, messages::DOWNLOAD_FAILED));
                return out;
            }
        };
        match file.file_name.as_deref() {
            Some(header) if header != new_file_name => warn!(
                "Download header names '{}', keeping converted name '{}'",
                header, new_file_name
            ),
            None => debug!("Download carried no file name header"),
            _ => {}
        }

        out.push(UiCommand::SaveFile {
            file_name: new_file_name.clone(),
            contents: file.contents,
        });
        self.transition(Stage::Done);
        info!("Converted '{}' to '{}'", selected.file.name, new_file_name);
        self.show(
            &mut out,
            Feedback::success(messages::converted(&selected.file.name, &new_file_name)),
        );

        self.selected = None;
        self.conversions.clear();
        self.target = None;
        self.transition(Stage::Idle);
        self.push_options(&mut out);
        out
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn transition(&mut self, next: Stage) {
        let from = self.stage;
        debug_assert!(
            from.can_transition_to(next),
            "illegal stage transition {from} → {next}"
        );
        if !from.can_transition_to(next) {
            warn!("Illegal stage transition {} → {}", from, next);
        }
        debug!("Stage {} → {}", from, next);
        self.stage = next;
        self.progress.on_stage(from, next);
    }

    fn show(&mut self, out: &mut Vec<UiCommand>, feedback: Feedback) {
        self.progress.on_feedback(&feedback);
        self.feedback = feedback.clone();
        out.push(UiCommand::ShowFeedback(feedback));
    }

    fn push_options(&self, out: &mut Vec<UiCommand>) {
        out.push(UiCommand::PopulateOptions {
            options: self.options(),
            selected: self.target.clone(),
        });
    }

    /// Reset the session after the upload has been spent.
    fn end_cycle(&mut self, out: &mut Vec<UiCommand>) {
        if let Some(id) = self.session.reset() {
            debug!("Session {} released", id);
        }
        out.push(UiCommand::SetConversionControls(false));
    }

    /// Enter `Error`, report, and fall back to the nearest stable stage.
    fn fail(&mut self, out: &mut Vec<UiCommand>, feedback: Feedback) {
        self.transition(Stage::Error);
        self.show(out, feedback);
        let fallback = if self.selected.is_some() {
            Stage::FileSelected
        } else {
            Stage::Idle
        };
        self.transition(fallback);
    }
}

/// Verbatim backend detail when the backend supplied one, else `generic`.
///
/// Upload only trusts client-reported (4xx) details; see `submit`.
fn feedback_for(e: &ApiError, generic: &str) -> Feedback {
    Feedback::error(e.detail().unwrap_or(generic))
}
