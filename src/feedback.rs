//! The single feedback slot and the messages written into it.
//!
//! Every workflow event overwrites the slot; exactly one message is visible at
//! a time. [`Severity`] decides how an adapter renders it through
//! [`DisplayStyle`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Neutral,
    Success,
    Warning,
    Error,
}

/// Presentation hint for one severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayStyle {
    /// CSS-style colour name; `None` means the terminal/page default.
    pub color: Option<&'static str>,
    pub bold: bool,
}

impl Severity {
    pub fn style(self) -> DisplayStyle {
        match self {
            Severity::Neutral => DisplayStyle {
                color: None,
                bold: false,
            },
            Severity::Success => DisplayStyle {
                color: Some("green"),
                bold: true,
            },
            Severity::Warning => DisplayStyle {
                color: Some("orange"),
                bold: true,
            },
            Severity::Error => DisplayStyle {
                color: Some("red"),
                bold: true,
            },
        }
    }
}

/// A (message, severity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub severity: Severity,
}

impl Feedback {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn neutral(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Neutral)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ── Messages ─────────────────────────────────────────────────────────────

pub(crate) mod messages {
    use crate::format::FormatToken;

    pub const NO_FILE: &str = "Please select a file to convert.";
    pub const NO_TARGET: &str = "Please select a format to convert to.";
    pub const LOAD_FORMATS_FAILED: &str =
        "An error occured while loading supported formats. Please try again later.";
    pub const CONVERSIONS_FAILED: &str =
        "An error occured while loading available conversions for this file.";
    pub const UPLOAD_FAILED: &str = "An error occured while uploading file. Please try again.";
    pub const CHECK_FAILED: &str =
        "An error occured while checking the conversion. Please try again.";
    pub const CONVERT_FAILED: &str = "An error occured while converting file. Please try again.";
    pub const DOWNLOAD_FAILED: &str = "An error occured while downloading file. Please try again.";

    pub fn unknown_format(file_name: &str) -> String {
        format!("Could not determine the format of '{file_name}'. Please select another file.")
    }

    pub fn unsupported_format(format: &FormatToken) -> String {
        format!("{format} files are not supported. Please select another file.")
    }

    pub fn file_selected(file_name: &str, format: &FormatToken) -> String {
        format!("Selected '{file_name}' ({format}).")
    }

    pub fn uploading(file_name: &str) -> String {
        format!("Uploading '{file_name}'…")
    }

    pub fn converting(from: &FormatToken, to: &FormatToken) -> String {
        format!("Converting {from} to {to}…")
    }

    pub fn invalid_pair(from: &FormatToken, to: &FormatToken) -> String {
        format!("Cannot convert {from} to {to}. Please select another format.")
    }

    pub fn downloading(file_name: &str) -> String {
        format!("Downloading '{file_name}'…")
    }

    pub fn converted(source: &str, converted: &str) -> String {
        format!("Converted '{source}' to '{converted}' successfully.")
    }
}
