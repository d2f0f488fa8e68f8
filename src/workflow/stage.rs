//! Workflow stages and the transitions allowed between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the conversion cycle currently is.
///
/// ```text
/// Idle ─▶ FileSelected ─▶ Uploading ─▶ Uploaded ─▶ CheckingConversion ─▶ Converting ─▶ Downloading ─▶ Done ─▶ Idle
///              ▲                                          │
///              └──────────── invalid pair ────────────────┘
/// ```
///
/// `Error` is reachable from every stage except `Done` and always falls back
/// to `Idle` or `FileSelected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    FileSelected,
    Uploading,
    Uploaded,
    CheckingConversion,
    Converting,
    Downloading,
    Done,
    Error,
}

impl Stage {
    pub fn can_transition_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Done, Idle) => true,
            (Done, _) => false,
            (Error, Idle | FileSelected) => true,
            (Error, _) => false,
            (_, Error) => true,
            (Idle, FileSelected) => true,
            (FileSelected, FileSelected | Idle | Uploading) => true,
            (Uploading, Uploaded) => true,
            (Uploaded, CheckingConversion) => true,
            (CheckingConversion, Converting | FileSelected) => true,
            (Converting, Downloading) => true,
            (Downloading, Done) => true,
            _ => false,
        }
    }

    /// Stages in which a backend request for the current cycle is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Stage::Uploading | Stage::CheckingConversion | Stage::Converting | Stage::Downloading
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::FileSelected => "file selected",
            Stage::Uploading => "uploading",
            Stage::Uploaded => "uploaded",
            Stage::CheckingConversion => "checking conversion",
            Stage::Converting => "converting",
            Stage::Downloading => "downloading",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(s)
    }
}
