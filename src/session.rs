//! Backend session identifier.
//!
//! The backend binds an uploaded file to a session. Before the first upload of
//! a cycle the client sends the sentinel `"new"`, and the backend answers with
//! a fresh id (or echoes an existing one). The id is meaningful only between a
//! successful upload and the download that ends the cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire value meaning "no active upload".
pub const NEW_SESSION: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionId {
    /// No upload has been bound yet.
    #[default]
    New,
    /// Server-issued id.
    Active(String),
}

impl SessionId {
    pub fn is_new(&self) -> bool {
        matches!(self, SessionId::New)
    }

    /// The query-string value sent to the backend.
    pub fn as_str(&self) -> &str {
        match self {
            SessionId::New => NEW_SESSION,
            SessionId::Active(id) => id,
        }
    }

    /// Back to the sentinel. Returns the id that was active, if any.
    pub fn reset(&mut self) -> Option<String> {
        match std::mem::take(self) {
            SessionId::New => None,
            SessionId::Active(id) => Some(id),
        }
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        let s = s.trim();
        if s.is_empty() || s == NEW_SESSION {
            SessionId::New
        } else {
            SessionId::Active(s.to_string())
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
