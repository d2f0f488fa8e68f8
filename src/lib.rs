//! # fileconv
//!
//! Client for a remote file-conversion backend: pick a local file, choose a
//! target format, and let the backend convert it.
//!
//! The backend does all of the conversion work. This crate owns the client
//! side: discovering which formats are accepted, canonicalising aliases
//! (`JPG` → `JPEG`), and sequencing the upload → check → convert → download
//! cycle with one clear message for the user at every step.
//!
//! ## Cycle Overview
//!
//! ```text
//! select file
//!  │
//!  ├─ 1. Discover  accepted formats, corrected source format, reachable targets
//!  ├─ 2. Upload    file bytes + session id ("new" on the first upload)
//!  ├─ 3. Check     is (source, target) a valid pair?
//!  ├─ 4. Convert   backend converts, returns the new file name
//!  └─ 5. Download  artifact saved locally, session reset to "new"
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileconv::{convert_file, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .backend_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let report = convert_file("photo.jpg", "png", ".", &config).await?;
//!     println!("saved {}", report.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! Interactive front ends drive a [`Workflow`] directly and apply the
//! [`UiCommand`]s it returns.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod feedback;
pub mod format;
pub mod input;
pub mod progress;
pub mod session;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{ConversionBackend, DownloadedFile, HttpBackend, UploadReceipt};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BACKEND_URL};
pub use convert::{
    convert_file, convert_file_sync, convert_file_with_progress, inspect, list_formats,
    ConversionReport, SourceInspection,
};
pub use error::{ApiError, FileConvError};
pub use feedback::{DisplayStyle, Feedback, Severity};
pub use format::{FormatInference, FormatToken};
pub use input::{read_local, LocalFile};
pub use progress::{NoopProgress, ProgressObserver, WorkflowProgress};
pub use session::{SessionId, NEW_SESSION};
pub use workflow::{SelectedFile, Stage, TargetOption, UiCommand, Workflow};
