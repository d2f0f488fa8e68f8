//! Progress-observer trait for live workflow events.
//!
//! The [`crate::workflow::Workflow`] returns its UI commands only when an
//! entry point finishes. Adapters that want to show something *while* a
//! request is outstanding (a spinner, a status line) inject an
//! [`Arc<dyn WorkflowProgress>`] via
//! [`crate::workflow::Workflow::with_progress`].
//!
//! # Example
//!
//! ```rust
//! use fileconv::{Stage, Workflow, WorkflowProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingProgress {
//!     transitions: AtomicUsize,
//! }
//!
//! impl WorkflowProgress for CountingProgress {
//!     fn on_stage(&self, _from: Stage, _to: Stage) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let progress = Arc::new(CountingProgress { transitions: AtomicUsize::new(0) });
//! let workflow = Workflow::default().with_progress(progress as Arc<dyn WorkflowProgress>);
//! assert_eq!(workflow.stage(), Stage::Idle);
//! ```

use crate::feedback::Feedback;
use crate::workflow::Stage;
use std::sync::Arc;

/// Called by the workflow as it moves between stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Calls arrive strictly in order from one task.
pub trait WorkflowProgress: Send + Sync {
    /// Called after every stage change, including fall-backs out of `Error`.
    fn on_stage(&self, from: Stage, to: Stage) {
        let _ = (from, to);
    }

    /// Called whenever the feedback slot is overwritten.
    fn on_feedback(&self, feedback: &Feedback) {
        let _ = feedback;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no observer is configured.
pub struct NoopProgress;

impl WorkflowProgress for NoopProgress {}

/// Convenience alias matching the type stored in the workflow.
pub type ProgressObserver = Arc<dyn WorkflowProgress>;
