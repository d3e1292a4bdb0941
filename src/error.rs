//! Error types for the extractflow library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FlowError`], **fatal to the current operation**: the upload,
//!   extraction, or export cannot proceed. Returned as `Err(FlowError)` from
//!   the [`crate::flow::FlowController`] operations. None of these are fatal
//!   to the session itself: the flow stays interactive and resettable after
//!   any of them.
//!
//! * [`DeleteFailure`], **non-fatal**: deleting a single remote object
//!   failed, but the remaining deletions proceed. Collected by
//!   [`crate::objects::ObjectLifecycleManager::delete_all`] so callers can
//!   inspect partial cleanup rather than losing the whole pass to one bad
//!   object.
//!
//! Every remote-call failure is also converted into a failed audit record
//! (success = false, error message captured) before it surfaces here, so the
//! audit log is complete even on error paths.

use crate::flow::FlowStep;
use std::path::PathBuf;
use thiserror::Error;

/// All operation-level errors returned by the extractflow library.
///
/// Per-object deletion failures use [`DeleteFailure`] and are collected
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum FlowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A selected file's content could not be decoded as text.
    ///
    /// The whole batch fails atomically: no partial upload takes place.
    #[error("Cannot read '{}' as text: {detail}", .path.display())]
    ReadError { path: PathBuf, detail: String },

    /// `submit_files` was called with an empty file list.
    #[error("No files selected: submit at least one file")]
    EmptyBatch,

    // ── Remote-call errors ────────────────────────────────────────────────
    /// Transport-level failure before any response was received.
    #[error("Network error calling {target}: {detail}")]
    NetworkError { target: String, detail: String },

    /// The remote service answered with a non-2xx status.
    #[error("Service error from {target}: HTTP {status}")]
    ServiceError { target: String, status: u16 },

    /// The response body was not well-formed structured data.
    #[error("Unparseable response from {target}: {detail}")]
    ParseError { target: String, detail: String },

    // ── Flow errors ───────────────────────────────────────────────────────
    /// An operation was invoked in a step where it is not defined.
    ///
    /// No state transition happens; the controller stays where it was.
    #[error("'{operation}' is not valid in the {step:?} step")]
    InvalidState {
        operation: &'static str,
        step: FlowStep,
    },

    /// The in-flight extraction was cancelled before it could finish.
    ///
    /// The controller drops this silently when a late completion arrives for
    /// a cancelled job; it only surfaces to callers driving the service
    /// directly.
    #[error("Extraction cancelled")]
    Cancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the CSV export file.
    #[error("Failed to write export file '{}': {source}", .path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal failure for a single remote-object deletion.
///
/// Collected by `delete_all`; the remaining deletions always proceed and the
/// tracked set is cleared regardless of how many of these were produced.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("Failed to delete remote object '{object_name}': {detail}")]
pub struct DeleteFailure {
    /// Server-side name of the object that could not be deleted.
    pub object_name: String,
    /// Human-readable reason (transport error or HTTP status).
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display() {
        let e = FlowError::ServiceError {
            target: "/input_data".into(),
            status: 503,
        };
        let msg = e.to_string();
        assert!(msg.contains("/input_data"), "got: {msg}");
        assert!(msg.contains("503"), "got: {msg}");
    }

    #[test]
    fn invalid_state_display() {
        let e = FlowError::InvalidState {
            operation: "cancel_extraction",
            step: FlowStep::Upload,
        };
        assert!(e.to_string().contains("cancel_extraction"));
        assert!(e.to_string().contains("Upload"));
    }

    #[test]
    fn read_error_display() {
        let e = FlowError::ReadError {
            path: PathBuf::from("binary.bin"),
            detail: "invalid utf-8 sequence".into(),
        };
        assert!(e.to_string().contains("binary.bin"));
    }

    #[test]
    fn delete_failure_display() {
        let f = DeleteFailure {
            object_name: "uploaded_files_17_0".into(),
            detail: "HTTP 404".into(),
        };
        assert!(f.to_string().contains("uploaded_files_17_0"));
        assert!(f.to_string().contains("404"));
    }
}
