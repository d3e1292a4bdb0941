//! Append-only audit log of every remote call the flow has attempted.
//!
//! ## Why a separate log?
//!
//! The remote service is an opaque collaborator: when something goes wrong
//! the only evidence is the exact requests and responses that crossed the
//! wire. The log records every call twice, once with status `pending`
//! before the request is issued and once with the settled outcome, so even a
//! hung or crashed call leaves a trace.
//!
//! ## Guarantees
//!
//! * **Append-only**: entries are never mutated or removed once appended.
//! * **Order-preserving**: for any one call the pending record precedes its
//!   resolved record, and distinct calls interleave only in issue order.
//!   Append order is the log's only ordering guarantee.
//!
//! The log is intentionally unbounded. A long-running session accumulates
//! entries without eviction; callers that need a cap should snapshot and
//! rotate externally, keeping the append-only public behaviour intact.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use time::OffsetDateTime;

/// What kind of remote (or local) call a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallKind {
    /// POST: createObject or applyPrompt.
    Post,
    /// DELETE: deleteObject.
    Delete,
    /// Synthetic local entry: tabular data was rendered to a file.
    Export,
}

/// One immutable entry in the audit log.
///
/// A remote call produces two of these: a `pending` record appended before
/// the request is issued (payload only, `success == None`) and a resolved
/// record appended once the call settles (response body, status, outcome).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallRecord {
    /// Call kind (HTTP verb, or `Export` for the local CSV side effect).
    pub kind: CallKind,
    /// Request target: service path such as `/input_data`, or `local`.
    pub target: String,
    /// Request payload, stored verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Response body, stored verbatim once the call settles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// HTTP status code, when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Error message for transport failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `None` while pending; `Some(outcome)` once settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Stamped by [`AuditLog::append`] at append time.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ApiCallRecord {
    /// A `pending` record for a call about to be issued.
    ///
    /// `payload` is `None` for bodyless calls (DELETE).
    pub fn pending(
        kind: CallKind,
        target: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            payload,
            response: None,
            status: None,
            error: None,
            success: None,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// A resolved record for a call that received an HTTP response.
    pub fn resolved(
        kind: CallKind,
        target: impl Into<String>,
        payload: Option<serde_json::Value>,
        response: Option<serde_json::Value>,
        status: u16,
        success: bool,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            payload,
            response,
            status: Some(status),
            error: None,
            success: Some(success),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// A resolved record for a call that failed before a usable response.
    ///
    /// Transport failures carry no status; a response whose body could not
    /// be parsed carries the status it arrived with.
    pub fn failed(
        kind: CallKind,
        target: impl Into<String>,
        error: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            payload: None,
            response: None,
            status,
            error: Some(error.into()),
            success: Some(false),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// The synthetic local entry appended when records are exported to CSV.
    pub fn export() -> Self {
        Self {
            kind: CallKind::Export,
            target: "local".into(),
            payload: None,
            response: None,
            status: None,
            error: None,
            success: Some(true),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// True once the call has settled (resolved or failed).
    pub fn is_settled(&self) -> bool {
        self.success.is_some()
    }
}

/// The append-only, order-preserving call log.
///
/// Interior mutability lets one `Arc<AuditLog>` be shared by the client, the
/// services, and the controller. The `Mutex` exists only because the log is
/// shared by reference across components; the flow itself is driven by a
/// single logical task, so the critical sections never contend.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<ApiCallRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `record` with the current time and append it.
    pub fn append(&self, mut record: ApiCallRecord) {
        record.timestamp = OffsetDateTime::now_utc();
        self.entries
            .lock()
            .expect("audit log lock poisoned")
            .push(record);
    }

    /// The full ordered sequence, copied for inspection.
    pub fn snapshot(&self) -> Vec<ApiCallRecord> {
        self.entries
            .lock()
            .expect("audit log lock poisoned")
            .clone()
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
