//! Remote-object lifecycle: name generation, tracking, bulk deletion.
//!
//! Server-side artifacts are referenced, not owned: the remote service is
//! authoritative for their existence. This module tracks the names the
//! session has created so they can be deleted on demand, and generates
//! fresh names that are never reused within a session.

use crate::client::ApiClient;
use crate::error::DeleteFailure;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Process-wide counter appended to generated names.
///
/// Two names generated within the same millisecond would otherwise collide;
/// the counter makes every name unique for the lifetime of the process.
static NAME_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a collision-resistant object name for `purpose`
/// (e.g. `uploaded_files`, `extracted_data`).
///
/// Combines the purpose prefix, the creation time in unix milliseconds, and
/// a process-unique sequence number: `uploaded_files_1718000000000_3`.
pub fn generate_object_name(purpose: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = NAME_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{purpose}_{millis}_{seq}")
}

/// Ordered set of server-side artifact names created during the session.
///
/// Names are appended on every successful creation and kept until
/// [`delete_all`](Self::delete_all) or a session reset clears them.
#[derive(Debug, Default)]
pub struct ObjectLifecycleManager {
    names: Vec<String>,
}

impl ObjectLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully created object name, preserving creation order.
    ///
    /// Generated names are unique per session, so a duplicate indicates a
    /// caller bug; it is ignored rather than double-deleted later.
    pub fn track(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.names.contains(&name) {
            warn!(%name, "object name tracked twice; ignoring duplicate");
            return;
        }
        debug!(%name, "tracking remote object");
        self.names.push(name);
    }

    /// Tracked names in creation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget all tracked names without touching the remote service.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Delete every tracked object, one call per name, **sequentially** in
    /// creation order.
    ///
    /// Each deletion is awaited before the next starts so the audit log
    /// reflects deterministic ordering; the remote service itself does not
    /// require serialization. An individual failure is collected as a
    /// [`DeleteFailure`] and never aborts the remaining deletions. After all
    /// names have been attempted the tracked set is cleared regardless of
    /// per-item outcome.
    pub async fn delete_all(&mut self, client: &ApiClient) -> Vec<DeleteFailure> {
        let mut failures = Vec::new();

        for name in &self.names {
            match client.delete_object(name).await {
                Ok(response) if response.is_success() => {
                    debug!(%name, "remote object deleted");
                }
                Ok(response) => {
                    warn!(%name, status = response.status, "delete rejected");
                    failures.push(DeleteFailure {
                        object_name: name.clone(),
                        detail: format!("HTTP {}", response.status),
                    });
                }
                Err(e) => {
                    warn!(%name, error = %e, "delete failed");
                    failures.push(DeleteFailure {
                        object_name: name.clone(),
                        detail: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = self.names.len(),
            failed = failures.len(),
            "bulk deletion finished"
        );
        self.names.clear();
        failures
    }
}
