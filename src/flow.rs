//! The flow controller: the state machine that sequences upload → extraction
//! → review → cleanup.
//!
//! One [`FlowController`] instance owns all session state (the selected
//! files, the active job, the result records, the tracked remote-object
//! names) and mutates it only through the operations defined here. All
//! operations take `&mut self`, so the borrow checker enforces the
//! single-writer model: no two core operations can run in parallel against
//! the same state.
//!
//! ## Transition graph
//!
//! ```text
//! Upload ──submit_files ok──▶ Extracting ──completion applies──▶ Review
//!   ▲                            │                                │  ▲
//!   │◀────────cancel─────────────┘                    enter_debug │  │ exit_debug
//!   │                                                             ▼  │
//!   │◀──────reset / delete_remote_objects──────── Review        Debug
//! ```
//!
//! A failed upload keeps the controller in Upload with no partial state
//! change. A failed extraction keeps it in Extracting with the attempt
//! marked failed (a terminal sub-state: cancel or retry). Resets clear all
//! derived data but never the audit log, which is cumulative for the whole
//! session.

use crate::audit::AuditLog;
use crate::client::ApiClient;
use crate::config::FlowConfig;
use crate::error::{DeleteFailure, FlowError};
use crate::extract::{CancelToken, ExtractionOutcome, ExtractionService};
use crate::objects::ObjectLifecycleManager;
use crate::progress::ExtractProgressCallback;
use crate::records::{self, ExtractedRecord};
use crate::upload::{UploadService, UploadedFile};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One of the four user-visible phases of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Selecting and submitting files.
    Upload,
    /// A job is in flight (or has failed and awaits cancel/retry).
    Extracting,
    /// Results are available for inspection and export.
    Review,
    /// Audit-log inspection view; a pure toggle from Review.
    Debug,
}

/// Handle for one extraction attempt, issued by [`FlowController::submit_files`].
///
/// Carries the job's generation number and its cancellation token. A ticket
/// outlives its job harmlessly: applying a completion through a stale ticket
/// is a silent no-op, and cancelling through one only affects the attempt it
/// was issued for.
#[derive(Debug, Clone)]
pub struct JobTicket {
    generation: u64,
    cancel: CancelToken,
}

impl JobTicket {
    /// Request cooperative cancellation of this attempt.
    ///
    /// Safe to call from another task (e.g. a Ctrl-C handler): the in-flight
    /// service call will observe the token once its remote call settles and
    /// suppress its completion. The transport-level request is not aborted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

struct ActiveJob {
    source_object: String,
    generation: u64,
    cancel: CancelToken,
    attempt_failed: bool,
}

/// The multi-stage workflow orchestrator.
pub struct FlowController {
    config: FlowConfig,
    client: ApiClient,
    audit: Arc<AuditLog>,
    step: FlowStep,
    files: Vec<UploadedFile>,
    records: Vec<ExtractedRecord>,
    objects: ObjectLifecycleManager,
    job: Option<ActiveJob>,
    next_generation: u64,
}

impl FlowController {
    /// Create a controller for one session.
    pub fn new(config: FlowConfig) -> Self {
        let audit = Arc::new(AuditLog::new());
        let client = ApiClient::new(&config, audit.clone());
        Self {
            config,
            client,
            audit,
            step: FlowStep::Upload,
            files: Vec::new(),
            records: Vec::new(),
            objects: ObjectLifecycleManager::new(),
            job: None,
            next_generation: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Current flow step.
    pub fn step(&self) -> FlowStep {
        self.step
    }

    /// Files of the current session (empty outside Extracting/Review/Debug).
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Result records (empty until a completion applies).
    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    /// Remote-object names tracked for cleanup, in creation order.
    pub fn tracked_objects(&self) -> &[String] {
        self.objects.names()
    }

    /// The session's cumulative audit log.
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// True while in Extracting after a failed attempt (cancel or retry).
    pub fn attempt_failed(&self) -> bool {
        self.job.as_ref().is_some_and(|j| j.attempt_failed)
    }

    // ── Operations ────────────────────────────────────────────────────────

    /// Upload a non-empty batch of files as one remote object and move to
    /// Extracting.
    ///
    /// On failure the controller stays in Upload and no partial state is
    /// recorded: the artifact name is only tracked, and the files only
    /// stored, after a 2xx response.
    pub async fn submit_files(&mut self, files: Vec<UploadedFile>) -> Result<JobTicket, FlowError> {
        self.require_step(FlowStep::Upload, "submit_files")?;
        if files.is_empty() {
            return Err(FlowError::EmptyBatch);
        }

        let upload = UploadService::new(&self.client, &self.config);
        let source_object = upload.upload(&files).await?;

        self.objects.track(&source_object);
        self.files = files;
        self.next_generation += 1;
        let cancel = CancelToken::new();
        self.job = Some(ActiveJob {
            source_object,
            generation: self.next_generation,
            cancel: cancel.clone(),
            attempt_failed: false,
        });
        self.step = FlowStep::Extracting;
        info!(generation = self.next_generation, "upload complete; extracting");

        Ok(JobTicket {
            generation: self.next_generation,
            cancel,
        })
    }

    /// Drive the extraction job to completion, reporting phased progress on
    /// `callback`.
    ///
    /// On success the completion is applied (records stored, output names
    /// tracked, step → Review) unless the job was cancelled while the remote
    /// call was in flight, in which case the settled result is discarded,
    /// the controller ends in Upload, and [`FlowError::Cancelled`] is
    /// returned. On a service failure the controller stays in Extracting
    /// with the attempt marked failed; the caller may retry
    /// `run_extraction` or [`cancel_extraction`](Self::cancel_extraction).
    pub async fn run_extraction(
        &mut self,
        callback: &dyn ExtractProgressCallback,
    ) -> Result<(), FlowError> {
        self.require_step(FlowStep::Extracting, "run_extraction")?;
        let (Some(job), Some(first_file)) = (self.job.as_ref(), self.files.first().cloned())
        else {
            return Err(FlowError::InvalidState {
                operation: "run_extraction",
                step: self.step,
            });
        };
        let generation = job.generation;
        let source = job.source_object.clone();
        let token = job.cancel.clone();

        let service = ExtractionService::new(&self.client, &self.config);
        match service.extract(&source, &first_file, &token, callback).await {
            Ok(outcome) => {
                self.apply_completion(generation, &token, outcome);
                Ok(())
            }
            Err(FlowError::Cancelled) => {
                // The ticket fired while we were awaiting the remote call.
                // The job is discarded; a cancel_extraction() issued
                // meanwhile has already moved us to Upload.
                if self.step == FlowStep::Extracting {
                    self.discard_job();
                }
                Err(FlowError::Cancelled)
            }
            Err(e) => {
                if let Some(job) = self.job.as_mut() {
                    job.attempt_failed = true;
                }
                warn!(error = %e, "extraction attempt failed");
                Err(e)
            }
        }
    }

    /// Apply a completion for the attempt `ticket` was issued for.
    ///
    /// Returns `true` when the completion applied (step is now Review).
    /// A completion for a cancelled or superseded job is a silent no-op:
    /// this is the deferred-result guard: a late-firing completion must
    /// never mutate flow state.
    pub fn complete_extraction(
        &mut self,
        ticket: &JobTicket,
        records: Vec<ExtractedRecord>,
        output_names: Vec<String>,
    ) -> bool {
        if ticket.cancel.is_cancelled() {
            debug!("dropping completion for cancelled job");
            return false;
        }
        self.apply_completion(
            ticket.generation,
            &ticket.cancel,
            ExtractionOutcome {
                records,
                output_names,
            },
        )
    }

    /// Cancel the in-flight job and return to Upload, discarding partial
    /// progress.
    ///
    /// Invalidates the active job's completion token: a later-firing
    /// completion for it is dropped silently. Remote objects already created
    /// stay tracked so they can still be cleaned up later. Deletion is a
    /// Review-step operation, so the kept names are only deletable once a
    /// subsequent flow reaches Review; they survive until then (or until a
    /// reset clears the tracked set).
    pub fn cancel_extraction(&mut self) -> Result<(), FlowError> {
        self.require_step(FlowStep::Extracting, "cancel_extraction")?;
        let Some(job) = self.job.as_ref() else {
            return Err(FlowError::InvalidState {
                operation: "cancel_extraction",
                step: self.step,
            });
        };
        job.cancel.cancel();
        info!(generation = job.generation, "extraction cancelled");
        self.discard_job();
        Ok(())
    }

    /// Clear files, job, records, and the tracked object set, returning to
    /// Upload. The audit log is never cleared.
    pub fn reset_flow(&mut self) -> Result<(), FlowError> {
        self.require_step(FlowStep::Review, "reset_flow")?;
        self.clear_session();
        info!("flow reset");
        Ok(())
    }

    /// Delete every tracked remote object (sequentially, in creation
    /// order), then behave as reset.
    ///
    /// Always ends in Upload with an empty tracked set, regardless of
    /// per-object outcomes; individual failures are returned for
    /// inspection.
    pub async fn delete_remote_objects(&mut self) -> Result<Vec<DeleteFailure>, FlowError> {
        self.require_step(FlowStep::Review, "delete_remote_objects")?;
        let failures = self.objects.delete_all(&self.client).await;
        self.clear_session();
        Ok(failures)
    }

    /// Switch the Review view to the audit-log Debug view.
    ///
    /// A pure view toggle: never mutates files, records, or names.
    pub fn enter_debug(&mut self) -> Result<(), FlowError> {
        self.require_step(FlowStep::Review, "enter_debug")?;
        self.step = FlowStep::Debug;
        Ok(())
    }

    /// Return from the Debug view to Review.
    pub fn exit_debug(&mut self) -> Result<(), FlowError> {
        self.require_step(FlowStep::Debug, "exit_debug")?;
        self.step = FlowStep::Review;
        Ok(())
    }

    /// Export the result records to `path` as CSV and append the synthetic
    /// `Export` audit entry. Available while reviewing (Review or Debug).
    pub async fn export_csv(&self, path: impl AsRef<Path>) -> Result<(), FlowError> {
        if self.step != FlowStep::Review && self.step != FlowStep::Debug {
            return Err(FlowError::InvalidState {
                operation: "export_csv",
                step: self.step,
            });
        }
        records::export_csv(&self.records, path, &self.audit).await
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn apply_completion(
        &mut self,
        generation: u64,
        token: &CancelToken,
        outcome: ExtractionOutcome,
    ) -> bool {
        if self.step != FlowStep::Extracting {
            debug!("dropping completion: not extracting");
            return false;
        }
        match self.job.as_ref() {
            Some(job) if job.generation == generation && !token.is_cancelled() => {}
            _ => {
                debug!(generation, "dropping completion for stale job");
                return false;
            }
        }

        for name in &outcome.output_names {
            self.objects.track(name);
        }
        self.records = outcome.records;
        self.job = None;
        self.step = FlowStep::Review;
        info!(rows = self.records.len(), "extraction complete; reviewing");
        true
    }

    /// Drop the active job and derived data, back to Upload. Tracked object
    /// names survive so cleanup remains possible.
    fn discard_job(&mut self) {
        self.job = None;
        self.files.clear();
        self.records.clear();
        self.step = FlowStep::Upload;
    }

    /// Full reset of derived data including the tracked object set.
    fn clear_session(&mut self) {
        self.job = None;
        self.files.clear();
        self.records.clear();
        self.objects.clear();
        self.step = FlowStep::Upload;
    }

    fn require_step(&self, expected: FlowStep, operation: &'static str) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::InvalidState {
                operation,
                step: self.step,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FlowController {
        FlowController::new(FlowConfig::default())
    }

    #[test]
    fn starts_in_upload_with_empty_state() {
        let flow = controller();
        assert_eq!(flow.step(), FlowStep::Upload);
        assert!(flow.files().is_empty());
        assert!(flow.records().is_empty());
        assert!(flow.tracked_objects().is_empty());
        assert!(flow.audit().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_empty_batch() {
        let mut flow = controller();
        let err = flow.submit_files(Vec::new()).await.unwrap_err();
        assert!(matches!(err, FlowError::EmptyBatch));
        assert_eq!(flow.step(), FlowStep::Upload);
    }

    #[test]
    fn wrong_step_operations_do_not_transition() {
        let mut flow = controller();
        assert!(matches!(
            flow.cancel_extraction(),
            Err(FlowError::InvalidState { .. })
        ));
        assert!(matches!(flow.reset_flow(), Err(FlowError::InvalidState { .. })));
        assert!(matches!(flow.enter_debug(), Err(FlowError::InvalidState { .. })));
        assert!(matches!(flow.exit_debug(), Err(FlowError::InvalidState { .. })));
        assert_eq!(flow.step(), FlowStep::Upload);
    }
}
