//! Extraction job construction, phased execution, and cooperative
//! cancellation.
//!
//! An [`ExtractionJob`] is created once per attempt and never mutated: a
//! freshly generated output artifact name, the configured prompt template
//! (with its `{input_data}` placeholder), and one input binding referencing
//! the uploaded source object with the configured processing mode.
//!
//! ## Cancellation
//!
//! Every invocation carries a [`CancelToken`]. Cancellation is cooperative
//! and local: it flips a shared flag that the service checks after the
//! remote call settles and again before returning, suppressing record
//! construction for a cancelled job. It does **not** abort the request at
//! the transport layer: the HTTP exchange runs to completion and is still
//! audited; only its result is discarded. A late-settling call for an
//! already-cancelled token therefore never mutates flow state.

use crate::client::{ApiClient, ApplyPromptRequest, PromptInput};
use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::objects::generate_object_name;
use crate::progress::{ExtractPhase, ExtractProgressCallback};
use crate::records::{fallback_records, records_from_response, ExtractedRecord};
use crate::upload::UploadedFile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative liveness token for one extraction attempt.
///
/// Cheap to clone; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the attempt as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A single transformation request, immutable once built.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Output artifact name(s) the job will create on the service.
    pub output_names: Vec<String>,
    /// The prompt template sent verbatim, placeholder included; the
    /// service performs the substitution.
    pub prompt: String,
    /// Source object name the job reads from.
    pub source_object: String,
    /// How the service combines the source into the prompt input.
    pub processing_mode: String,
}

impl ExtractionJob {
    /// Build a job for `source_object` under the session config.
    pub fn new(config: &FlowConfig, source_object: impl Into<String>) -> Self {
        Self {
            output_names: vec![generate_object_name("extracted_data")],
            prompt: config.prompt_template.clone(),
            source_object: source_object.into(),
            processing_mode: config.processing_mode.clone(),
        }
    }

    fn to_request(&self) -> ApplyPromptRequest {
        ApplyPromptRequest {
            created_object_names: self.output_names.clone(),
            prompt_string: self.prompt.clone(),
            inputs: vec![PromptInput {
                object_name: self.source_object.clone(),
                processing_mode: self.processing_mode.clone(),
            }],
        }
    }
}

/// What a finished extraction hands back to the controller.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// The final result table.
    pub records: Vec<ExtractedRecord>,
    /// Output artifact names created on the service (tracked for cleanup).
    pub output_names: Vec<String>,
}

/// Submits one transformation job and reports phased progress to completion.
pub struct ExtractionService<'a> {
    client: &'a ApiClient,
    config: &'a FlowConfig,
}

impl<'a> ExtractionService<'a> {
    pub fn new(client: &'a ApiClient, config: &'a FlowConfig) -> Self {
        Self { client, config }
    }

    /// Run one extraction attempt against `source_object`.
    ///
    /// Issues exactly one remote call (`applyPrompt`, audited pending-then-
    /// resolved) and walks the four-phase progress contract on `callback`.
    /// The `Applying` phase spans the actual remote-call latency.
    ///
    /// `first_file` feeds the metadata fallback when the response body is
    /// not record-shaped (see [`crate::records`] for the derivation policy).
    ///
    /// Returns [`FlowError::Cancelled`] when `token` fires before the
    /// finalize phase completes; the caller is expected to drop that
    /// silently.
    pub async fn extract(
        &self,
        source_object: &str,
        first_file: &UploadedFile,
        token: &CancelToken,
        callback: &dyn ExtractProgressCallback,
    ) -> Result<ExtractionOutcome, FlowError> {
        callback.on_phase(ExtractPhase::Initializing);
        let job = ExtractionJob::new(self.config, source_object);
        info!(
            source = %job.source_object,
            output = %job.output_names[0],
            "starting extraction job"
        );

        callback.on_phase(ExtractPhase::Processing);
        let request = job.to_request();

        callback.on_phase(ExtractPhase::Applying);
        let response = match self.client.apply_prompt(&request).await {
            Ok(response) => response,
            Err(e) => {
                callback.on_failed(&e.to_string());
                return Err(e);
            }
        };

        if token.is_cancelled() {
            debug!("extraction cancelled while applying; dropping result");
            return Err(FlowError::Cancelled);
        }

        if !response.is_success() {
            let err = FlowError::ServiceError {
                target: "/apply_prompt".into(),
                status: response.status,
            };
            warn!(status = response.status, "extraction job rejected");
            callback.on_failed(&err.to_string());
            return Err(err);
        }

        callback.on_phase(ExtractPhase::Finalizing);
        let records = match response.body.as_ref().and_then(records_from_response) {
            Some(records) => records,
            None => {
                debug!("response body not record-shaped; using metadata fallback");
                fallback_records(first_file)
            }
        };

        if token.is_cancelled() {
            debug!("extraction cancelled while finalizing; dropping result");
            return Err(FlowError::Cancelled);
        }

        callback.on_phase(ExtractPhase::Complete);
        Ok(ExtractionOutcome {
            records,
            output_names: job.output_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_binds_source_with_configured_mode() {
        let config = FlowConfig::default();
        let job = ExtractionJob::new(&config, "uploaded_files_5_0");
        assert_eq!(job.source_object, "uploaded_files_5_0");
        assert_eq!(job.processing_mode, "combine_events");
        assert_eq!(job.output_names.len(), 1);
        assert!(job.output_names[0].starts_with("extracted_data_"));
        assert!(job.prompt.contains("{input_data}"));

        let request = job.to_request();
        assert_eq!(request.inputs.len(), 1);
        assert_eq!(request.inputs[0].object_name, "uploaded_files_5_0");
    }

    #[test]
    fn jobs_never_reuse_output_names() {
        let config = FlowConfig::default();
        let a = ExtractionJob::new(&config, "src");
        let b = ExtractionJob::new(&config, "src");
        assert_ne!(a.output_names, b.output_names);
    }

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
