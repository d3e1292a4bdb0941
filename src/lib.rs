//! # extractflow
//!
//! Upload text files to a remote content-extraction service, run a
//! prompt-based extraction job with phased progress, and review the
//! resulting tabular data, with a full audit trail of every remote call
//! and lifecycle tracking of every server-side artifact the session
//! creates.
//!
//! ## Why this crate?
//!
//! Driving a remote processing service is easy to get wrong in the ways
//! that hurt later: calls that vanish without a trace, server-side objects
//! that nobody remembers to delete, and cancelled jobs whose results land
//! anyway and clobber state. This crate packages the whole workflow behind
//! one state machine with three hard guarantees: every call is audited
//! (pending *and* settled), every created artifact is tracked until
//! deleted, and a completion for a cancelled job can never mutate state.
//!
//! ## Flow Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Upload      batch → POST /input_data → one remote object
//!  ├─ 2. Extracting  job → POST /apply_prompt (phased: 0/25/50/75/100 %)
//!  ├─ 3. Review      tabular records, CSV export
//!  ├─ 4. Debug       audit-log inspection (view toggle)
//!  └─ 5. Cleanup     DELETE /objects/{name}, sequential, audited
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extractflow::{FlowConfig, FlowController, NoopProgressCallback, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut flow = FlowController::new(FlowConfig::default());
//!
//!     let file = UploadedFile::from_path("report.txt").await?;
//!     flow.submit_files(vec![file]).await?;
//!     flow.run_extraction(&NoopProgressCallback).await?;
//!
//!     for record in flow.records() {
//!         println!("{}: {} ({})", record.field, record.value, record.kind);
//!     }
//!
//!     let failures = flow.delete_remote_objects().await?;
//!     eprintln!("cleanup: {} objects could not be deleted", failures.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Scope
//!
//! Session state lives in memory and is lost on process restart; each
//! remote call is attempted exactly once (no retry/backoff layer); exactly
//! one extraction job is in flight per session. Cancellation is cooperative:
//! it discards the result of an in-flight call but does not abort it at
//! the transport layer.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `extractflow` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! extractflow = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod flow;
pub mod objects;
pub mod progress;
pub mod prompts;
pub mod records;
pub mod stream;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use audit::{ApiCallRecord, AuditLog, CallKind};
pub use client::{ApiClient, ApiTransport, HttpTransport, TransportResponse};
pub use config::{FlowConfig, FlowConfigBuilder, DEFAULT_BASE_URL};
pub use error::{DeleteFailure, FlowError};
pub use extract::{CancelToken, ExtractionJob, ExtractionOutcome, ExtractionService};
pub use flow::{FlowController, FlowStep, JobTicket};
pub use objects::{generate_object_name, ObjectLifecycleManager};
pub use progress::{ExtractPhase, ExtractProgressCallback, NoopProgressCallback, ProgressCallback};
pub use records::{format_file_size, ExtractedRecord};
pub use stream::{progress_channel, ProgressStream, ProgressUpdate};
pub use upload::{UploadService, UploadedFile};
