//! Progress-callback trait for phased extraction feedback.
//!
//! Inject an `Arc<dyn ExtractProgressCallback>` into
//! [`crate::flow::FlowController::run_extraction`] (or
//! [`crate::extract::ExtractionService::extract`] directly) to receive an
//! event at each phase boundary of the extraction job.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a channel, or a UI update
//! without the library knowing how the host application communicates. A
//! channel-backed adapter is provided in [`crate::stream`] for callers who
//! prefer a `Stream`.
//!
//! # The four-phase contract
//!
//! Phases fire in order with fixed cumulative weights, so a consumer can
//! render granular feedback rather than a single blocking wait:
//!
//! | Phase | Cumulative % | Spans |
//! |-------|--------------|-------|
//! | Initializing | 0   | job construction |
//! | Processing   | 25  | payload assembly |
//! | Applying     | 50  | the remote-call latency |
//! | Finalizing   | 75  | result derivation |
//! | Complete     | 100 | — |
//!
//! `Applying` is the only phase with real latency: the flow genuinely
//! suspends on the remote response there.

use std::sync::Arc;

/// One phase of an extraction job, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtractPhase {
    /// Job construction. 0%.
    Initializing,
    /// Payload assembly. 25%.
    Processing,
    /// Remote call in flight. 50%.
    Applying,
    /// Deriving records from the settled response. 75%.
    Finalizing,
    /// Terminal. 100%.
    Complete,
}

impl ExtractPhase {
    /// Cumulative progress weight for this phase, 0–100.
    pub fn percent(self) -> u8 {
        match self {
            ExtractPhase::Initializing => 0,
            ExtractPhase::Processing => 25,
            ExtractPhase::Applying => 50,
            ExtractPhase::Finalizing => 75,
            ExtractPhase::Complete => 100,
        }
    }

    /// Human-readable status line for this phase.
    pub fn status(self) -> &'static str {
        match self {
            ExtractPhase::Initializing => "Initializing extraction...",
            ExtractPhase::Processing => "Processing files...",
            ExtractPhase::Applying => "Applying extraction prompt...",
            ExtractPhase::Finalizing => "Finalizing extraction...",
            ExtractPhase::Complete => "Extraction complete!",
        }
    }
}

/// Called by the extraction service as the job advances.
///
/// Implementations must be `Send + Sync` so the same callback can be handed
/// to a spawned driver task. All methods have default no-op implementations
/// so callers only override what they care about.
pub trait ExtractProgressCallback: Send + Sync {
    /// Called at every phase boundary, in order, including `Complete`.
    fn on_phase(&self, phase: ExtractPhase) {
        let _ = phase;
    }

    /// Called once if the extraction attempt fails.
    ///
    /// `Complete` does not fire for a failed attempt; the last `on_phase`
    /// seen tells the consumer how far the job got.
    fn on_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared trait object.
pub type ProgressCallback = Arc<dyn ExtractProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct PhaseRecorder {
        seen: Mutex<Vec<ExtractPhase>>,
        failures: Mutex<Vec<String>>,
    }

    impl ExtractProgressCallback for PhaseRecorder {
        fn on_phase(&self, phase: ExtractPhase) {
            self.seen.lock().unwrap().push(phase);
        }

        fn on_failed(&self, error: &str) {
            self.failures.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn phase_weights_are_fixed_and_monotonic() {
        let phases = [
            ExtractPhase::Initializing,
            ExtractPhase::Processing,
            ExtractPhase::Applying,
            ExtractPhase::Finalizing,
            ExtractPhase::Complete,
        ];
        let weights: Vec<u8> = phases.iter().map(|p| p.percent()).collect();
        assert_eq!(weights, vec![0, 25, 50, 75, 100]);
        assert!(phases.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_phase(ExtractPhase::Applying);
        cb.on_failed("boom");
    }

    #[test]
    fn recorder_receives_events() {
        let rec = PhaseRecorder {
            seen: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        };
        rec.on_phase(ExtractPhase::Initializing);
        rec.on_phase(ExtractPhase::Processing);
        rec.on_failed("HTTP 500");
        assert_eq!(rec.seen.lock().unwrap().len(), 2);
        assert_eq!(rec.failures.lock().unwrap()[0], "HTTP 500");
    }
}
