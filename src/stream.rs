//! Progress as a `Stream`: a channel-backed adapter over the callback trait.
//!
//! ## Why stream?
//!
//! Callbacks are the least-invasive integration point, but async consumers
//! (TUIs, websocket forwarders) often want to `select!` on progress next to
//! other event sources. [`progress_channel`] bridges the two worlds: it
//! returns a callback to hand to the extraction, and a `Stream` yielding
//! one [`ProgressUpdate`] per event. The stream ends when the callback side
//! is dropped, i.e. when the extraction attempt has finished either way.

use crate::progress::{ExtractPhase, ExtractProgressCallback};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// One progress event, as yielded by the stream side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// A phase boundary was crossed; carries the cumulative percentage.
    Phase(ExtractPhase),
    /// The attempt failed; carries the error description.
    Failed(String),
}

/// A boxed stream of progress updates.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressUpdate> + Send>>;

/// Callback half of [`progress_channel`]: forwards events into the channel.
///
/// Send errors are ignored: a consumer that dropped the stream simply stops
/// listening, which must not fail the extraction.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ExtractProgressCallback for ChannelProgress {
    fn on_phase(&self, phase: ExtractPhase) {
        let _ = self.tx.send(ProgressUpdate::Phase(phase));
    }

    fn on_failed(&self, error: &str) {
        let _ = self.tx.send(ProgressUpdate::Failed(error.to_string()));
    }
}

/// Create a linked callback/stream pair.
///
/// Hand the callback to [`crate::flow::FlowController::run_extraction`] (or
/// the service directly) and consume the stream from any task. The channel
/// is unbounded, mirroring the audit log: progress events are tiny and an
/// extraction emits at most a handful.
pub fn progress_channel() -> (Arc<ChannelProgress>, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(ChannelProgress { tx }),
        Box::pin(UnboundedReceiverStream::new(rx)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (callback, mut stream) = progress_channel();

        callback.on_phase(ExtractPhase::Initializing);
        callback.on_phase(ExtractPhase::Processing);
        callback.on_failed("HTTP 500");
        drop(callback);

        let collected: Vec<ProgressUpdate> = stream.by_ref().collect().await;
        assert_eq!(
            collected,
            vec![
                ProgressUpdate::Phase(ExtractPhase::Initializing),
                ProgressUpdate::Phase(ExtractPhase::Processing),
                ProgressUpdate::Failed("HTTP 500".into()),
            ]
        );
    }

    #[tokio::test]
    async fn dropped_consumer_does_not_break_the_callback() {
        let (callback, stream) = progress_channel();
        drop(stream);
        callback.on_phase(ExtractPhase::Complete);
    }

    #[tokio::test]
    async fn stream_ends_when_callback_is_dropped() {
        let (callback, mut stream) = progress_channel();
        callback.on_phase(ExtractPhase::Complete);
        drop(callback);

        assert_eq!(
            stream.next().await,
            Some(ProgressUpdate::Phase(ExtractPhase::Complete))
        );
        assert_eq!(stream.next().await, None);
    }
}
