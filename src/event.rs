//! Runtime events for monitoring encoder health.
//!
//! Events are non-fatal notifications. The encoder keeps accepting buffers
//! after any event - they're for logging/metrics, not error handling.

use std::sync::Arc;

use crate::format::SourceFormat;

/// Why an input buffer produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The encoder is not running.
    NotRunning,
    /// The buffer carried no embedded format.
    MissingFormat,
    /// The buffer carried no audio data.
    MissingData,
    /// No conversion session could be built.
    SessionUnavailable,
    /// The fill cycle returned a failure status.
    FillFailed {
        /// The raw status code.
        status: i32,
    },
    /// The fill cycle succeeded but produced no bytes.
    NoOutput,
}

/// Runtime events emitted by the encoder.
///
/// # Example
///
/// ```
/// use stream_mulaw::{DropReason, EncoderEvent};
///
/// fn handle_event(event: EncoderEvent) {
///     match event {
///         EncoderEvent::FormatNegotiated { format } => {
///             eprintln!("source: {}Hz/{}ch", format.sample_rate, format.channels);
///         }
///         EncoderEvent::FrameDropped { reason: DropReason::NotRunning } => {}
///         EncoderEvent::FrameDropped { reason } => eprintln!("dropped: {reason:?}"),
///         EncoderEvent::OutputSizeFallback { fallback_bytes, error } => {
///             eprintln!("using {fallback_bytes} byte output buffer: {error}");
///         }
///         EncoderEvent::SessionUnavailable { error } => eprintln!("no session: {error}"),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum EncoderEvent {
    /// A source format was negotiated from the first accepted buffer.
    FormatNegotiated {
        /// The negotiated format.
        format: SourceFormat,
    },

    /// An input buffer was dropped without output.
    FrameDropped {
        /// Why it was dropped.
        reason: DropReason,
    },

    /// The engine could not report its maximum output packet size and the
    /// fallback estimate was used.
    OutputSizeFallback {
        /// Size of the output buffer that was allocated instead.
        fallback_bytes: usize,
        /// Description of the query failure.
        error: String,
    },

    /// No codec in the priority list could be built.
    SessionUnavailable {
        /// Description of the failure.
        error: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register one via [`AudioEncoderBuilder::on_event()`].
///
/// # Implementation Notes
///
/// - Called synchronously on the thread that triggered the event, while the
///   encoder's state lock is held
/// - Return quickly and do not call back into the encoder (`encode`,
///   `settings`, `state`, `source_format`, ...) from inside it; forward to
///   a channel instead
///
/// [`AudioEncoderBuilder::on_event()`]: crate::AudioEncoderBuilder::on_event
pub type EventCallback = Arc<dyn Fn(EncoderEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use stream_mulaw::{event_callback, EncoderEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(EncoderEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_debug() {
        let event = EncoderEvent::FrameDropped {
            reason: DropReason::FillFailed { status: -50 },
        };
        let debug = format!("{:?}", event);
        assert!(debug.contains("FillFailed"));
        assert!(debug.contains("-50"));
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(EncoderEvent::FrameDropped {
            reason: DropReason::NotRunning,
        });
        assert!(called.load(Ordering::SeqCst));
    }
}
