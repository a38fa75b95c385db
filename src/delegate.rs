//! Delegate contract toward the transport layer.
//!
//! An [`EncoderDelegate`] receives format change notifications and encoded
//! sample buffers. The encoder keeps only a weak reference; the caller owns
//! the delegate and controls its lifetime.

use tokio::sync::mpsc;

use crate::format::FormatDescriptor;
use crate::sample::EncodedSampleBuffer;

/// Receives encoder output.
///
/// # Implementation Notes
///
/// - Both methods are called on the thread that invoked `encode`, while the
///   encoder's state lock is held; return quickly and do not call `encode`
///   from inside them
/// - `on_format_changed` is called before the first `on_encoded_sample` and
///   again only if the descriptor value changes
///
/// # Example
///
/// ```
/// use stream_mulaw::{EncodedSampleBuffer, EncoderDelegate, FormatDescriptor};
///
/// struct PrintDelegate;
///
/// impl EncoderDelegate for PrintDelegate {
///     fn on_format_changed(&self, descriptor: &FormatDescriptor) {
///         println!("format: {}Hz", descriptor.sample_rate);
///     }
///
///     fn on_encoded_sample(&self, buffer: EncodedSampleBuffer) {
///         println!("encoded {} bytes", buffer.data.len());
///     }
/// }
/// ```
pub trait EncoderDelegate: Send + Sync {
    /// The encoded stream format changed.
    fn on_format_changed(&self, descriptor: &FormatDescriptor);

    /// One input buffer was encoded.
    fn on_encoded_sample(&self, buffer: EncodedSampleBuffer);
}

/// Output forwarded by [`ChannelDelegate`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderOutput {
    /// A new format descriptor.
    FormatChanged(FormatDescriptor),
    /// An encoded sample buffer.
    Sample(EncodedSampleBuffer),
}

/// A delegate that forwards output into a tokio mpsc channel.
///
/// Sends never block the encoding thread: when the channel is full or
/// closed the output is discarded and a warning is logged.
///
/// # Example
///
/// ```
/// use stream_mulaw::{ChannelDelegate, EncoderOutput};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<EncoderOutput>(64);
/// let delegate = Arc::new(ChannelDelegate::new(tx));
/// // encoder.set_delegate(&delegate);
/// // while let Some(output) = rx.recv().await { ... }
/// ```
#[derive(Debug)]
pub struct ChannelDelegate {
    name: String,
    sender: mpsc::Sender<EncoderOutput>,
}

impl ChannelDelegate {
    /// Creates a channel delegate with the given sender.
    pub fn new(sender: mpsc::Sender<EncoderOutput>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a channel delegate with a custom name for logs.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<EncoderOutput>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, output: EncoderOutput) {
        if let Err(e) = self.sender.try_send(output) {
            tracing::warn!(delegate = %self.name, error = %e, "discarding encoder output");
        }
    }
}

impl EncoderDelegate for ChannelDelegate {
    fn on_format_changed(&self, descriptor: &FormatDescriptor) {
        self.forward(EncoderOutput::FormatChanged(*descriptor));
    }

    fn on_encoded_sample(&self, buffer: EncodedSampleBuffer) {
        self.forward(EncoderOutput::Sample(buffer));
    }
}
