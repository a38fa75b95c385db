//! Source format negotiation and the fixed destination format.

use crate::config::{DESTINATION_SAMPLE_RATE, FRAMES_PER_PACKET};
use crate::sample::{InputFormat, SampleFormat};

/// Format of the PCM input, captured from the first accepted buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// `true` if all channels share one buffer.
    pub interleaved: bool,
    /// Bytes per frame in a single buffer.
    pub bytes_per_frame: usize,
    /// PCM sample encoding.
    pub sample_format: SampleFormat,
}

impl SourceFormat {
    /// Number of buffers a sample buffer of this format carries.
    pub fn buffer_count(&self) -> usize {
        if self.interleaved {
            1
        } else {
            self.channels as usize
        }
    }
}

impl From<&InputFormat> for SourceFormat {
    fn from(input: &InputFormat) -> Self {
        Self {
            sample_rate: input.sample_rate,
            channels: input.channels,
            interleaved: input.interleaved,
            bytes_per_frame: input.bytes_per_frame(),
            sample_format: input.sample_format,
        }
    }
}

/// Encoding of the destination stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// G.711 mu-law, one byte per sample.
    MuLaw,
}

/// The fixed destination format. Never varies with the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationFormat {
    /// Stream encoding.
    pub encoding: AudioEncoding,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bit depth of the linear samples the codec consumes.
    pub bits_per_channel: u16,
    /// Frames per packet.
    pub frames_per_packet: u32,
    /// Encoded bytes per frame.
    pub bytes_per_frame: u32,
}

impl DestinationFormat {
    /// 8 kHz mono mu-law with the given packet size.
    pub const fn mulaw(frames_per_packet: u32) -> Self {
        Self {
            encoding: AudioEncoding::MuLaw,
            sample_rate: DESTINATION_SAMPLE_RATE,
            channels: 1,
            bits_per_channel: 16,
            frames_per_packet,
            bytes_per_frame: 1,
        }
    }

    /// Encoded bytes per full packet.
    pub fn bytes_per_packet(&self) -> usize {
        (self.frames_per_packet * self.bytes_per_frame) as usize
    }
}

impl Default for DestinationFormat {
    fn default() -> Self {
        Self::mulaw(FRAMES_PER_PACKET)
    }
}

/// Describes the encoded stream for downstream decoder setup.
///
/// Compared by value to deduplicate change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Stream encoding.
    pub encoding: AudioEncoding,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Frames per packet.
    pub frames_per_packet: u32,
    /// Bytes per full packet.
    pub bytes_per_packet: usize,
}

impl From<&DestinationFormat> for FormatDescriptor {
    fn from(dest: &DestinationFormat) -> Self {
        Self {
            encoding: dest.encoding,
            sample_rate: dest.sample_rate,
            channels: dest.channels,
            frames_per_packet: dest.frames_per_packet,
            bytes_per_packet: dest.bytes_per_packet(),
        }
    }
}

/// Derives the source format from the first input and owns the destination
/// descriptor.
#[derive(Debug)]
pub struct FormatNegotiator {
    destination: DestinationFormat,
    source: Option<SourceFormat>,
    descriptor: Option<FormatDescriptor>,
    /// Last descriptor the delegate was told about. Survives invalidation.
    last_notified: Option<FormatDescriptor>,
}

impl FormatNegotiator {
    /// Creates a negotiator for the given destination.
    pub fn new(destination: DestinationFormat) -> Self {
        Self {
            destination,
            source: None,
            descriptor: None,
            last_notified: None,
        }
    }

    /// The negotiated source format, if any.
    pub fn source(&self) -> Option<SourceFormat> {
        self.source
    }

    /// The destination format.
    pub fn destination(&self) -> DestinationFormat {
        self.destination
    }

    /// Captures the source format from `input` unless one is already cached.
    pub fn negotiate(&mut self, input: &InputFormat) -> SourceFormat {
        if let Some(source) = self.source {
            return source;
        }
        let source = SourceFormat::from(input);
        tracing::info!(
            sample_rate = source.sample_rate,
            channels = source.channels,
            interleaved = source.interleaved,
            bytes_per_frame = source.bytes_per_frame,
            "negotiated source format"
        );
        self.source = Some(source);
        source
    }

    /// Returns the cached destination descriptor, building it on first use.
    ///
    /// `on_change` runs only when a freshly built descriptor differs by value
    /// from the last one notified.
    pub fn destination_descriptor(
        &mut self,
        on_change: impl FnOnce(&FormatDescriptor),
    ) -> FormatDescriptor {
        if let Some(descriptor) = self.descriptor {
            return descriptor;
        }
        let descriptor = FormatDescriptor::from(&self.destination);
        if self.last_notified != Some(descriptor) {
            on_change(&descriptor);
            self.last_notified = Some(descriptor);
        }
        self.descriptor = Some(descriptor);
        descriptor
    }

    /// Clears the source format and the cached descriptor.
    pub fn invalidate(&mut self) {
        self.source = None;
        self.descriptor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_input_wins() {
        let mut negotiator = FormatNegotiator::new(DestinationFormat::default());
        let first = negotiator.negotiate(&InputFormat::pcm_i16(16000, 1));
        let second = negotiator.negotiate(&InputFormat::pcm_f32(48000, 2));
        assert_eq!(first, second);
        assert_eq!(second.sample_rate, 16000);
        assert_eq!(second.bytes_per_frame, 2);
    }

    #[test]
    fn test_non_interleaved_buffer_count() {
        let input = InputFormat {
            interleaved: false,
            ..InputFormat::pcm_i16(44100, 2)
        };
        let source = SourceFormat::from(&input);
        assert_eq!(source.buffer_count(), 2);
        assert_eq!(source.bytes_per_frame, 2);
        assert_eq!(
            SourceFormat::from(&InputFormat::pcm_i16(44100, 2)).buffer_count(),
            1
        );
    }

    #[test]
    fn test_descriptor_notifies_once() {
        let mut negotiator = FormatNegotiator::new(DestinationFormat::default());
        let mut notifications = 0;
        for _ in 0..3 {
            negotiator.destination_descriptor(|_| notifications += 1);
        }
        assert_eq!(notifications, 1);
    }

    #[test]
    fn test_rebuilt_equal_descriptor_does_not_renotify() {
        let mut negotiator = FormatNegotiator::new(DestinationFormat::default());
        let mut notifications = 0;
        let before = negotiator.destination_descriptor(|_| notifications += 1);
        negotiator.invalidate();
        let after = negotiator.destination_descriptor(|_| notifications += 1);
        assert_eq!(before, after);
        assert_eq!(notifications, 1);
    }

    #[test]
    fn test_destination_ignores_source() {
        let mut negotiator = FormatNegotiator::new(DestinationFormat::default());
        negotiator.negotiate(&InputFormat::pcm_f32(48000, 2));
        let descriptor = negotiator.destination_descriptor(|_| {});
        assert_eq!(descriptor.encoding, AudioEncoding::MuLaw);
        assert_eq!(descriptor.sample_rate, 8000);
        assert_eq!(descriptor.channels, 1);
        assert_eq!(descriptor.frames_per_packet, 960);
        assert_eq!(descriptor.bytes_per_packet, 960);
    }

    #[test]
    fn test_invalidate_clears_source() {
        let mut negotiator = FormatNegotiator::new(DestinationFormat::default());
        negotiator.negotiate(&InputFormat::pcm_i16(16000, 1));
        negotiator.invalidate();
        assert!(negotiator.source().is_none());
        let fresh = negotiator.negotiate(&InputFormat::pcm_i16(48000, 2));
        assert_eq!(fresh.sample_rate, 48000);
    }
}
