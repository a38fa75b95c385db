//! Timed sample buffers flowing into and out of the encoder.

use std::sync::Arc;
use std::time::Duration;

use crate::format::FormatDescriptor;

/// PCM sample encoding of an input buffer. Always little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit integer samples.
    I16,
    /// 32-bit float samples in `[-1.0, 1.0]`.
    F32,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Format embedded in an input sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Sample encoding.
    pub sample_format: SampleFormat,
    /// `true` when all channels share one buffer.
    pub interleaved: bool,
}

impl InputFormat {
    /// Interleaved signed 16-bit PCM.
    pub fn pcm_i16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format: SampleFormat::I16,
            interleaved: true,
        }
    }

    /// Interleaved 32-bit float PCM.
    pub fn pcm_f32(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format: SampleFormat::F32,
            interleaved: true,
        }
    }

    /// Bytes per frame in a single buffer of this layout.
    ///
    /// For non-interleaved input each buffer holds one channel, so a frame
    /// is a single sample.
    pub fn bytes_per_frame(&self) -> usize {
        if self.interleaved {
            self.sample_format.bytes_per_sample() * self.channels as usize
        } else {
            self.sample_format.bytes_per_sample()
        }
    }
}

/// One contiguous buffer of raw audio bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffer {
    /// Channels interleaved in this buffer (1 for non-interleaved layouts).
    pub channels: u16,
    /// Raw little-endian sample bytes.
    pub data: Vec<u8>,
}

/// The raw buffers of one sample buffer: a single interleaved buffer, or one
/// buffer per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferList {
    /// The buffers, in channel order.
    pub buffers: Vec<ChannelBuffer>,
}

impl BufferList {
    /// Creates a list holding one interleaved buffer.
    pub fn interleaved(channels: u16, data: Vec<u8>) -> Self {
        Self {
            buffers: vec![ChannelBuffer { channels, data }],
        }
    }

    /// Total bytes across all buffers.
    pub fn byte_len(&self) -> usize {
        self.buffers.iter().map(|b| b.data.len()).sum()
    }

    /// Returns `true` if no buffer carries any bytes.
    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Zero-fills every byte of every buffer in place.
    pub fn zero_fill(&mut self) {
        for buffer in &mut self.buffers {
            buffer.data.fill(0);
        }
    }
}

/// Duration of `frames` at `sample_rate`. Zero when the rate is zero.
pub fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = u128::from(frames) * 1_000_000_000 / u128::from(sample_rate);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Timing attached to a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleTiming {
    /// Presentation timestamp.
    pub presentation_timestamp: Duration,
    /// Duration of the buffer, if known.
    pub duration: Option<Duration>,
}

impl SampleTiming {
    /// Timing with a known duration.
    pub fn new(presentation_timestamp: Duration, duration: Duration) -> Self {
        Self {
            presentation_timestamp,
            duration: Some(duration),
        }
    }
}

/// A timed container of PCM audio handed to [`AudioEncoder::encode`].
///
/// Either field may be absent, as delivered by a capture source; buffers
/// without a format or without data are dropped by the encoder.
///
/// # Example
///
/// ```
/// use stream_mulaw::SampleBuffer;
/// use std::time::Duration;
///
/// let buffer = SampleBuffer::from_i16(&[0i16; 320], 16000, 1, Duration::ZERO);
/// assert_eq!(buffer.frame_count(), 320);
/// assert_eq!(buffer.timing.duration, Some(Duration::from_millis(20)));
/// ```
///
/// [`AudioEncoder::encode`]: crate::AudioEncoder::encode
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Embedded source format.
    pub format: Option<InputFormat>,
    /// Raw audio data.
    pub data: Option<BufferList>,
    /// Presentation timing.
    pub timing: SampleTiming,
}

impl SampleBuffer {
    /// Creates a buffer from interleaved 16-bit samples.
    pub fn from_i16(samples: &[i16], sample_rate: u32, channels: u16, pts: Duration) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let format = InputFormat::pcm_i16(sample_rate, channels);
        Self::with_duration(format, BufferList::interleaved(channels, data), samples.len(), pts)
    }

    /// Creates a buffer from interleaved 32-bit float samples.
    pub fn from_f32(samples: &[f32], sample_rate: u32, channels: u16, pts: Duration) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let format = InputFormat::pcm_f32(sample_rate, channels);
        Self::with_duration(format, BufferList::interleaved(channels, data), samples.len(), pts)
    }

    /// Creates a non-interleaved buffer with one 16-bit buffer per channel.
    pub fn planar_i16(planes: &[Vec<i16>], sample_rate: u32, pts: Duration) -> Self {
        let buffers: Vec<ChannelBuffer> = planes
            .iter()
            .map(|plane| ChannelBuffer {
                channels: 1,
                data: plane.iter().flat_map(|s| s.to_le_bytes()).collect(),
            })
            .collect();
        let format = InputFormat {
            sample_rate,
            channels: planes.len() as u16,
            sample_format: SampleFormat::I16,
            interleaved: false,
        };
        let total_samples = planes.iter().map(Vec::len).sum();
        Self::with_duration(format, BufferList { buffers }, total_samples, pts)
    }

    fn with_duration(
        format: InputFormat,
        data: BufferList,
        total_samples: usize,
        pts: Duration,
    ) -> Self {
        let frames = total_samples.checked_div(format.channels as usize).unwrap_or(0);
        let duration = frames_to_duration(frames as u64, format.sample_rate);
        Self {
            format: Some(format),
            data: Some(data),
            timing: SampleTiming::new(pts, duration),
        }
    }

    /// Number of frames in this buffer according to its embedded format.
    ///
    /// Returns 0 when the format or data is missing.
    pub fn frame_count(&self) -> usize {
        let (Some(format), Some(data)) = (&self.format, &self.data) else {
            return 0;
        };
        let bytes_per_frame = format.bytes_per_frame();
        if bytes_per_frame == 0 {
            return 0;
        }
        data.buffers
            .first()
            .map_or(0, |buffer| buffer.data.len() / bytes_per_frame)
    }
}

/// An encoded mu-law buffer handed to the delegate.
///
/// Encoded bytes are `Arc`-wrapped so the buffer can be cloned cheaply
/// when fanned out to several consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSampleBuffer {
    /// Descriptor of the encoded stream.
    pub descriptor: FormatDescriptor,
    /// Encoded mu-law bytes, one byte per frame.
    pub data: Arc<Vec<u8>>,
    /// Timing derived from the input presentation timestamp.
    pub timing: SampleTiming,
    /// Number of encoded frames.
    pub sample_count: usize,
}

impl EncodedSampleBuffer {
    /// Returns `true` if this buffer carries no encoded bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
