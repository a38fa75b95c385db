//! Configuration types and fixed constants for the encoder.

use crate::engine::{default_codec_priority, CodecDescription};
use crate::TranscodeError;

/// Destination sample rate in Hz. The only supported output rate.
pub const DESTINATION_SAMPLE_RATE: u32 = 8000;

/// Frames per destination packet.
pub const FRAMES_PER_PACKET: u32 = 960;

/// Maximum packet size accepted by the transport, in bytes.
///
/// Also used as the output staging size when the engine cannot report its
/// maximum output packet size.
pub const MAX_PACKET_SIZE: usize = 64 * 1024;

/// Default bitrate in bits per second (8 bits × 8 kHz).
pub const DEFAULT_BITRATE: u32 = 64_000;

/// Default destination channel count.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Encoder profile hint.
///
/// Recorded in [`Settings`](crate::Settings) but not reconciled into a live
/// or next session; mu-law has a single profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Plain G.711 mu-law.
    #[default]
    Standard,
    /// Low-latency hint for the transport.
    LowLatency,
}

/// Configuration for an encoder instance.
///
/// Use [`EncoderConfig::default()`] for the fixed mu-law profile, or adjust
/// the codec priority list for a custom [`EngineFactory`](crate::EngineFactory).
///
/// # Example
///
/// ```
/// use stream_mulaw::EncoderConfig;
///
/// let config = EncoderConfig {
///     default_bitrate: 48_000,
///     ..Default::default()
/// };
/// assert_eq!(config.destination_sample_rate, 8000);
/// ```
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Destination sample rate in Hz.
    ///
    /// Default: 8000
    pub destination_sample_rate: u32,

    /// Frames per destination packet.
    ///
    /// Default: 960
    pub frames_per_packet: u32,

    /// Maximum transport packet size in bytes, also the output staging
    /// fallback size.
    ///
    /// Default: 64 KiB
    pub max_packet_size: usize,

    /// Initial bitrate in bits per second.
    ///
    /// Default: 64000
    pub default_bitrate: u32,

    /// Initial destination channel count hint.
    ///
    /// Default: 1
    pub default_channels: u16,

    /// Ordered list of engine implementations to try when building a session.
    ///
    /// Default: hardware mu-law, then software mu-law.
    pub codec_priority: Vec<CodecDescription>,
}

impl EncoderConfig {
    /// Checks that the destination profile is the supported one.
    pub(crate) fn validate(&self) -> Result<(), TranscodeError> {
        if self.destination_sample_rate != DESTINATION_SAMPLE_RATE {
            return Err(TranscodeError::invalid_config(format!(
                "destination sample rate must be {DESTINATION_SAMPLE_RATE}Hz, got {}",
                self.destination_sample_rate
            )));
        }
        if self.frames_per_packet == 0 {
            return Err(TranscodeError::invalid_config(
                "frames_per_packet must be non-zero",
            ));
        }
        if self.max_packet_size == 0 {
            return Err(TranscodeError::invalid_config(
                "max_packet_size must be non-zero",
            ));
        }
        if self.codec_priority.is_empty() {
            return Err(TranscodeError::invalid_config(
                "codec priority list is empty",
            ));
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            destination_sample_rate: DESTINATION_SAMPLE_RATE,
            frames_per_packet: FRAMES_PER_PACKET,
            max_packet_size: MAX_PACKET_SIZE,
            default_bitrate: DEFAULT_BITRATE,
            default_channels: DEFAULT_CHANNELS,
            codec_priority: default_codec_priority(),
        }
    }
}
