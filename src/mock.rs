//! Mock PCM source for testing without a capture device.

use std::time::Duration;

use crate::sample::{frames_to_duration, SampleBuffer};

/// Produces synthetic [`SampleBuffer`]s with advancing presentation
/// timestamps.
///
/// This allows driving the encoder end to end without real capture,
/// making it suitable for CI environments.
///
/// # Example
///
/// ```
/// use stream_mulaw::MockSource;
///
/// let mut mock = MockSource::transcription();
///
/// // 20ms of silence, then 20ms of a 440Hz tone
/// let silence = mock.silence(20);
/// let tone = mock.sine(440.0, 20);
///
/// assert_eq!(silence.frame_count(), 320);
/// assert!(tone.timing.presentation_timestamp > silence.timing.presentation_timestamp);
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    sample_rate: u32,
    channels: u16,
    frames_emitted: u64,
    phase: f64,
    seed: u32,
}

impl MockSource {
    /// Creates a new mock source with the given format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            frames_emitted: 0,
            phase: 0.0,
            seed: 12345,
        }
    }

    /// Creates a mock source configured for speech capture (16kHz mono).
    pub fn transcription() -> Self {
        Self::new(16000, 1)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Presentation timestamp of the next buffer.
    pub fn position(&self) -> Duration {
        frames_to_duration(self.frames_emitted, self.sample_rate)
    }

    /// A buffer of silence.
    pub fn silence(&mut self, duration_ms: u64) -> SampleBuffer {
        let frames = self.frames_for_duration(duration_ms);
        let samples = vec![0i16; frames * self.channels as usize];
        self.emit(&samples, frames)
    }

    /// A buffer holding a sine wave. Phase carries across calls.
    pub fn sine(&mut self, frequency: f64, duration_ms: u64) -> SampleBuffer {
        let frames = self.frames_for_duration(duration_ms);
        let step = 2.0 * std::f64::consts::PI * frequency / f64::from(self.sample_rate);
        let mut samples = Vec::with_capacity(frames * self.channels as usize);

        for _ in 0..frames {
            let sample = (self.phase.sin() * 32767.0) as i16;
            self.phase = (self.phase + step) % (2.0 * std::f64::consts::PI);

            // Same sample on every channel
            for _ in 0..self.channels {
                samples.push(sample);
            }
        }
        self.emit(&samples, frames)
    }

    /// A buffer of white noise scaled by `amplitude` (0.0 to 1.0).
    pub fn noise(&mut self, duration_ms: u64, amplitude: f64) -> SampleBuffer {
        let frames = self.frames_for_duration(duration_ms);
        let amplitude = (amplitude.clamp(0.0, 1.0) * 32767.0) as i16;
        let mut samples = Vec::with_capacity(frames * self.channels as usize);

        // Simple LCG for deterministic "random" noise
        for _ in 0..frames * self.channels as usize {
            self.seed = self.seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let random = ((self.seed >> 16) as i32 - 32768) as i16;
            samples.push((i32::from(random) * i32::from(amplitude) / 32767) as i16);
        }
        self.emit(&samples, frames)
    }

    fn emit(&mut self, samples: &[i16], frames: usize) -> SampleBuffer {
        let buffer = SampleBuffer::from_i16(samples, self.sample_rate, self.channels, self.position());
        self.frames_emitted += frames as u64;
        buffer
    }

    fn frames_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::BufferList;

    #[test]
    fn test_mock_source_silence() {
        let mut mock = MockSource::transcription();
        let buffer = mock.silence(100);

        assert_eq!(buffer.frame_count(), 1600);
        let data = buffer.data.unwrap();
        assert!(data.buffers[0].data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mock_source_sine() {
        let mut mock = MockSource::transcription();
        let buffer = mock.sine(440.0, 100);

        let bytes = &buffer.data.unwrap().buffers[0].data;
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples.len(), 1600);
        assert!(samples.iter().any(|&s| s > 0));
        assert!(samples.iter().any(|&s| s < 0));
    }

    #[test]
    fn test_mock_source_stereo() {
        let mut mock = MockSource::new(48000, 2);
        let buffer = mock.silence(100);
        assert_eq!(buffer.data.as_ref().map(BufferList::byte_len), Some(19200));
        assert_eq!(buffer.frame_count(), 4800);
    }

    #[test]
    fn test_timestamps_advance() {
        let mut mock = MockSource::transcription();
        let first = mock.silence(20);
        let second = mock.noise(20, 0.5);

        assert_eq!(first.timing.presentation_timestamp, Duration::ZERO);
        assert_eq!(second.timing.presentation_timestamp, Duration::from_millis(20));
        assert_eq!(mock.position(), Duration::from_millis(40));
    }
}
