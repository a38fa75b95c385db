//! Sample decoding and channel conversion.

use crate::sample::SampleFormat;

/// Converts an f32 sample to i16.
///
/// Input should be in the range [-1.0, 1.0].
/// Values outside this range are clamped.
///
/// Uses × 32767 (not 32768) for symmetric scaling, so -1.0 maps to -32767.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Decodes little-endian PCM bytes into i16 samples.
///
/// A trailing partial sample is ignored.
pub fn decode_pcm(bytes: &[u8], format: SampleFormat) -> Vec<i16> {
    match format {
        SampleFormat::I16 => bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect(),
        SampleFormat::F32 => bytes
            .chunks_exact(4)
            .map(|b| f32_to_i16(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            .collect(),
    }
}

/// Downmixes interleaved samples to mono by averaging each frame.
///
/// A trailing partial frame is ignored. With one channel the input is
/// returned unchanged.
pub fn downmix_to_mono(interleaved: &[i16], channels: u16) -> Vec<i16> {
    match channels {
        0 => Vec::new(),
        1 => interleaved.to_vec(),
        n => interleaved
            .chunks_exact(n as usize)
            .map(|frame| {
                // Sum in i32 to avoid overflow
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / i32::from(n)) as i16
            })
            .collect(),
    }
}
