//! G.711 mu-law companding.
//!
//! 14-bit magnitude with bias 0x84, eight segments, bits inverted on the
//! wire. See ITU-T G.711.

/// Bias added to the magnitude before segment search.
const BIAS: i32 = 0x84;

/// Largest magnitude that can be encoded without overflowing the top segment.
const CLIP: i32 = 32635;

/// Encoded value of a zero sample.
pub const MULAW_SILENCE: u8 = 0xFF;

/// Converts a linear 16-bit sample to mu-law.
#[inline]
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut magnitude = i32::from(sample);
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };
    magnitude = magnitude.min(CLIP) + BIAS;

    let mut exponent: i32 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && magnitude & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;

    !(sign | (exponent << 4) | mantissa) as u8
}

/// Converts a mu-law byte back to a linear 16-bit sample.
#[inline]
pub fn mulaw_to_linear(byte: u8) -> i16 {
    let byte = !byte;
    let exponent = i32::from((byte >> 4) & 0x07);
    let mantissa = i32::from(byte & 0x0F);
    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;

    if byte & 0x80 == 0 {
        magnitude as i16
    } else {
        -magnitude as i16
    }
}

/// Encodes a block of linear samples.
pub fn encode_mulaw(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&s| linear_to_mulaw(s)).collect()
}

/// Decodes a block of mu-law bytes.
pub fn decode_mulaw(bytes: &[u8]) -> Vec<i16> {
    bytes.iter().map(|&b| mulaw_to_linear(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_encodes_to_ff() {
        assert_eq!(linear_to_mulaw(0), MULAW_SILENCE);
        assert_eq!(mulaw_to_linear(MULAW_SILENCE), 0);
    }

    #[test]
    fn test_known_values() {
        // Reference values from the G.711 tables
        assert_eq!(linear_to_mulaw(i16::MAX), 0x80);
        assert_eq!(linear_to_mulaw(i16::MIN), 0x00);
        assert_eq!(mulaw_to_linear(0x80), 32124);
        assert_eq!(mulaw_to_linear(0x00), -32124);
    }

    #[test]
    fn test_sign_symmetry() {
        for &s in &[1i16, 100, 1000, 10000, 30000] {
            let pos = mulaw_to_linear(linear_to_mulaw(s));
            let neg = mulaw_to_linear(linear_to_mulaw(-s));
            assert_eq!(pos, -neg);
        }
    }

    #[test]
    fn test_quantization_error_is_bounded() {
        // Segment step doubles each segment; error stays within half a step
        for &s in &[50i16, 500, 5000, 20000, -20000] {
            let back = mulaw_to_linear(linear_to_mulaw(s));
            let err = (i32::from(s) - i32::from(back)).abs();
            assert!(err <= i32::from(s).abs() / 16 + 8, "{s} -> {back}");
        }
    }

    #[test]
    fn test_block_helpers() {
        let encoded = encode_mulaw(&[0, 0, 0]);
        assert_eq!(encoded, vec![MULAW_SILENCE; 3]);
        assert_eq!(decode_mulaw(&encoded), vec![0, 0, 0]);
    }
}
