//! Sample rate conversion.
//!
//! Linear interpolation, which is fast but may introduce artifacts for large
//! rate changes. Suitable for 8 kHz telephony-grade output.

/// Streaming mono resampler.
///
/// Keeps the fractional read position and the last input sample between
/// calls, so consecutive buffers are interpolated as one continuous signal.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    from_rate: u32,
    to_rate: u32,
    /// Read position for the next block, in source samples. May be in
    /// `(-1.0, 0.0)`, meaning between `history` and the block's first sample.
    position: f64,
    history: Option<i16>,
}

impl LinearResampler {
    /// Creates a resampler from `from_rate` to `to_rate` Hz.
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        Self {
            from_rate,
            to_rate,
            position: 0.0,
            history: None,
        }
    }

    /// Upper bound on the samples [`process`](Self::process) returns for a
    /// block of `input_len` samples, whatever phase is carried in.
    pub fn output_bound(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
        if from_rate == to_rate {
            return input_len;
        }
        if input_len == 0 || from_rate == 0 || to_rate == 0 {
            return 0;
        }
        let scaled = (input_len as u64 * u64::from(to_rate)).div_ceil(u64::from(from_rate));
        scaled as usize + 1
    }

    /// Returns `true` if input passes through unchanged.
    pub fn is_passthrough(&self) -> bool {
        self.from_rate == self.to_rate
    }

    /// Resamples one block of mono samples.
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        if self.is_passthrough() {
            return input.to_vec();
        }
        if input.is_empty() || self.from_rate == 0 || self.to_rate == 0 {
            return Vec::new();
        }

        let step = f64::from(self.from_rate) / f64::from(self.to_rate);
        let last_index = (input.len() - 1) as f64;
        let history = self.history.unwrap_or(input[0]);
        let sample_at = |i: isize| -> f64 {
            if i < 0 {
                f64::from(history)
            } else {
                f64::from(input[i as usize])
            }
        };

        let mut output = Vec::with_capacity((input.len() as f64 / step).ceil() as usize + 1);
        while self.position <= last_index {
            let idx = self.position.floor();
            let frac = self.position - idx;
            let s0 = sample_at(idx as isize);
            let sample = if frac == 0.0 {
                s0
            } else {
                let s1 = sample_at(idx as isize + 1);
                s0 + (s1 - s0) * frac
            };
            output.push(sample as i16);
            self.position += step;
        }

        self.position -= input.len() as f64;
        self.history = input.last().copied();
        output
    }
}
