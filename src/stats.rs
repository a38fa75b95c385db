//! Encoder statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of encoder counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderStats {
    /// Input buffers that produced an encoded output.
    pub buffers_encoded: u64,
    /// Input buffers dropped without output.
    pub frames_dropped: u64,
    /// Source format negotiations performed.
    pub negotiations: u64,
    /// Conversion sessions constructed.
    pub sessions_created: u64,
    /// Times the output size query failed and the fallback was used.
    pub output_size_fallbacks: u64,
    /// Staged inputs allocated.
    pub staged_allocated: u64,
    /// Staged inputs released.
    pub staged_released: u64,
    /// Output staging buffers allocated.
    pub output_allocated: u64,
    /// Output staging buffers released.
    pub output_released: u64,
}

impl EncoderStats {
    /// Staged inputs currently alive.
    pub fn staged_live(&self) -> u64 {
        self.staged_allocated - self.staged_released
    }

    /// Output staging buffers currently alive.
    pub fn output_live(&self) -> u64 {
        self.output_allocated - self.output_released
    }
}

/// Counters shared between the encoder handle, the driver, and staging guards.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub buffers_encoded: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub negotiations: AtomicU64,
    pub sessions_created: AtomicU64,
    pub output_size_fallbacks: AtomicU64,
    pub staged_allocated: AtomicU64,
    pub staged_released: AtomicU64,
    pub output_allocated: AtomicU64,
    pub output_released: AtomicU64,
}

impl StatsCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> EncoderStats {
        EncoderStats {
            buffers_encoded: self.buffers_encoded.load(Ordering::SeqCst),
            frames_dropped: self.frames_dropped.load(Ordering::SeqCst),
            negotiations: self.negotiations.load(Ordering::SeqCst),
            sessions_created: self.sessions_created.load(Ordering::SeqCst),
            output_size_fallbacks: self.output_size_fallbacks.load(Ordering::SeqCst),
            staged_allocated: self.staged_allocated.load(Ordering::SeqCst),
            staged_released: self.staged_released.load(Ordering::SeqCst),
            output_allocated: self.output_allocated.load(Ordering::SeqCst),
            output_released: self.output_released.load(Ordering::SeqCst),
        }
    }
}
