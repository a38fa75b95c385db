//! Per-call staging buffers with scoped release.
//!
//! Both staging types count their allocation on construction and their
//! release in `Drop`, so every exit path of an encode call (success, guard
//! return, failure) releases them exactly once.

use std::sync::Arc;

use crate::sample::{BufferList, ChannelBuffer};
use crate::stats::StatsCounters;

/// A single-use input buffer list for one pull.
///
/// Ownership moves from the driver into the supplier and from the supplier
/// into the engine, which drops it after reading.
#[derive(Debug)]
pub struct StagedInput {
    list: BufferList,
    counters: Arc<StatsCounters>,
}

impl StagedInput {
    pub(crate) fn stage(list: BufferList, counters: Arc<StatsCounters>) -> Self {
        StatsCounters::incr(&counters.staged_allocated);
        Self { list, counters }
    }

    /// The staged buffers, in channel order.
    pub fn buffers(&self) -> &[ChannelBuffer] {
        &self.list.buffers
    }

    /// Total staged bytes.
    pub fn byte_len(&self) -> usize {
        self.list.byte_len()
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        StatsCounters::incr(&self.counters.staged_released);
    }
}

/// Transient output buffer for one fill cycle.
#[derive(Debug)]
pub struct OutputStaging {
    data: Vec<u8>,
    capacity: usize,
    packets: u32,
    counters: Arc<StatsCounters>,
}

impl OutputStaging {
    pub(crate) fn allocate(capacity: usize, counters: Arc<StatsCounters>) -> Self {
        StatsCounters::incr(&counters.output_allocated);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            packets: 0,
            counters,
        }
    }

    /// Maximum number of bytes this buffer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Returns `true` if no more bytes fit.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Appends as much of `bytes` as fits and returns the count written.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.data.extend_from_slice(&bytes[..n]);
        n
    }

    /// Packets reported by the engine for the written bytes.
    pub fn packets(&self) -> u32 {
        self.packets
    }

    /// Records the number of packets the written bytes represent.
    pub fn set_packets(&mut self, packets: u32) {
        self.packets = packets;
    }

    /// Moves the written bytes out, leaving the buffer empty.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.packets = 0;
        std::mem::take(&mut self.data)
    }

    /// Output packets requested for the remaining space, rounding up.
    pub(crate) fn requested_packets(&self, bytes_per_packet: usize) -> u32 {
        if bytes_per_packet == 0 {
            return 0;
        }
        self.remaining().div_ceil(bytes_per_packet) as u32
    }
}

impl Drop for OutputStaging {
    fn drop(&mut self) {
        StatsCounters::incr(&self.counters.output_released);
    }
}
