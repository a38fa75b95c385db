//! The pull side of a fill cycle.

use crate::engine::FillStatus;
use crate::pipeline::StagedInput;

/// Result of one pull.
#[derive(Debug)]
pub struct Supply {
    /// Packets actually supplied.
    pub packets: u32,
    /// Supplier status. Nonzero together with zero packets ends the cycle.
    pub status: FillStatus,
    /// The supplied input, transferred to the engine.
    pub data: Option<StagedInput>,
}

impl Supply {
    /// Zero packets with [`FillStatus::INPUT_EXHAUSTED`].
    pub fn exhausted() -> Self {
        Self {
            packets: 0,
            status: FillStatus::INPUT_EXHAUSTED,
            data: None,
        }
    }
}

/// Supplies input to a conversion engine on request.
pub trait InputSupplier {
    /// Called by the engine when it needs up to `requested_packets` of input.
    fn supply(&mut self, requested_packets: u32) -> Supply;
}

/// Hands over one staged input on the first pull, then reports exhaustion.
///
/// The whole staged buffer counts as a single packet regardless of how many
/// packets the engine asks for.
#[derive(Debug)]
pub(crate) struct StagedSupplier {
    staged: Option<StagedInput>,
    pulls: u32,
}

impl StagedSupplier {
    /// Wraps a staged input for one fill cycle.
    pub fn new(staged: StagedInput) -> Self {
        Self {
            staged: Some(staged),
            pulls: 0,
        }
    }

    /// Number of pulls answered so far.
    pub fn pulls(&self) -> u32 {
        self.pulls
    }

    /// Returns `true` once the staged input has been handed over.
    pub fn is_consumed(&self) -> bool {
        self.staged.is_none()
    }
}

impl InputSupplier for StagedSupplier {
    fn supply(&mut self, requested_packets: u32) -> Supply {
        self.pulls += 1;
        match self.staged.take() {
            Some(input) => {
                tracing::trace!(
                    requested_packets,
                    bytes = input.byte_len(),
                    "supplying staged input"
                );
                Supply {
                    packets: 1,
                    status: FillStatus::OK,
                    data: Some(input),
                }
            }
            None => Supply::exhausted(),
        }
    }
}
