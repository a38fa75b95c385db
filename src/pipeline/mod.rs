//! Encode pipeline components.
//!
//! Each encode call runs synchronously on the caller's thread:
//!
//! ```text
//! SampleBuffer → Negotiate → Stage → Fill (pull) → Output Staging → Delegate
//! ```
//!
//! - **Staging**: Scoped input and output buffers released on every exit path
//! - **Supplier**: Answers the engine's pull requests with the staged input once
//! - **Driver**: Runs the per-buffer cycle against the shared encoder state
//! - **Worker**: Applies lifecycle and settings commands in send order
//!
//! Encode calls and control commands lock the same driver, so a command is
//! never applied halfway through a fill.

mod driver;
mod staging;
mod supplier;
mod worker;

pub(crate) use driver::EncodeDriver;
pub use staging::{OutputStaging, StagedInput};
pub(crate) use supplier::StagedSupplier;
pub use supplier::{InputSupplier, Supply};
pub(crate) use worker::{ControlWorker, EncoderCommand};
