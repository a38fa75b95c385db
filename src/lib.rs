//! # stream-mulaw
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Streaming PCM to 8kHz mono G.711 mu-law encoding for telephony transports.
//!
//! `stream-mulaw` accepts arbitrary PCM sample buffers, negotiates the source
//! format from the first buffer it sees, and hands encoded mu-law buffers with
//! their original timestamps to a delegate you own.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stream_mulaw::{AudioEncoder, ChannelDelegate, EncoderOutput, MockSource};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! // User channel capacity: size based on your transport's send speed
//! let (tx, mut rx) = mpsc::channel::<EncoderOutput>(64);
//! let delegate = Arc::new(ChannelDelegate::new(tx));
//!
//! let encoder = AudioEncoder::builder()
//!     .delegate(&delegate)
//!     .on_event(|e| tracing::warn!(?e, "encoder event"))
//!     .build()?;
//!
//! encoder.start();
//! encoder.sync().await?;
//!
//! let mut mic = MockSource::transcription();
//! encoder.encode(mic.sine(440.0, 20));
//!
//! while let Some(output) = rx.recv().await {
//!     // Packetize and send over RTP, WebSocket, etc.
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate keeps encoding on the caller's thread:
//!
//! - **Caller Thread**: `encode` negotiates, stages, converts, and delivers
//!   synchronously under the encoder's state lock
//! - **Control Task**: Lifecycle and settings commands are queued and applied
//!   in order by a tokio task holding the same lock
//! - **Delegate**: Receives the format descriptor once, then every encoded
//!   buffer; a [`ChannelDelegate`] forwards both into a tokio channel
//!
//! Input staging and output buffers are scoped to a single encode call and
//! released on every exit path.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
mod delegate;
mod encoder;
pub mod engine;
mod error;
mod event;
pub mod format;
mod lifecycle;
mod mock;
mod pipeline;
mod sample;
mod settings;
mod stats;

pub use builder::AudioEncoderBuilder;
pub use config::{
    EncoderConfig, Profile, DEFAULT_BITRATE, DEFAULT_CHANNELS, DESTINATION_SAMPLE_RATE,
    FRAMES_PER_PACKET, MAX_PACKET_SIZE,
};
pub use delegate::{ChannelDelegate, EncoderDelegate, EncoderOutput};
pub use encoder::AudioEncoder;
pub use engine::{
    CodecDescription, CodecKind, ConversionEngine, EngineFactory, FillStatus,
    SoftwareEngineFactory,
};
pub use error::TranscodeError;
pub use event::{event_callback, DropReason, EncoderEvent, EventCallback};
pub use format::{DestinationFormat, FormatDescriptor, SourceFormat};
pub use lifecycle::LifecycleState;
pub use mock::MockSource;
pub use pipeline::{InputSupplier, OutputStaging, StagedInput, Supply};
pub use sample::{
    frames_to_duration, BufferList, ChannelBuffer, EncodedSampleBuffer, InputFormat,
    SampleBuffer, SampleFormat, SampleTiming,
};
pub use settings::{reconcile, LiveAction, Settings, SettingsUpdate};
pub use stats::EncoderStats;
