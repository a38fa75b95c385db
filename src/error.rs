//! Error types for stream-mulaw.
//!
//! Errors are split into two categories:
//! - **Construction errors** ([`TranscodeError`] from the builder): prevent an
//!   encoder from being created
//! - **Recoverable conditions**: engine warnings and dropped frames inside
//!   `encode`, which are logged and surfaced via [`EventCallback`](crate::EventCallback)
//!   but never returned to the caller

/// Errors produced by the encoder, its conversion engine, or its builder.
///
/// Only the builder returns these to the caller. Inside an encode call they
/// are logged and degrade to "no output for this buffer".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    /// The engine factory cannot build the requested codec.
    #[error("codec unavailable: {codec} - {reason}")]
    CodecUnavailable {
        /// Name of the codec description that failed.
        codec: String,
        /// Why the codec could not be built.
        reason: String,
    },

    /// No codec candidate in the priority list could be constructed.
    #[error("no usable codec in priority list (tried {tried})")]
    NoCodecCandidates {
        /// Number of candidates attempted.
        tried: usize,
    },

    /// Querying an engine property failed.
    #[error("engine property query failed: {property}")]
    PropertyQuery {
        /// Name of the property being queried.
        property: &'static str,
    },

    /// The negotiated source format cannot be converted.
    #[error("unsupported source format: {reason}")]
    UnsupportedSourceFormat {
        /// Description of the unsupported aspect.
        reason: String,
    },

    /// The encoder configuration is invalid.
    #[error("invalid encoder config: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The control worker has shut down and can no longer accept commands.
    #[error("encoder worker closed")]
    WorkerClosed,

    /// The builder was used outside a tokio runtime.
    #[error("no tokio runtime available to run the encoder worker")]
    NoRuntime,
}

impl TranscodeError {
    /// Creates a codec unavailable error.
    pub fn codec_unavailable(codec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CodecUnavailable {
            codec: codec.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported source format error.
    pub fn unsupported_format(reason: impl Into<String>) -> Self {
        Self::UnsupportedSourceFormat {
            reason: reason.into(),
        }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
