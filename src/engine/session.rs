//! Lifetime of the conversion engine instance.

use std::sync::Arc;

use crate::engine::{CodecDescription, ConversionEngine, EngineFactory, FillStatus};
use crate::format::{DestinationFormat, SourceFormat};
use crate::pipeline::{InputSupplier, OutputStaging};
use crate::TranscodeError;

/// Owns at most one engine per negotiated source format.
///
/// The engine is built lazily on the first encode after negotiation and
/// lives until [`dispose`](Self::dispose). It is never replaced without an
/// explicit dispose first.
pub struct ConverterSession {
    factory: Arc<dyn EngineFactory>,
    engine: Option<Box<dyn ConversionEngine>>,
}

impl ConverterSession {
    /// Creates an empty session slot backed by `factory`.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            engine: None,
        }
    }

    /// Returns `true` if an engine is live.
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Name of the live engine's codec.
    pub fn codec_name(&self) -> Option<&str> {
        self.engine.as_ref().map(|e| e.codec().name.as_str())
    }

    /// Builds the engine if none is live.
    ///
    /// Tries each codec in `priority` order. Returns `Ok(true)` when a new
    /// engine was built and `Ok(false)` when one already existed.
    pub fn ensure_session(
        &mut self,
        source: &SourceFormat,
        destination: &DestinationFormat,
        priority: &[CodecDescription],
        bitrate: u32,
    ) -> Result<bool, TranscodeError> {
        if self.engine.is_some() {
            return Ok(false);
        }

        for codec in priority {
            match self.factory.create(codec, source, destination, bitrate) {
                Ok(engine) => {
                    tracing::info!(
                        codec = %codec.name,
                        kind = ?codec.kind,
                        source_rate = source.sample_rate,
                        source_channels = source.channels,
                        bitrate,
                        "conversion session created"
                    );
                    self.engine = Some(engine);
                    return Ok(true);
                }
                Err(e) => {
                    tracing::debug!(codec = %codec.name, error = %e, "codec candidate rejected");
                }
            }
        }

        Err(TranscodeError::NoCodecCandidates {
            tried: priority.len(),
        })
    }

    /// Sets the bitrate on the live engine. Returns `false` if there is none.
    pub fn set_bitrate(&mut self, bitrate: u32) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        match engine.set_bitrate(bitrate) {
            Ok(()) => {
                tracing::debug!(bitrate, "bitrate applied to live session");
                true
            }
            Err(e) => {
                tracing::warn!(bitrate, error = %e, "failed to apply bitrate to live session");
                false
            }
        }
    }

    /// Bitrate of the live engine.
    pub fn bitrate(&self) -> Option<u32> {
        self.engine.as_ref().map(|e| e.bitrate())
    }

    /// Maximum output packet size reported by the live engine.
    pub fn max_output_packet_size(&self) -> Result<usize, TranscodeError> {
        match &self.engine {
            Some(engine) => engine.max_output_packet_size(),
            None => Err(TranscodeError::PropertyQuery {
                property: "max_output_packet_size",
            }),
        }
    }

    /// Runs one fill cycle on the live engine.
    ///
    /// Returns `None` if no engine is live.
    pub fn fill(
        &mut self,
        supplier: &mut dyn InputSupplier,
        output: &mut OutputStaging,
    ) -> Option<FillStatus> {
        self.engine
            .as_mut()
            .map(|engine| engine.fill(supplier, output))
    }

    /// Releases the engine. Safe to call when none is live.
    pub fn dispose(&mut self) {
        if let Some(engine) = self.engine.take() {
            tracing::debug!(codec = %engine.codec().name, "conversion session disposed");
        }
    }
}

impl std::fmt::Debug for ConverterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterSession")
            .field("codec", &self.codec_name())
            .finish_non_exhaustive()
    }
}
