//! Conversion engine abstraction.
//!
//! A [`ConversionEngine`] is a stateful, pull-based converter: the driver
//! hands it an [`InputSupplier`] and an [`OutputStaging`] buffer, and the
//! engine pulls input until the output is full or the supplier reports
//! exhaustion.
//!
//! Engines are built by an [`EngineFactory`] from an ordered codec priority
//! list. The crate ships [`SoftwareEngineFactory`], which provides the
//! software mu-law engine and reports hardware codecs as unavailable.

mod mulaw;
mod session;

pub use mulaw::MuLawEngine;
pub use session::ConverterSession;

use crate::format::{AudioEncoding, DestinationFormat, SourceFormat};
use crate::pipeline::{InputSupplier, OutputStaging};
use crate::TranscodeError;

/// Status returned from a fill cycle or a supplier pull.
///
/// Negative values are failures. Zero is success. Positive values are
/// informational, such as [`FillStatus::INPUT_EXHAUSTED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillStatus(pub i32);

impl FillStatus {
    /// No error.
    pub const OK: Self = Self(0);
    /// The supplier has nothing more to give in this fill cycle.
    pub const INPUT_EXHAUSTED: Self = Self(1);
    /// The supplied buffers don't match the negotiated source layout.
    pub const FORMAT_MISMATCH: Self = Self(-2);
    /// The output staging buffer cannot hold a single frame.
    pub const OUTPUT_TOO_SMALL: Self = Self(-3);

    /// Returns the raw status code.
    pub fn code(self) -> i32 {
        self.0
    }

    /// Returns `true` for any non-negative status.
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }
}

/// Whether a codec runs on dedicated hardware or in software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// Platform hardware codec.
    Hardware,
    /// Software codec.
    Software,
}

/// One entry in the codec priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescription {
    /// Human-readable name for logs.
    pub name: String,
    /// Hardware or software.
    pub kind: CodecKind,
    /// Encoding the codec produces.
    pub encoding: AudioEncoding,
}

impl CodecDescription {
    /// Hardware mu-law codec.
    pub fn hardware_mulaw() -> Self {
        Self {
            name: "mulaw-hardware".to_string(),
            kind: CodecKind::Hardware,
            encoding: AudioEncoding::MuLaw,
        }
    }

    /// Software mu-law codec.
    pub fn software_mulaw() -> Self {
        Self {
            name: "mulaw-software".to_string(),
            kind: CodecKind::Software,
            encoding: AudioEncoding::MuLaw,
        }
    }
}

/// Hardware first, then software.
pub fn default_codec_priority() -> Vec<CodecDescription> {
    vec![
        CodecDescription::hardware_mulaw(),
        CodecDescription::software_mulaw(),
    ]
}

/// A live conversion engine instance.
///
/// # Implementation Notes
///
/// - `fill` must stop pulling once the supplier returns zero packets
/// - Every pulled input is encoded whole into the same `output`; if it
///   doesn't fit, return [`FillStatus::OUTPUT_TOO_SMALL`] rather than
///   carrying bytes into the next fill
/// - Property mutation (`set_bitrate`) applies in place without rebuilding
pub trait ConversionEngine: Send {
    /// The codec this engine was built from.
    fn codec(&self) -> &CodecDescription;

    /// Maximum number of bytes one output packet can occupy.
    fn max_output_packet_size(&self) -> Result<usize, TranscodeError>;

    /// Current bitrate property in bits per second.
    fn bitrate(&self) -> u32;

    /// Updates the bitrate property of the live engine.
    fn set_bitrate(&mut self, bitrate: u32) -> Result<(), TranscodeError>;

    /// Runs one fill cycle, pulling input from `supplier` into `output`.
    fn fill(&mut self, supplier: &mut dyn InputSupplier, output: &mut OutputStaging)
        -> FillStatus;
}

/// Builds conversion engines from codec descriptions.
pub trait EngineFactory: Send + Sync {
    /// Creates an engine for `codec`, or explains why it is unavailable.
    fn create(
        &self,
        codec: &CodecDescription,
        source: &SourceFormat,
        destination: &DestinationFormat,
        bitrate: u32,
    ) -> Result<Box<dyn ConversionEngine>, TranscodeError>;
}

/// Factory for the bundled software mu-law engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareEngineFactory;

impl EngineFactory for SoftwareEngineFactory {
    fn create(
        &self,
        codec: &CodecDescription,
        source: &SourceFormat,
        destination: &DestinationFormat,
        bitrate: u32,
    ) -> Result<Box<dyn ConversionEngine>, TranscodeError> {
        match codec.kind {
            CodecKind::Hardware => Err(TranscodeError::codec_unavailable(
                &codec.name,
                "no hardware mu-law encoder on this platform",
            )),
            CodecKind::Software => {
                let engine = MuLawEngine::new(codec.clone(), *source, *destination, bitrate)?;
                Ok(Box::new(engine))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::InputFormat;

    #[test]
    fn test_fill_status_success_is_non_negative() {
        assert!(FillStatus::OK.is_success());
        assert!(FillStatus::INPUT_EXHAUSTED.is_success());
        assert!(!FillStatus::FORMAT_MISMATCH.is_success());
        assert!(!FillStatus(-50).is_success());
    }

    #[test]
    fn test_default_priority_prefers_hardware() {
        let priority = default_codec_priority();
        assert_eq!(priority[0].kind, CodecKind::Hardware);
        assert_eq!(priority[1].kind, CodecKind::Software);
    }

    #[test]
    fn test_software_factory() {
        let factory = SoftwareEngineFactory;
        let source = SourceFormat::from(&InputFormat::pcm_i16(16000, 1));
        let destination = DestinationFormat::default();

        let hw = factory.create(&CodecDescription::hardware_mulaw(), &source, &destination, 64_000);
        assert!(matches!(hw, Err(TranscodeError::CodecUnavailable { .. })));

        let sw = factory
            .create(&CodecDescription::software_mulaw(), &source, &destination, 64_000)
            .unwrap();
        assert_eq!(sw.codec().kind, CodecKind::Software);
        assert_eq!(sw.bitrate(), 64_000);
    }
}
