//! Software mu-law conversion engine.

use crate::engine::{CodecDescription, ConversionEngine, FillStatus};
use crate::format::{
    decode_pcm, downmix_to_mono, encode_mulaw, AudioEncoding, DestinationFormat,
    LinearResampler, SourceFormat,
};
use crate::pipeline::{InputSupplier, OutputStaging, StagedInput};
use crate::TranscodeError;

/// Converts PCM in the negotiated source format to 8 kHz mono mu-law.
///
/// Each pulled input is decoded, downmixed, resampled, and encoded whole into
/// the output of the same fill. An input that doesn't fit fails the fill with
/// [`FillStatus::OUTPUT_TOO_SMALL`]; nothing carries into the next fill.
pub struct MuLawEngine {
    codec: CodecDescription,
    source: SourceFormat,
    destination: DestinationFormat,
    resampler: LinearResampler,
    bitrate: u32,
}

impl MuLawEngine {
    /// Creates an engine for the given formats.
    pub fn new(
        codec: CodecDescription,
        source: SourceFormat,
        destination: DestinationFormat,
        bitrate: u32,
    ) -> Result<Self, TranscodeError> {
        if source.sample_rate == 0 || source.channels == 0 {
            return Err(TranscodeError::unsupported_format(format!(
                "{}Hz/{}ch",
                source.sample_rate, source.channels
            )));
        }
        if destination.encoding != AudioEncoding::MuLaw || destination.channels != 1 {
            return Err(TranscodeError::codec_unavailable(
                &codec.name,
                "destination must be mono mu-law",
            ));
        }

        Ok(Self {
            codec,
            source,
            destination,
            resampler: LinearResampler::new(source.sample_rate, destination.sample_rate),
            bitrate,
        })
    }

    fn convert(&mut self, input: &StagedInput) -> Result<Vec<u8>, FillStatus> {
        let buffers = input.buffers();
        if buffers.len() != self.source.buffer_count() {
            tracing::debug!(
                expected = self.source.buffer_count(),
                got = buffers.len(),
                "staged buffer count does not match source layout"
            );
            return Err(FillStatus::FORMAT_MISMATCH);
        }

        let format = self.source.sample_format;
        let mono = if self.source.interleaved {
            let samples = decode_pcm(&buffers[0].data, format);
            downmix_to_mono(&samples, self.source.channels)
        } else {
            let planes: Vec<Vec<i16>> = buffers
                .iter()
                .map(|b| decode_pcm(&b.data, format))
                .collect();
            let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
            let channels = planes.len() as i32;
            (0..frames)
                .map(|i| {
                    let sum: i32 = planes.iter().map(|p| i32::from(p[i])).sum();
                    (sum / channels) as i16
                })
                .collect()
        };

        Ok(encode_mulaw(&self.resampler.process(&mono)))
    }
}

impl ConversionEngine for MuLawEngine {
    fn codec(&self) -> &CodecDescription {
        &self.codec
    }

    fn max_output_packet_size(&self) -> Result<usize, TranscodeError> {
        Ok(self.destination.bytes_per_packet())
    }

    fn bitrate(&self) -> u32 {
        self.bitrate
    }

    fn set_bitrate(&mut self, bitrate: u32) -> Result<(), TranscodeError> {
        // G.711 is constant-rate; the property is tracked for the transport.
        self.bitrate = bitrate;
        Ok(())
    }

    fn fill(
        &mut self,
        supplier: &mut dyn InputSupplier,
        output: &mut OutputStaging,
    ) -> FillStatus {
        let bytes_per_packet = self.destination.bytes_per_packet();
        if output.capacity() < self.destination.bytes_per_frame as usize {
            return FillStatus::OUTPUT_TOO_SMALL;
        }

        let status = loop {
            if output.is_full() {
                break FillStatus::OK;
            }

            let supply = supplier.supply(output.requested_packets(bytes_per_packet));
            if !supply.status.is_success() {
                break supply.status;
            }
            let Some(input) = supply.data.filter(|_| supply.packets > 0) else {
                break supply.status;
            };

            let encoded = match self.convert(&input) {
                Ok(encoded) => encoded,
                Err(status) => break status,
            };
            if encoded.len() > output.remaining() {
                tracing::warn!(
                    encoded = encoded.len(),
                    remaining = output.remaining(),
                    "encoded input does not fit output buffer"
                );
                break FillStatus::OUTPUT_TOO_SMALL;
            }
            output.write(&encoded);
        };

        if bytes_per_packet > 0 {
            output.set_packets(output.len().div_ceil(bytes_per_packet) as u32);
        }
        status
    }
}
