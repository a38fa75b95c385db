//! Audio format handling.
//!
//! This module provides:
//! - Sample decoding and channel downmix (PCM bytes → mono i16)
//! - Sample rate conversion (streaming linear resampler)
//! - G.711 mu-law companding
//! - Source/destination format negotiation and the format descriptor

mod convert;
mod mulaw;
mod negotiate;
mod resample;

pub use convert::{decode_pcm, downmix_to_mono, f32_to_i16};
pub use mulaw::{decode_mulaw, encode_mulaw, linear_to_mulaw, mulaw_to_linear, MULAW_SILENCE};
pub use negotiate::{
    AudioEncoding, DestinationFormat, FormatDescriptor, FormatNegotiator, SourceFormat,
};
pub use resample::LinearResampler;
