//! Codec selection.
//!
//! Which codecs exist is decided at compile time by cargo features
//! (`segment-codec`, `raster-codec`). At startup [`probe_codec`] picks one
//! according to the configured [`CodecPreference`]. An explicit preference
//! for a codec that was not compiled in falls back to whatever is available
//! rather than disabling stripping altogether.

use super::codec::ImageCodec;
use crate::config::CodecPreference;

/// Names of the codecs compiled into this binary, in `auto` priority order.
pub fn available_codecs() -> Vec<&'static str> {
    let mut codecs = Vec::new();
    if cfg!(feature = "segment-codec") {
        codecs.push("segment");
    }
    if cfg!(feature = "raster-codec") {
        codecs.push("raster");
    }
    codecs
}

#[cfg(feature = "segment-codec")]
fn segment() -> Option<Box<dyn ImageCodec>> {
    Some(Box::new(super::segment::SegmentCodec::new()))
}

#[cfg(not(feature = "segment-codec"))]
fn segment() -> Option<Box<dyn ImageCodec>> {
    None
}

#[cfg(feature = "raster-codec")]
fn raster() -> Option<Box<dyn ImageCodec>> {
    Some(Box::new(super::raster::RasterCodec::new()))
}

#[cfg(not(feature = "raster-codec"))]
fn raster() -> Option<Box<dyn ImageCodec>> {
    None
}

/// Pick a codec. `None` means no codec is compiled in: uploads pass through
/// unmodified and the standing "no codec" notice applies.
pub fn probe_codec(preference: CodecPreference) -> Option<Box<dyn ImageCodec>> {
    let codec = match preference {
        CodecPreference::Auto | CodecPreference::Segment => segment().or_else(raster),
        CodecPreference::Raster => raster().or_else(segment),
    };
    match &codec {
        Some(c) => tracing::debug!(codec = c.name(), ?preference, "selected image codec"),
        None => tracing::debug!(?preference, "no image codec available"),
    }
    codec
}
