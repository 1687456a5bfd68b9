//! Image codecs — the only code that touches image bytes.
//!
//! | Codec | Crate | Lossless | ICC | Orientation |
//! |---|---|---|---|---|
//! | [`SegmentCodec`] | `img-parts` + `kamadak-exif` | yes | yes | yes |
//! | [`RasterCodec`] | `image` | no (JPEG re-encode) | yes | no |
//!
//! The module is split into:
//! - **Codec**: [`ImageCodec`] / [`CodecImage`] traits, [`CodecError`], [`Orientation`]
//! - **Segment**: container-level rewrite, feature `segment-codec`
//! - **Raster**: decode + re-encode, feature `raster-codec`
//! - **Probe**: [`probe_codec`] picks one at startup

pub mod codec;
pub mod probe;
#[cfg(feature = "raster-codec")]
pub mod raster;
#[cfg(feature = "segment-codec")]
pub mod segment;

pub use codec::{CodecError, CodecImage, ICC_PROFILE, ImageCodec, Orientation};
pub use probe::{available_codecs, probe_codec};
#[cfg(feature = "raster-codec")]
pub use raster::{Quality, RasterCodec};
#[cfg(feature = "segment-codec")]
pub use segment::SegmentCodec;
