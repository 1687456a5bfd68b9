//! Raster codec — decode to pixels, re-encode without metadata.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` → `ImageDecoder` |
//! | ICC profile read | `ImageDecoder::icc_profile` |
//! | ICC profile write | `ImageEncoder::set_icc_profile` |
//! | Strip | implicit: the encoders write no EXIF/XMP/text |
//! | Encode JPEG | `JpegEncoder` at [`Quality`] (default 90) |
//! | Encode PNG / WebP | `PngEncoder`, lossless `WebPEncoder` |
//!
//! Orientation is not available through this codec: both the read and the
//! write report [`CodecError::Unsupported`]. JPEG output is lossy, so every
//! pass costs a generation of quality. Prefer the segment codec when it is
//! compiled in.

use super::codec::{CodecError, CodecImage, ICC_PROFILE, ImageCodec, Orientation};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::path::Path;

/// JPEG encoding quality, clamped to 1-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Decode/re-encode codec built on the `image` crate.
pub struct RasterCodec {
    quality: Quality,
}

impl RasterCodec {
    pub fn new() -> Self {
        Self {
            quality: Quality::default(),
        }
    }

    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(path: &Path, e: image::ImageError) -> CodecError {
    CodecError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
}

impl ImageCodec for RasterCodec {
    fn name(&self) -> &'static str {
        "raster codec"
    }

    fn library(&self) -> &'static str {
        "image 0.25"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn CodecImage>, CodecError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::UnknownFormat(path.display().to_string()))?;
        let mut decoder = reader.into_decoder().map_err(|e| decode_failed(path, e))?;
        let icc = decoder.icc_profile().map_err(|e| decode_failed(path, e))?;
        let pixels = DynamicImage::from_decoder(decoder).map_err(|e| decode_failed(path, e))?;

        Ok(Box::new(RasterImage {
            pixels,
            format,
            icc,
            quality: self.quality,
        }))
    }
}

struct RasterImage {
    pixels: DynamicImage,
    format: ImageFormat,
    icc: Option<Vec<u8>>,
    quality: Quality,
}

impl RasterImage {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        match self.format {
            ImageFormat::Jpeg => {
                let mut encoder =
                    JpegEncoder::new_with_quality(&mut out, self.quality.value());
                self.attach_icc(&mut encoder)?;
                // JPEG has no alpha channel
                let pixels = match &self.pixels {
                    DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                        self.pixels.clone()
                    }
                    other => DynamicImage::ImageRgb8(other.to_rgb8()),
                };
                pixels.write_with_encoder(encoder).map_err(encode_failed)?;
            }
            ImageFormat::Png => {
                let mut encoder = PngEncoder::new(&mut out);
                self.attach_icc(&mut encoder)?;
                self.pixels
                    .write_with_encoder(encoder)
                    .map_err(encode_failed)?;
            }
            ImageFormat::WebP => {
                let mut encoder = WebPEncoder::new_lossless(&mut out);
                self.attach_icc(&mut encoder)?;
                self.pixels
                    .write_with_encoder(encoder)
                    .map_err(encode_failed)?;
            }
            other => {
                return Err(CodecError::Unsupported(format!(
                    "writing {other:?} images"
                )));
            }
        }
        Ok(out)
    }

    fn attach_icc(&self, encoder: &mut impl ImageEncoder) -> Result<(), CodecError> {
        if let Some(icc) = &self.icc {
            encoder
                .set_icc_profile(icc.clone())
                .map_err(|e| CodecError::Unsupported(format!("ICC profile: {e}")))?;
        }
        Ok(())
    }
}

fn encode_failed(e: image::ImageError) -> CodecError {
    CodecError::ProcessingFailed(format!("Encode failed: {e}"))
}

impl CodecImage for RasterImage {
    fn profile(&self, name: &str) -> Result<Option<Vec<u8>>, CodecError> {
        if name != ICC_PROFILE {
            return Err(CodecError::Unsupported(format!("profile {name:?}")));
        }
        Ok(self.icc.clone())
    }

    fn set_profile(&mut self, name: &str, data: &[u8]) -> Result<(), CodecError> {
        if name != ICC_PROFILE {
            return Err(CodecError::Unsupported(format!("profile {name:?}")));
        }
        self.icc = Some(data.to_vec());
        Ok(())
    }

    fn orientation(&self) -> Result<Option<Orientation>, CodecError> {
        Err(CodecError::Unsupported("orientation".into()))
    }

    fn set_orientation(&mut self, _orientation: Orientation) -> Result<(), CodecError> {
        Err(CodecError::Unsupported("orientation".into()))
    }

    fn strip(&mut self) -> Result<(), CodecError> {
        self.icc = None;
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), CodecError> {
        let encoded = self.encode()?;
        std::fs::write(path, encoded)?;
        Ok(())
    }
}
