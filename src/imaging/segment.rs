//! Lossless segment codec — rewrites container metadata, never pixel data.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Parse JPEG / PNG / WebP containers | `img-parts` |
//! | ICC profile read / write | `img_parts::ImageICC` (APP2 chunks, `iCCP`, `ICCP`) |
//! | Orientation read | `img_parts::ImageEXIF` + `kamadak-exif` |
//! | Orientation write | single-entry big-endian EXIF block |
//! | Strip | drop metadata segments / chunks |
//! | Encode | `img_parts` encoder (byte-for-byte copy of the image data) |
//!
//! ## What strip removes
//!
//! - **JPEG**: every APPn segment except APP0 (JFIF) and APP14 (Adobe color
//!   transform, needed to decode CMYK/YCCK correctly), plus all COM segments.
//! - **PNG**: `eXIf`, `iCCP`, `tEXt`, `zTXt`, `iTXt`, `tIME`. Color chunks
//!   like `sRGB` and `gAMA` stay.
//! - **WebP**: `EXIF`, `ICCP` and `XMP ` chunks. The `VP8X` header is kept
//!   only while alpha or animation still needs it.
//!
//! ## Segment placement
//!
//! `img-parts` inserts new JPEG APP1/APP2 segments at a fixed index, which
//! after a strip lands them behind the frame header. Restored segments are
//! moved back to directly after APP0 (or SOI when there is no APP0), EXIF
//! first, ICC chunks in sequence order. On WebP the `VP8X` flag bits are
//! recomputed from the chunks actually present.

use super::codec::{CodecError, CodecImage, ICC_PROFILE, ImageCodec, Orientation};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::Png;
use img_parts::riff::{RiffChunk, RiffContent};
use img_parts::webp::{
    CHUNK_ALPH, CHUNK_ANIM, CHUNK_ANMF, CHUNK_EXIF, CHUNK_ICCP, CHUNK_VP8, CHUNK_VP8L, CHUNK_VP8X,
    CHUNK_XMP, WebP,
};
use img_parts::{Bytes, ImageEXIF, ImageICC};
use std::path::Path;

const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP14: u8 = 0xEE;
const APP15: u8 = 0xEF;
const COM: u8 = 0xFE;

const PNG_SIGNATURE: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10];

const PNG_METADATA_CHUNKS: &[[u8; 4]] = &[*b"eXIf", *b"iCCP", *b"tEXt", *b"zTXt", *b"iTXt", *b"tIME"];

const WEBP_METADATA_CHUNKS: &[[u8; 4]] = &[CHUNK_EXIF, CHUNK_ICCP, CHUNK_XMP];

// VP8X feature flags, first byte of the chunk payload.
const VP8X_ICC: u8 = 0b0010_0000;
const VP8X_ALPHA: u8 = 0b0001_0000;
const VP8X_EXIF: u8 = 0b0000_1000;
const VP8X_XMP: u8 = 0b0000_0100;
const VP8X_ANIMATION: u8 = 0b0000_0010;
const VP8X_METADATA: u8 = VP8X_ICC | VP8X_EXIF | VP8X_XMP;

/// Container-level codec built on `img-parts`.
pub struct SegmentCodec;

impl SegmentCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SegmentCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for SegmentCodec {
    fn name(&self) -> &'static str {
        "segment codec"
    }

    fn library(&self) -> &'static str {
        "img-parts 0.3"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn CodecImage>, CodecError> {
        let bytes = std::fs::read(path)?;
        let container = Container::parse(Bytes::from(bytes)).map_err(|e| match e {
            CodecError::UnknownFormat(_) => CodecError::UnknownFormat(path.display().to_string()),
            other => other,
        })?;
        Ok(Box::new(SegmentImage {
            container: Some(container),
        }))
    }
}

enum Container {
    Jpeg(Jpeg),
    Png(Png),
    WebP(WebP),
}

fn parse_failed(e: img_parts::Error) -> CodecError {
    CodecError::ProcessingFailed(format!("Failed to parse container: {e}"))
}

impl Container {
    fn parse(bytes: Bytes) -> Result<Self, CodecError> {
        if bytes.starts_with(&[0xFF, 0xD8]) {
            return Jpeg::from_bytes(bytes).map(Container::Jpeg).map_err(parse_failed);
        }
        if bytes.starts_with(PNG_SIGNATURE) {
            return Png::from_bytes(bytes).map(Container::Png).map_err(parse_failed);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return WebP::from_bytes(bytes).map(Container::WebP).map_err(parse_failed);
        }
        Err(CodecError::UnknownFormat("not a JPEG, PNG or WebP file".into()))
    }

    fn exif(&self) -> Option<Bytes> {
        match self {
            Container::Jpeg(img) => img.exif(),
            Container::Png(img) => img.exif(),
            Container::WebP(img) => img.exif(),
        }
    }

    fn set_exif(&mut self, exif: Option<Bytes>) {
        match self {
            Container::Jpeg(img) => {
                img.set_exif(exif);
                place_app_segments(img);
            }
            Container::Png(img) => img.set_exif(exif),
            Container::WebP(img) => {
                img.set_exif(exif);
                sync_vp8x(img);
            }
        }
    }

    fn icc_profile(&self) -> Option<Bytes> {
        match self {
            Container::Jpeg(img) => img.icc_profile(),
            Container::Png(img) => img.icc_profile(),
            Container::WebP(img) => img.icc_profile(),
        }
    }

    fn set_icc_profile(&mut self, profile: Option<Bytes>) {
        match self {
            Container::Jpeg(img) => {
                img.set_icc_profile(profile);
                place_app_segments(img);
            }
            Container::Png(img) => img.set_icc_profile(profile),
            Container::WebP(img) => {
                img.set_icc_profile(profile);
                sync_vp8x(img);
            }
        }
    }

    fn strip(&mut self) {
        match self {
            Container::Jpeg(img) => img
                .segments_mut()
                .retain(|segment| !is_jpeg_metadata_marker(segment.marker())),
            Container::Png(img) => img
                .chunks_mut()
                .retain(|chunk| !PNG_METADATA_CHUNKS.contains(&chunk.kind())),
            // Not via set_exif(None): img-parts then drops VP8X even when
            // an ALPH or ANIM chunk still depends on it.
            Container::WebP(img) => {
                img.chunks_mut()
                    .retain(|chunk| !WEBP_METADATA_CHUNKS.contains(&chunk.id()));
                sync_vp8x(img);
            }
        }
    }

    fn encode(self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Container::Jpeg(img) => img.encoder().write_to(&mut out)?,
            Container::Png(img) => img.encoder().write_to(&mut out)?,
            Container::WebP(img) => img.encoder().write_to(&mut out)?,
        };
        Ok(out)
    }
}

fn is_jpeg_metadata_marker(marker: u8) -> bool {
    match marker {
        APP0 | APP14 => false,
        m if (APP0..=APP15).contains(&m) => true,
        COM => true,
        _ => false,
    }
}

fn icc_sequence(segment: &JpegSegment) -> u8 {
    // "ICC_PROFILE\0" then the 1-based chunk number
    segment.contents().get(12).copied().unwrap_or(0)
}

/// Move every APP1 and APP2 segment to directly after APP0, APP1 first.
fn place_app_segments(jpeg: &mut Jpeg) {
    let segments = jpeg.segments_mut();
    let (mut app, mut rest): (Vec<JpegSegment>, Vec<JpegSegment>) = std::mem::take(segments)
        .into_iter()
        .partition(|s| matches!(s.marker(), APP1 | APP2));
    app.sort_by_key(|s| (s.marker(), if s.marker() == APP2 { icc_sequence(s) } else { 0 }));

    let at = rest
        .iter()
        .position(|s| s.marker() == APP0)
        .map_or(0, |pos| pos + 1);
    let tail = rest.split_off(at);
    rest.extend(app);
    rest.extend(tail);
    *segments = rest;
}

/// Bring the `VP8X` header in line with the chunks present.
///
/// Metadata flag bits are recomputed. Once no metadata, alpha or animation
/// is left, the header is dropped and the file becomes simple-format WebP.
pub(crate) fn sync_vp8x(webp: &mut WebP) {
    let Some(pos) = webp.chunks().iter().position(|c| c.id() == CHUNK_VP8X) else {
        return;
    };
    let mut payload = webp.chunks()[pos]
        .content()
        .data()
        .map(|data| data.to_vec())
        .unwrap_or_default();
    let Some(current) = payload.first().copied() else {
        return;
    };

    let mut metadata = 0;
    if webp.has_chunk(CHUNK_ICCP) {
        metadata |= VP8X_ICC;
    }
    if webp.has_chunk(CHUNK_EXIF) {
        metadata |= VP8X_EXIF;
    }
    if webp.has_chunk(CHUNK_XMP) {
        metadata |= VP8X_XMP;
    }

    let extended = current & (VP8X_ALPHA | VP8X_ANIMATION) != 0
        || [CHUNK_ALPH, CHUNK_ANIM, CHUNK_ANMF]
            .iter()
            .any(|id| webp.has_chunk(*id));
    let simple_bitstream = webp.has_chunk(CHUNK_VP8) || webp.has_chunk(CHUNK_VP8L);

    if metadata == 0 && !extended && simple_bitstream {
        webp.chunks_mut().remove(pos);
        return;
    }

    payload[0] = (current & !VP8X_METADATA) | metadata;
    webp.chunks_mut()[pos] = RiffChunk::new(CHUNK_VP8X, RiffContent::Data(Bytes::from(payload)));
}

/// Read the orientation tag from a raw TIFF-structured EXIF block.
fn orientation_from_exif(exif: &[u8]) -> Result<Option<Orientation>, CodecError> {
    let parsed = exif::Reader::new()
        .read_raw(exif.to_vec())
        .map_err(|e| CodecError::ProcessingFailed(format!("Failed to parse EXIF: {e}")))?;
    Ok(parsed
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_raw))
}

/// Build a minimal EXIF block: big-endian TIFF header, IFD0 with a single
/// Orientation (0x0112, SHORT) entry, no next IFD.
pub(crate) fn orientation_exif_block(orientation: Orientation) -> Vec<u8> {
    let mut block = Vec::with_capacity(26);
    block.extend_from_slice(b"MM");
    block.extend_from_slice(&42u16.to_be_bytes());
    block.extend_from_slice(&8u32.to_be_bytes()); // IFD0 offset
    block.extend_from_slice(&1u16.to_be_bytes()); // entry count
    block.extend_from_slice(&0x0112u16.to_be_bytes());
    block.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    block.extend_from_slice(&1u32.to_be_bytes()); // count
    block.extend_from_slice(&orientation.value().to_be_bytes());
    block.extend_from_slice(&[0, 0]); // value padding
    block.extend_from_slice(&0u32.to_be_bytes()); // next IFD
    block
}

struct SegmentImage {
    // `None` only transiently while `write` re-encodes the container.
    container: Option<Container>,
}

impl SegmentImage {
    fn container(&self) -> Result<&Container, CodecError> {
        self.container
            .as_ref()
            .ok_or_else(|| CodecError::ProcessingFailed("image handle is closed".into()))
    }

    fn container_mut(&mut self) -> Result<&mut Container, CodecError> {
        self.container
            .as_mut()
            .ok_or_else(|| CodecError::ProcessingFailed("image handle is closed".into()))
    }
}

fn check_profile_name(name: &str) -> Result<(), CodecError> {
    if name == ICC_PROFILE {
        Ok(())
    } else {
        Err(CodecError::Unsupported(format!("profile {name:?}")))
    }
}

impl CodecImage for SegmentImage {
    fn profile(&self, name: &str) -> Result<Option<Vec<u8>>, CodecError> {
        check_profile_name(name)?;
        Ok(self.container()?.icc_profile().map(|b| b.to_vec()))
    }

    fn set_profile(&mut self, name: &str, data: &[u8]) -> Result<(), CodecError> {
        check_profile_name(name)?;
        self.container_mut()?
            .set_icc_profile(Some(Bytes::copy_from_slice(data)));
        Ok(())
    }

    fn orientation(&self) -> Result<Option<Orientation>, CodecError> {
        match self.container()?.exif() {
            Some(exif) => orientation_from_exif(&exif),
            None => Ok(None),
        }
    }

    fn set_orientation(&mut self, orientation: Orientation) -> Result<(), CodecError> {
        let block = orientation_exif_block(orientation);
        self.container_mut()?.set_exif(Some(Bytes::from(block)));
        Ok(())
    }

    fn strip(&mut self) -> Result<(), CodecError> {
        self.container_mut()?.strip();
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), CodecError> {
        let container = self
            .container
            .take()
            .ok_or_else(|| CodecError::ProcessingFailed("image handle is closed".into()))?;
        let encoded = container.encode()?;
        let bytes = Bytes::from(encoded);
        // Keep the handle usable after writing.
        self.container = Some(Container::parse(bytes.clone())?);
        std::fs::write(path, &bytes)?;
        Ok(())
    }
}
