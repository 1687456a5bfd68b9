//! Shared test utilities for the strip-meta test suite.
//!
//! Synthesizes small real image files so codec tests run against actual
//! bytes instead of checked-in fixtures.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("photo.jpg");
//! create_tagged_jpeg(&path, Some(b"icc".as_slice()), Some(6));
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Image synthesis
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Create a small valid JPEG with no metadata segments besides JFIF.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid PNG with no ancillary chunks.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a 40x30 JPEG carrying an ICC profile and/or an EXIF orientation,
/// plus a comment segment standing in for camera junk.
#[cfg(feature = "segment-codec")]
pub fn create_tagged_jpeg(path: &Path, icc: Option<&[u8]>, orientation: Option<u16>) {
    use crate::imaging::Orientation;
    use crate::imaging::segment::orientation_exif_block;
    use img_parts::jpeg::{Jpeg, JpegSegment};
    use img_parts::{Bytes, ImageEXIF, ImageICC};

    create_test_jpeg(path, 40, 30);
    let bytes = Bytes::from(std::fs::read(path).unwrap());
    let mut jpeg = Jpeg::from_bytes(bytes).unwrap();

    if let Some(icc) = icc {
        jpeg.set_icc_profile(Some(Bytes::copy_from_slice(icc)));
    }
    if let Some(raw) = orientation {
        let orientation = Orientation::from_raw(raw.into()).unwrap();
        jpeg.set_exif(Some(Bytes::from(orientation_exif_block(orientation))));
    }
    let comment = JpegSegment::new_with_contents(0xFE, Bytes::from_static(b"Canon EOS"));
    jpeg.segments_mut().insert(1, comment);

    let mut out = Vec::new();
    jpeg.encoder().write_to(&mut out).unwrap();
    std::fs::write(path, out).unwrap();
}

/// Create a small lossless WebP with no metadata chunks.
pub fn create_test_webp(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::webp::WebPEncoder::new_lossless(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a 24x16 WebP carrying an EXIF orientation and an `XMP ` chunk
/// with `xmp` as its payload.
#[cfg(feature = "segment-codec")]
pub fn create_tagged_webp(path: &Path, orientation: u16, xmp: &[u8]) {
    use crate::imaging::Orientation;
    use crate::imaging::segment::{orientation_exif_block, sync_vp8x};
    use img_parts::riff::{RiffChunk, RiffContent};
    use img_parts::webp::{CHUNK_XMP, WebP};
    use img_parts::{Bytes, ImageEXIF};

    create_test_webp(path, 24, 16);
    let bytes = Bytes::from(std::fs::read(path).unwrap());
    let mut webp = WebP::from_bytes(bytes).unwrap();

    let orientation = Orientation::from_raw(orientation.into()).unwrap();
    webp.set_exif(Some(Bytes::from(orientation_exif_block(orientation))));
    webp.chunks_mut().push(RiffChunk::new(
        CHUNK_XMP,
        RiffContent::Data(Bytes::copy_from_slice(xmp)),
    ));
    sync_vp8x(&mut webp);

    let mut out = Vec::new();
    webp.encoder().write_to(&mut out).unwrap();
    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Create an empty file, including parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

/// Write `json` as `library.json` inside `dir` and return its path.
pub fn write_library(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("library.json");
    std::fs::write(&path, json).unwrap();
    path
}
