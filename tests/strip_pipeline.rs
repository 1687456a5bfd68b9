//! End-to-end tests against real files on disk.
//!
//! Images are synthesized with the `image` crate, tagged through the segment
//! codec's public API, and then run through the upload hook and the bulk
//! action exactly as the CLI does.
//!
//! Run with: cargo test --test strip_pipeline

#![cfg(feature = "segment-codec")]

use image::{ImageEncoder, RgbImage};
use std::path::Path;
use strip_meta::bulk::{BulkError, bulk_strip};
use strip_meta::config::{Settings, Toggle};
use strip_meta::imaging::{ICC_PROFILE, ImageCodec, Orientation, SegmentCodec};
use strip_meta::inspect::read_exif;
use strip_meta::library::Library;
use strip_meta::upload::{UploadOutcome, UploadedFile, handle_upload};
use tempfile::TempDir;

const ICC: &[u8] = b"Display P3 profile stand-in";

/// Write a JPEG and tag it with an ICC profile and orientation 6.
fn camera_jpeg(path: &Path) {
    let img = RgbImage::from_fn(48, 32, |x, y| image::Rgb([(x * 5) as u8, (y * 7) as u8, 90]));
    let file = std::fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), 48, 32, image::ExtendedColorType::Rgb8)
        .unwrap();

    let mut handle = SegmentCodec::new().open(path).unwrap();
    handle.set_profile(ICC_PROFILE, ICC).unwrap();
    handle
        .set_orientation(Orientation::from_raw(6).unwrap())
        .unwrap();
    handle.write(path).unwrap();
}

fn icc_of(path: &Path) -> Option<Vec<u8>> {
    SegmentCodec::new().open(path).unwrap().profile(ICC_PROFILE).unwrap()
}

fn orientation_of(path: &Path) -> Option<u16> {
    SegmentCodec::new()
        .open(path)
        .unwrap()
        .orientation()
        .unwrap()
        .map(Orientation::value)
}

#[test]
fn upload_keeps_profile_and_orientation_only() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("IMG_0001.jpg");
    camera_jpeg(&path);

    let codec = SegmentCodec::new();
    let file = UploadedFile::from_path(&path);
    let outcome = handle_upload(&file, &Settings::default(), Some(&codec));

    let report = match outcome {
        UploadOutcome::Stripped(report) => report,
        other => panic!("expected Stripped, got {other:?}"),
    };
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.icc_preserved);
    assert_eq!(icc_of(&path).as_deref(), Some(ICC));
    assert_eq!(orientation_of(&path), Some(6));

    let fields = read_exif(&path).unwrap();
    let tags: Vec<&str> = fields.iter().map(|f| f.tag.as_str()).collect();
    assert_eq!(tags, vec!["Orientation"]);

    let (w, h) = image::image_dimensions(&path).unwrap();
    assert_eq!((w, h), (48, 32));
}

#[test]
fn upload_without_preservation_leaves_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("IMG_0002.jpg");
    camera_jpeg(&path);

    let settings = Settings {
        preserve_icc: Toggle::Disabled,
        preserve_orientation: Toggle::Disabled,
        ..Settings::default()
    };
    let codec = SegmentCodec::new();
    let outcome = handle_upload(&UploadedFile::from_path(&path), &settings, Some(&codec));

    assert!(matches!(outcome, UploadOutcome::Stripped(_)));
    assert_eq!(icc_of(&path), None);
    assert_eq!(orientation_of(&path), None);
    assert!(read_exif(&path).unwrap().is_empty());
}

#[test]
fn stripping_twice_is_stable() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("IMG_0003.jpg");
    camera_jpeg(&path);

    let codec = SegmentCodec::new();
    let file = UploadedFile::from_path(&path);
    let _ = handle_upload(&file, &Settings::default(), Some(&codec));
    let first = std::fs::read(&path).unwrap();
    let _ = handle_upload(&file, &Settings::default(), Some(&codec));
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
}

const LIBRARY: &str = r#"{"attachments": [
    {"id": 1, "path": "uploads/a.jpg", "mime_type": "image/jpeg",
     "metadata": {"sizes": {"thumbnail": {"file": "a-150x150.jpg"}}}},
    {"id": 2, "path": "uploads/b.jpg", "mime_type": "image/jpeg",
     "metadata": {"file": "2024/05/b-scaled.jpg", "original_image": "b.jpg"}},
    {"id": 3, "path": "uploads/clip.mp4", "mime_type": "video/mp4"}
]}"#;

fn library_dir(files: &[&str]) -> (TempDir, Library) {
    let tmp = TempDir::new().unwrap();
    let uploads = tmp.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();
    for name in files {
        camera_jpeg(&uploads.join(name));
    }
    let library_path = tmp.path().join("library.json");
    std::fs::write(&library_path, LIBRARY).unwrap();
    let library = Library::load(&library_path).unwrap();
    (tmp, library)
}

#[test]
fn bulk_strips_every_rendition() {
    let files = ["a.jpg", "a-150x150.jpg", "b.jpg", "b-scaled.jpg"];
    let (tmp, library) = library_dir(&files);

    let codec = SegmentCodec::new();
    let outcome = bulk_strip(&[1, 2, 3], &library, &Settings::default(), &codec).unwrap();

    assert_eq!(outcome.images, 2);
    assert_eq!(outcome.files.len(), 4);
    assert_eq!(outcome.failed_files(), 0);
    for name in files {
        let path = tmp.path().join("uploads").join(name);
        let tags: Vec<String> = read_exif(&path).unwrap().into_iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec!["Orientation".to_string()], "{name}");
        assert_eq!(icc_of(&path).as_deref(), Some(ICC), "{name}");
    }
}

#[test]
fn bulk_refuses_when_a_rendition_is_missing() {
    // b-scaled.jpg is missing
    let (tmp, library) = library_dir(&["a.jpg", "a-150x150.jpg", "b.jpg"]);
    let before = std::fs::read(tmp.path().join("uploads/a.jpg")).unwrap();

    let codec = SegmentCodec::new();
    let result = bulk_strip(&[1, 2], &library, &Settings::default(), &codec);

    let Err(BulkError::MissingRenditionPath(missing)) = result else {
        panic!("expected MissingRenditionPath");
    };
    assert_eq!(missing, tmp.path().join("uploads/b-scaled.jpg"));
    assert_eq!(std::fs::read(tmp.path().join("uploads/a.jpg")).unwrap(), before);
}

#[cfg(feature = "raster-codec")]
#[test]
fn raster_codec_cannot_keep_orientation() {
    use strip_meta::imaging::RasterCodec;

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("IMG_0004.jpg");
    camera_jpeg(&path);

    let settings = Settings {
        preserve_icc: Toggle::Disabled,
        ..Settings::default()
    };
    let codec = RasterCodec::new();
    let outcome = handle_upload(&UploadedFile::from_path(&path), &settings, Some(&codec));

    let report = match outcome {
        UploadOutcome::Stripped(report) => report,
        other => panic!("expected Stripped, got {other:?}"),
    };
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.orientation_unavailable);
    assert_eq!(report.orientation_preserved, None);
    assert_eq!(orientation_of(&path), None);
    assert!(image::image_dimensions(&path).is_ok());
}
