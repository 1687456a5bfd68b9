//! Image codec capability traits and shared types.
//!
//! The strip pipeline never talks to a concrete image library. It opens a
//! file through an [`ImageCodec`] and gets back a [`CodecImage`] handle that
//! exposes exactly the metadata operations the pipeline needs:
//!
//! | Operation | Method |
//! |---|---|
//! | Open by path | [`ImageCodec::open`] |
//! | Read / write named profile | [`CodecImage::profile`], [`CodecImage::set_profile`] |
//! | Read / write orientation | [`CodecImage::orientation`], [`CodecImage::set_orientation`] |
//! | Strip all metadata | [`CodecImage::strip`] |
//! | Write to path | [`CodecImage::write`] |
//! | Release | `Drop` |
//!
//! A codec that cannot do something returns [`CodecError::Unsupported`].
//! The pipeline treats that as "feature unavailable", distinct from a real
//! failure. The raster codec, for instance, has no orientation support at all.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Name of the ICC color profile, as passed to [`CodecImage::profile`].
pub const ICC_PROFILE: &str = "icc";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported by this codec: {0}")]
    Unsupported(String),
    #[error("Unrecognized image format: {0}")]
    UnknownFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl CodecError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CodecError::Unsupported(_))
    }
}

/// EXIF orientation (tag 0x0112), restricted to the eight defined values.
///
/// 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped vertically,
/// 5 = mirrored + 90° CW, 6 = 90° CW, 7 = mirrored + 270° CW, 8 = 270° CW.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation(u16);

impl Orientation {
    /// Returns `None` for 0 ("undefined") and anything above 8.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1..=8 => Some(Self(value as u16)),
            _ => None,
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A codec that can open image files.
pub trait ImageCodec {
    /// Short human-readable name, used in log lines and notices.
    fn name(&self) -> &'static str;

    /// The third-party library doing the work, with its version.
    fn library(&self) -> &'static str;

    /// Open the image at `path`. The returned handle owns any resources the
    /// codec allocates; dropping it releases them.
    fn open(&self, path: &Path) -> Result<Box<dyn CodecImage>, CodecError>;
}

/// An opened image. Mutations apply to the in-memory copy until [`write`](Self::write).
pub trait CodecImage {
    /// Read a named profile. `Ok(None)` when the image has none.
    fn profile(&self, name: &str) -> Result<Option<Vec<u8>>, CodecError>;

    /// Attach a named profile, replacing any existing one.
    fn set_profile(&mut self, name: &str, data: &[u8]) -> Result<(), CodecError>;

    /// Read the orientation tag. `Ok(None)` when absent or undefined.
    fn orientation(&self) -> Result<Option<Orientation>, CodecError>;

    /// Set the orientation tag.
    fn set_orientation(&mut self, orientation: Orientation) -> Result<(), CodecError>;

    /// Remove all metadata: EXIF, XMP, IPTC, comments and profiles.
    fn strip(&mut self) -> Result<(), CodecError>;

    /// Encode the current state and write it to `path`, replacing the file.
    fn write(&mut self, path: &Path) -> Result<(), CodecError>;
}
