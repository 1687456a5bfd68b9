//! Upload hook: strip metadata from a freshly uploaded file.
//!
//! Gating runs in a fixed order and the first failing check wins:
//!
//! 1. `strip_active` must be enabled
//! 2. an image codec must be available
//! 3. the MIME type must be on the `image_file_types` allow-list
//!
//! The upload itself always goes through. A strip failure is logged and
//! reported in the [`UploadOutcome`], never propagated, so the host keeps
//! the (possibly unmodified) file.

use crate::config::Settings;
use crate::imaging::ImageCodec;
use crate::strip::{StripError, StripReport, strip_metadata};
use std::path::{Path, PathBuf};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file handed over by the host after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Build from a path alone, inferring the MIME type from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = infer_mime(&path);
        Self { path, mime_type }
    }
}

/// MIME type for `path` based on its extension.
pub fn infer_mime(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    StrippingDisabled,
    NoCodec,
    UnsupportedType(String),
}

#[derive(Debug)]
pub enum UploadOutcome {
    Skipped(SkipReason),
    Stripped(StripReport),
    Failed(StripError),
}

/// Run the upload hook for `file`.
pub fn handle_upload(
    file: &UploadedFile,
    settings: &Settings,
    codec: Option<&dyn ImageCodec>,
) -> UploadOutcome {
    if !settings.strip_active.is_enabled() {
        return UploadOutcome::Skipped(SkipReason::StrippingDisabled);
    }
    let Some(codec) = codec else {
        return UploadOutcome::Skipped(SkipReason::NoCodec);
    };
    if !settings.accepts_mime(&file.mime_type) {
        tracing::debug!(mime = %file.mime_type, "upload type not on allow-list");
        return UploadOutcome::Skipped(SkipReason::UnsupportedType(file.mime_type.clone()));
    }

    match strip_metadata(&file.path, settings, codec) {
        Ok(report) => UploadOutcome::Stripped(report),
        Err(err) => {
            if settings.logging.is_enabled() {
                tracing::warn!("Unhandled error stripping image metadata: {err}");
            }
            UploadOutcome::Failed(err)
        }
    }
}
