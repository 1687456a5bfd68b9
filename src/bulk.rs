//! Bulk strip action over a selection of library attachments.
//!
//! ```text
//! ids ──filter images──▶ [42, 57]
//!     ──expand──────────▶ [42.jpg, 42-150x150.jpg, 57.jpg, 57-scaled.jpg, ...]
//!     ──pre-check───────▶ every path exists? else abort, nothing touched
//!     ──strip───────────▶ one path at a time, in order
//! ```
//!
//! The pre-check is all-or-nothing: a single missing rendition aborts the
//! whole action before any file is modified. After it passes, each path is
//! stripped best-effort and a failure on one path does not stop the rest.
//!
//! The action is an explicit request, so neither `strip_active` nor the
//! MIME allow-list is consulted.

use crate::config::Settings;
use crate::imaging::ImageCodec;
use crate::library::Library;
use crate::strip::{StripError, StripReport, strip_metadata};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("rendition path not found: {0}")]
    MissingRenditionPath(PathBuf),
}

/// Result of a completed bulk run.
#[derive(Debug)]
pub struct BulkOutcome {
    /// Logical images processed, not files.
    pub images: usize,
    /// Every file touched, in processing order.
    pub files: Vec<(PathBuf, Result<StripReport, StripError>)>,
}

impl BulkOutcome {
    /// Files whose strip run hit at least one failure.
    pub fn failed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, result)| !matches!(result, Ok(report) if report.is_clean()))
            .count()
    }
}

/// Flat, ordered list of every path belonging to the image attachments in
/// `ids`. Non-image and unknown ids are dropped.
pub fn collect_paths(ids: &[u64], library: &Library) -> (Vec<u64>, Vec<PathBuf>) {
    let image_ids: Vec<u64> = ids
        .iter()
        .copied()
        .filter(|&id| library.is_image(id))
        .collect();

    let paths = image_ids
        .iter()
        .filter_map(|&id| library.get(id))
        .flat_map(|attachment| attachment.rendition_paths())
        .collect();

    (image_ids, paths)
}

/// Strip every rendition of every image in `ids`.
pub fn bulk_strip(
    ids: &[u64],
    library: &Library,
    settings: &Settings,
    codec: &dyn ImageCodec,
) -> Result<BulkOutcome, BulkError> {
    let (image_ids, paths) = collect_paths(ids, library);
    tracing::debug!(
        requested = ids.len(),
        images = image_ids.len(),
        files = paths.len(),
        "bulk strip"
    );

    if let Some(missing) = paths.iter().find(|path| !path.exists()) {
        if settings.logging.is_enabled() {
            tracing::warn!(path = %missing.display(), "unable to locate all image paths");
        }
        return Err(BulkError::MissingRenditionPath(missing.clone()));
    }

    let files = paths
        .into_iter()
        .map(|path| {
            let result = strip_metadata(&path, settings, codec);
            (path, result)
        })
        .collect();

    Ok(BulkOutcome {
        images: image_ids.len(),
        files,
    })
}
