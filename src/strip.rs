//! Metadata stripping for a single image file.
//!
//! [`strip_metadata`] runs a fixed sequence of steps against one file,
//! overwriting it in place:
//!
//! ```text
//! 1. open                ── failure aborts, nothing else runs
//! 2. read ICC profile    ── if preserve_icc
//! 3. read orientation    ── if preserve_orientation
//! 4. strip all metadata
//! 5. restore ICC profile ── if one was captured
//! 6. restore orientation ── if one was captured
//! 7. write back to the same path
//! 8. release             ── always (handle dropped at end of scope)
//! ```
//!
//! ## Best-effort
//!
//! Steps 2–7 each return their own `Result`. A failed step is recorded in the
//! [`StripReport`], logged when logging is enabled, and the pipeline moves on
//! to the next step. Only a failure to open the file is returned as an error.
//!
//! A missing profile or orientation is not a failure. Neither is a codec that
//! has no orientation support at all ([`CodecError::Unsupported`]); that case
//! simply means orientation cannot be preserved with this codec.
//!
//! ## Non-atomic writes
//!
//! Step 7 overwrites the file directly. If the codec fails mid-write the file
//! may be left untouched or partially written, depending on where the codec
//! failed.

use crate::config::Settings;
use crate::imaging::{CodecError, CodecImage, ICC_PROFILE, ImageCodec, Orientation};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A pipeline step, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Open,
    ReadProfile,
    ReadOrientation,
    Strip,
    WriteProfile,
    WriteOrientation,
    WriteFile,
}

impl Step {
    /// Operation name used in log lines.
    pub fn operation(self) -> &'static str {
        match self {
            Step::Open => "opening image path",
            Step::ReadProfile => "reading ICC profile",
            Step::ReadOrientation => "reading image orientation",
            Step::Strip => "stripping image metadata",
            Step::WriteProfile => "setting ICC profile",
            Step::WriteOrientation => "setting image orientation",
            Step::WriteFile => "overwriting image file",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// Errors from the strip pipeline, one kind per step.
///
/// Only [`StripError::Open`] is ever returned by [`strip_metadata`]; the others
/// appear inside [`StripReport::failures`].
#[derive(Error, Debug)]
pub enum StripError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: CodecError },
    #[error("cannot read ICC profile: {0}")]
    ProfileRead(CodecError),
    #[error("cannot read orientation: {0}")]
    OrientationRead(CodecError),
    #[error("cannot strip metadata: {0}")]
    Strip(CodecError),
    #[error("cannot restore ICC profile: {0}")]
    ProfileWrite(CodecError),
    #[error("cannot restore orientation: {0}")]
    OrientationWrite(CodecError),
    #[error("cannot write {path}: {source}")]
    FileWrite { path: PathBuf, source: CodecError },
}

impl StripError {
    pub fn step(&self) -> Step {
        match self {
            StripError::Open { .. } => Step::Open,
            StripError::ProfileRead(_) => Step::ReadProfile,
            StripError::OrientationRead(_) => Step::ReadOrientation,
            StripError::Strip(_) => Step::Strip,
            StripError::ProfileWrite(_) => Step::WriteProfile,
            StripError::OrientationWrite(_) => Step::WriteOrientation,
            StripError::FileWrite { .. } => Step::WriteFile,
        }
    }

    /// The underlying codec error.
    pub fn codec_error(&self) -> &CodecError {
        match self {
            StripError::Open { source, .. } | StripError::FileWrite { source, .. } => source,
            StripError::ProfileRead(e)
            | StripError::OrientationRead(e)
            | StripError::Strip(e)
            | StripError::ProfileWrite(e)
            | StripError::OrientationWrite(e) => e,
        }
    }
}

/// Outcome of a strip run that got past `open`.
#[derive(Debug)]
pub struct StripReport {
    pub path: PathBuf,
    /// Steps that failed, in the order they ran.
    pub failures: Vec<StripError>,
    /// ICC profile was captured and written back successfully.
    pub icc_preserved: bool,
    /// Orientation was captured and written back successfully.
    pub orientation_preserved: Option<Orientation>,
    /// The codec has no orientation support.
    pub orientation_unavailable: bool,
}

impl StripReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            failures: Vec::new(),
            icc_preserved: false,
            orientation_preserved: None,
            orientation_unavailable: false,
        }
    }

    /// True when every step that ran succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when the stripped image made it back to disk.
    pub fn written(&self) -> bool {
        !self.failures.iter().any(|f| f.step() == Step::WriteFile)
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.failures.iter().map(StripError::step).collect()
    }
}

/// Per-run context: where to log, which codec to name.
struct Pipeline {
    codec_name: &'static str,
    logging: bool,
    report: StripReport,
}

impl Pipeline {
    /// Inspect a step result: keep the value, or record and log the failure.
    fn check<T>(&mut self, result: Result<T, StripError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.log(&err);
                self.report.failures.push(err);
                None
            }
        }
    }

    fn log(&self, err: &StripError) {
        if self.logging {
            tracing::warn!(
                path = %self.report.path.display(),
                "error while {} using {}: {}",
                err.step(),
                self.codec_name,
                err.codec_error()
            );
        }
    }
}

/// Strip metadata from the image at `path` in place.
///
/// Toggles come from `settings`: `preserve_icc`, `preserve_orientation` and
/// `logging`. The caller is responsible for `strip_active` and the MIME
/// allow-list.
pub fn strip_metadata(
    path: &Path,
    settings: &Settings,
    codec: &dyn ImageCodec,
) -> Result<StripReport, StripError> {
    let logging = settings.logging.is_enabled();

    let mut image = match codec.open(path) {
        Ok(image) => image,
        Err(source) => {
            let err = StripError::Open {
                path: path.to_path_buf(),
                source,
            };
            if logging {
                tracing::warn!(
                    path = %path.display(),
                    "error while {} using {}: {}",
                    Step::Open,
                    codec.name(),
                    err.codec_error()
                );
            }
            return Err(err);
        }
    };

    let mut pipeline = Pipeline {
        codec_name: codec.name(),
        logging,
        report: StripReport::new(path),
    };

    run_steps(image.as_mut(), settings, path, &mut pipeline);

    // Step 8: release codec resources.
    drop(image);

    let report = pipeline.report;
    tracing::debug!(
        path = %path.display(),
        failures = report.failures.len(),
        icc_preserved = report.icc_preserved,
        "stripped image metadata"
    );
    Ok(report)
}

fn run_steps(image: &mut dyn CodecImage, settings: &Settings, path: &Path, p: &mut Pipeline) {
    let icc = if settings.preserve_icc.is_enabled() {
        let read = image.profile(ICC_PROFILE).map_err(StripError::ProfileRead);
        p.check(read).flatten()
    } else {
        None
    };

    let orientation = if settings.preserve_orientation.is_enabled() {
        match image.orientation() {
            Err(e) if e.is_unsupported() => {
                p.report.orientation_unavailable = true;
                tracing::debug!(codec = p.codec_name, "orientation not supported by codec");
                None
            }
            read => p.check(read.map_err(StripError::OrientationRead)).flatten(),
        }
    } else {
        None
    };

    let stripped = image.strip().map_err(StripError::Strip);
    p.check(stripped);

    if let Some(icc) = icc {
        let restored = image
            .set_profile(ICC_PROFILE, &icc)
            .map_err(StripError::ProfileWrite);
        p.report.icc_preserved = p.check(restored).is_some();
    }

    if let Some(orientation) = orientation {
        let restored = image
            .set_orientation(orientation)
            .map_err(StripError::OrientationWrite);
        if p.check(restored).is_some() {
            p.report.orientation_preserved = Some(orientation);
        }
    }

    let written = image.write(path).map_err(|source| StripError::FileWrite {
        path: path.to_path_buf(),
        source,
    });
    p.check(written);
}
