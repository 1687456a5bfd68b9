//! CLI output formatting.
//!
//! Every entity gets a header line followed by indented context lines:
//!
//! ## Upload
//!
//! ```text
//! Stripped photo.jpg
//!     ICC profile: preserved
//!     Orientation: preserved (6)
//! ```
//!
//! ## Resolve
//!
//! ```text
//! 042 IMG_0042.jpg (4 files)
//!     uploads/2024/05/IMG_0042-150x150.jpg
//!     uploads/2024/05/IMG_0042-scaled.jpg
//!     uploads/2024/05/IMG_0042.jpg
//! ```
//!
//! ## Bulk
//!
//! ```text
//! 001 IMG_0042-150x150.jpg
//!     ICC profile: preserved
//!     Orientation: preserved (6)
//! 002 IMG_0042.jpg
//!     Failed: overwriting image file: Processing failed: disk full
//!
//! Processed 1 image, 2 files (1 with errors)
//! ```
//!
//! # Architecture
//!
//! Each entity has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects.
//! [`print_lines`] writes the result to stdout.

use crate::bulk::BulkOutcome;
use crate::config::{Settings, TOGGLE_KEYS};
use crate::strip::{StripError, StripReport};
use crate::upload::{SkipReason, UploadOutcome};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Context lines for one strip run, at the given depth.
fn report_lines(report: &StripReport, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = Vec::new();

    if report.icc_preserved {
        lines.push(format!("{pad}ICC profile: preserved"));
    }
    if let Some(orientation) = report.orientation_preserved {
        lines.push(format!("{pad}Orientation: preserved ({orientation})"));
    } else if report.orientation_unavailable {
        lines.push(format!("{pad}Orientation: not supported by codec"));
    }
    for failure in &report.failures {
        lines.push(format!(
            "{pad}Failed: {}: {}",
            failure.step(),
            failure.codec_error()
        ));
    }
    lines
}

pub fn format_strip_report(report: &StripReport) -> Vec<String> {
    let mut lines = vec![format!("Stripped {}", file_name(&report.path))];
    lines.extend(report_lines(report, 1));
    lines
}

pub fn format_upload_outcome(path: &Path, outcome: &UploadOutcome) -> Vec<String> {
    match outcome {
        UploadOutcome::Stripped(report) => format_strip_report(report),
        UploadOutcome::Skipped(reason) => {
            let why = match reason {
                SkipReason::StrippingDisabled => "stripping disabled".to_string(),
                SkipReason::NoCodec => "no image codec".to_string(),
                SkipReason::UnsupportedType(mime) => format!("{mime} not in image_file_types"),
            };
            vec![format!("Skipped {} ({why})", file_name(path))]
        }
        UploadOutcome::Failed(err) => vec![
            format!("Unchanged {}", file_name(path)),
            format!("{}{err}", indent(1)),
        ],
    }
}

/// `exists` reports whether a path is on disk; missing paths are flagged.
pub fn format_renditions(
    id: u64,
    original: &Path,
    paths: &BTreeSet<PathBuf>,
    exists: impl Fn(&Path) -> bool,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({})",
        format_index(id as usize),
        file_name(original),
        plural(paths.len(), "file")
    )];
    for path in paths {
        let marker = if exists(path) { "" } else { "  (missing)" };
        lines.push(format!("{}{}{marker}", indent(1), path.display()));
    }
    lines
}

fn bulk_entry(index: usize, path: &Path, result: &Result<StripReport, StripError>) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), file_name(path))];
    match result {
        Ok(report) => lines.extend(report_lines(report, 1)),
        Err(err) => lines.push(format!("{}Failed: {err}", indent(1))),
    }
    lines
}

pub fn format_bulk_outcome(outcome: &BulkOutcome) -> Vec<String> {
    let mut lines: Vec<String> = outcome
        .files
        .iter()
        .enumerate()
        .flat_map(|(i, (path, result))| bulk_entry(i + 1, path, result))
        .collect();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let failed = outcome.failed_files();
    let mut summary = format!(
        "Processed {}, {}",
        plural(outcome.images, "image"),
        plural(outcome.files.len(), "file")
    );
    if failed > 0 {
        summary.push_str(&format!(" ({failed} with errors)"));
    }
    lines.push(summary);
    lines
}

pub fn format_settings(settings: &Settings, source: &Path) -> Vec<String> {
    let mut lines = vec![format!("Settings ({})", source.display())];
    for key in TOGGLE_KEYS {
        if let Some(value) = settings.toggle(key) {
            lines.push(format!("{}{key}: {value}", indent(1)));
        }
    }
    lines.push(format!(
        "{}image_file_types: {}",
        indent(1),
        settings.image_file_types.join(", ")
    ));
    lines.push(format!("{}codec: {}", indent(1), settings.codec));
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
