//! User-facing notices.
//!
//! A [`Notice`] is a short status message with a severity. The CLI renders
//! notices either as plain text for the terminal or as HTML fragments for
//! embedding in an admin page:
//!
//! ```text
//! <div class="notice notice-success is-dismissible">
//!   <p>strip-meta: 2 images including generated thumbnail sizes were processed.</p>
//! </div>
//! ```
//!
//! Notices with details (the EXIF view) render the details in a collapsed
//! `<details>` block.

use crate::inspect::ExifField;
use maud::{Markup, html};
use std::fmt;

const PREFIX: &str = "strip-meta";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
    Success,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub dismissible: bool,
    pub message: String,
    /// Extra lines shown collapsed under the message.
    pub details: Vec<String>,
}

impl Notice {
    fn new(kind: NoticeKind, dismissible: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            dismissible,
            message: format!("{PREFIX}: {}", message.into()),
            details: Vec::new(),
        }
    }

    /// Standing notice while no image codec is compiled in. Not dismissible.
    pub fn codec_missing() -> Self {
        Self::new(
            NoticeKind::Error,
            false,
            "compatible image codec not found. This tool requires the \"segment-codec\" \
             or \"raster-codec\" feature - rebuild with at least one of them enabled.",
        )
    }

    pub fn stripping_disabled() -> Self {
        Self::new(NoticeKind::Error, true, "stripping is currently disabled.")
    }

    /// Result of a bulk run. `count` is logical images, not files.
    pub fn bulk_processed(count: usize) -> Self {
        let message = if count == 1 {
            format!("{count} image including generated thumbnail sizes was processed.")
        } else {
            format!("{count} images including generated thumbnail sizes were processed.")
        };
        Self::new(NoticeKind::Success, true, message)
    }

    pub fn bulk_missing_paths() -> Self {
        Self::new(
            NoticeKind::Error,
            true,
            "unable to locate all image paths. This might be due to a non-standard \
             uploads directory location.",
        )
    }

    pub fn exif_details(fields: &[ExifField]) -> Self {
        let mut notice = Self::new(NoticeKind::Info, true, "expand for image EXIF data");
        notice.details = fields
            .iter()
            .map(|f| format!("{} [{}]: {}", f.tag, f.ifd, f.value))
            .collect();
        notice
    }

    pub fn codec_active(name: &str, library: &str) -> Self {
        Self::new(
            NoticeKind::Info,
            false,
            format!("compatible image codec active: {name} ({library})"),
        )
    }

    fn css_class(&self) -> String {
        let mut class = format!("notice notice-{}", self.kind);
        if self.dismissible {
            class.push_str(" is-dismissible");
        }
        class
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("[{}] {}", self.kind, self.message);
        for line in &self.details {
            out.push_str("\n    ");
            out.push_str(line);
        }
        out
    }

    pub fn render_html(&self) -> Markup {
        html! {
            div class=(self.css_class()) {
                @if self.details.is_empty() {
                    p { (self.message) }
                } @else {
                    details {
                        summary { (self.message) }
                        pre { (self.details.join("\n")) }
                    }
                }
            }
        }
    }
}
