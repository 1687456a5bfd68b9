//! # Strip Meta
//!
//! Removes embedded metadata (EXIF, XMP, IPTC, comments, color profiles) from
//! uploaded images, optionally keeping the ICC color profile and the
//! orientation tag so the image still looks and rotates the same afterwards.
//!
//! # Architecture: Resolve, Then Strip
//!
//! A request names one or more logical images (an upload, or a bulk action
//! over library ids). Each logical image expands into the physical files that
//! represent it, and the strip pipeline runs once per file:
//!
//! ```text
//! ids ──► renditions::resolve_paths ──► [original, -scaled, -150x150, ...]
//!                                              │
//!                                              ▼
//!                              strip::strip_metadata (one file at a time)
//! ```
//!
//! Everything is synchronous and sequential. There is no worker pool and no
//! cache; configuration is loaded once per command and passed down.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `strip-meta.toml` settings: four toggles, MIME allow-list, codec preference |
//! | [`imaging`] | [`ImageCodec`](imaging::ImageCodec) capability trait, segment + raster codecs, probe |
//! | [`strip`] | The capture → strip → restore → write pipeline for a single file |
//! | [`renditions`] | Expands an attachment into every on-disk rendition path |
//! | [`library`] | JSON media library: attachment ids, paths, rendition metadata |
//! | [`upload`] | Upload gatekeeping (toggle, codec, MIME type) in front of [`strip`] |
//! | [`bulk`] | All-or-nothing bulk strip over library ids |
//! | [`inspect`] | EXIF field listing for a single image |
//! | [`notice`] | User-facing notices, rendered as text or HTML |
//! | [`output`] | CLI formatting of strip reports and rendition sets |
//!
//! # Design Decisions
//!
//! ## Best-Effort, Not Transactional
//!
//! Inside a single file every step after `open` is allowed to fail on its own.
//! A failure to restore the ICC profile is less bad than leaving GPS
//! coordinates in the file, so the pipeline records the failure and moves on.
//! The caller gets a [`StripReport`](strip::StripReport) listing what went
//! wrong rather than an error.
//!
//! ## All-or-Nothing Bulk Pre-Check
//!
//! The bulk action resolves every path for every selected image before it
//! touches anything. If a single rendition is missing on disk the whole batch
//! is refused. See [`bulk`] for the trade-off.
//!
//! ## Codecs Are Capabilities
//!
//! The pipeline is written against [`ImageCodec`](imaging::ImageCodec) only.
//! Two implementations ship behind cargo features: a lossless segment codec
//! (`img-parts`) and a raster codec (`image`) that cannot read orientation.
//! [`imaging::probe_codec`] picks one at startup; with neither compiled in,
//! uploads pass through untouched and a standing notice says so.

pub mod bulk;
pub mod config;
pub mod imaging;
pub mod inspect;
pub mod library;
pub mod notice;
pub mod output;
pub mod renditions;
pub mod strip;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
