//! Media library — the record of uploaded attachments.
//!
//! The library is a JSON file listing every attachment with its canonical
//! path, MIME type and rendition metadata:
//!
//! ```json
//! {
//!   "attachments": [
//!     {
//!       "id": 42,
//!       "path": "uploads/2024/05/IMG_0042.jpg",
//!       "mime_type": "image/jpeg",
//!       "metadata": {
//!         "file": "2024/05/IMG_0042-scaled.jpg",
//!         "sizes": { "thumbnail": { "file": "IMG_0042-150x150.jpg" } }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Relative attachment paths are resolved against the directory containing
//! the library file, so a library can be moved together with its uploads.

use crate::renditions::{RenditionMetadata, resolve_paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Duplicate attachment id {0}")]
    DuplicateId(u64),
}

/// One uploaded media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    /// Canonical original file path.
    pub path: PathBuf,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RenditionMetadata>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// All rendition paths for this attachment.
    pub fn rendition_paths(&self) -> BTreeSet<PathBuf> {
        resolve_paths(&self.path, self.metadata.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Library {
    /// Load a library file, resolving relative attachment paths against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut library: Library =
            serde_json::from_str(&content).map_err(|source| LibraryError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for attachment in &mut library.attachments {
            if attachment.path.is_relative() {
                attachment.path = base.join(&attachment.path);
            }
        }
        library.check_unique_ids()?;
        Ok(library)
    }

    fn check_unique_ids(&self) -> Result<(), LibraryError> {
        let mut seen = BTreeSet::new();
        for attachment in &self.attachments {
            if !seen.insert(attachment.id) {
                return Err(LibraryError::DuplicateId(attachment.id));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    /// Whether `id` names an image attachment. Unknown ids are not images.
    pub fn is_image(&self, id: u64) -> bool {
        self.get(id).is_some_and(Attachment::is_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_library;
    use tempfile::TempDir;

    const LIBRARY_JSON: &str = r#"{
        "attachments": [
            {"id": 1, "path": "uploads/a.jpg", "mime_type": "image/jpeg",
             "metadata": {"sizes": {"thumbnail": {"file": "a-150x150.jpg"}}}},
            {"id": 2, "path": "/abs/clip.mp4", "mime_type": "video/mp4"}
        ]
    }"#;

    #[test]
    fn load_resolves_relative_paths() {
        let tmp = TempDir::new().unwrap();
        let library = Library::load(&write_library(tmp.path(), LIBRARY_JSON)).unwrap();

        assert_eq!(library.get(1).unwrap().path, tmp.path().join("uploads/a.jpg"));
        assert_eq!(library.get(2).unwrap().path, PathBuf::from("/abs/clip.mp4"));
    }

    #[test]
    fn image_filter() {
        let tmp = TempDir::new().unwrap();
        let library = Library::load(&write_library(tmp.path(), LIBRARY_JSON)).unwrap();

        assert!(library.is_image(1));
        assert!(!library.is_image(2));
        assert!(!library.is_image(99));
    }

    #[test]
    fn rendition_paths_from_library() {
        let tmp = TempDir::new().unwrap();
        let library = Library::load(&write_library(tmp.path(), LIBRARY_JSON)).unwrap();

        let paths = library.get(1).unwrap().rendition_paths();
        assert!(paths.contains(&tmp.path().join("uploads/a.jpg")));
        assert!(paths.contains(&tmp.path().join("uploads/a-150x150.jpg")));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let tmp = TempDir::new().unwrap();
        let json = r#"{"attachments": [
            {"id": 1, "path": "a.jpg", "mime_type": "image/jpeg"},
            {"id": 1, "path": "b.jpg", "mime_type": "image/jpeg"}
        ]}"#;
        let result = Library::load(&write_library(tmp.path(), json));
        assert!(matches!(result, Err(LibraryError::DuplicateId(1))));
    }

    #[test]
    fn missing_file_errors() {
        let result = Library::load(Path::new("/nonexistent/library.json"));
        assert!(matches!(result, Err(LibraryError::Io { .. })));
    }

    #[test]
    fn malformed_json_errors() {
        let tmp = TempDir::new().unwrap();
        let result = Library::load(&write_library(tmp.path(), "{ not json"));
        assert!(matches!(result, Err(LibraryError::Json { .. })));
    }
}
