//! Rendition path resolution.
//!
//! One uploaded image turns into several files on disk:
//!
//! ```text
//! uploads/2024/05/
//! ├── IMG_0042.jpg              # original (canonical path)
//! ├── IMG_0042-scaled.jpg       # "big image" master, when the original is huge
//! ├── IMG_0042-150x150.jpg      # generated size variants
//! ├── IMG_0042-300x200.jpg
//! └── IMG_0042-1024x683.jpg
//! ```
//!
//! [`resolve_paths`] derives the full set from the canonical path and the
//! stored [`RenditionMetadata`]. Every rendition is assumed to live in the
//! same directory as the canonical path; only each descriptor's file name is
//! used. Layouts that put renditions elsewhere are not found, and the bulk
//! pre-check reports them as missing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Stored description of the renditions generated for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenditionMetadata {
    /// The scaled master, often stored relative to the uploads root
    /// (e.g. `2024/05/IMG_0042-scaled.jpg`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// The untouched pre-scale original, when a scaled master replaced it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    /// Generated size variants keyed by size name (`thumbnail`, `medium`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sizes: BTreeMap<String, SizeVariant>,
}

/// One generated size variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Join the file-name part of `name` onto `dir`. Empty names are ignored.
fn sibling(dir: &Path, name: &str) -> Option<PathBuf> {
    let file_name = Path::new(name).file_name()?;
    Some(dir.join(file_name))
}

/// Every on-disk path for one image: the canonical original plus each
/// rendition named in `metadata`, deduplicated.
///
/// Missing metadata yields just the canonical path.
pub fn resolve_paths(original: &Path, metadata: Option<&RenditionMetadata>) -> BTreeSet<PathBuf> {
    let mut paths = BTreeSet::new();
    paths.insert(original.to_path_buf());

    let Some(meta) = metadata else {
        return paths;
    };
    let dir = original.parent().unwrap_or_else(|| Path::new(""));

    let descriptors = meta
        .file
        .iter()
        .chain(meta.original_image.iter())
        .chain(meta.sizes.values().map(|size| &size.file));

    paths.extend(descriptors.filter_map(|name| sibling(dir, name)));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(file: &str) -> SizeVariant {
        SizeVariant {
            file: file.to_string(),
            ..SizeVariant::default()
        }
    }

    fn set(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn no_metadata_is_just_original() {
        let paths = resolve_paths(Path::new("/up/2024/img.jpg"), None);
        assert_eq!(paths, set(&["/up/2024/img.jpg"]));
    }

    #[test]
    fn empty_metadata_is_just_original() {
        let meta = RenditionMetadata::default();
        let paths = resolve_paths(Path::new("/up/2024/img.jpg"), Some(&meta));
        assert_eq!(paths, set(&["/up/2024/img.jpg"]));
    }

    #[test]
    fn scaled_and_sizes_are_siblings() {
        let meta = RenditionMetadata {
            file: Some("c.jpg".into()),
            original_image: None,
            sizes: BTreeMap::from([
                ("thumbnail".to_string(), size("a.jpg")),
                ("medium".to_string(), size("b.jpg")),
            ]),
        };
        let paths = resolve_paths(Path::new("/up/2024/img.jpg"), Some(&meta));
        assert_eq!(
            paths,
            set(&[
                "/up/2024/img.jpg",
                "/up/2024/a.jpg",
                "/up/2024/b.jpg",
                "/up/2024/c.jpg"
            ])
        );
    }

    #[test]
    fn scaled_file_uses_basename_only() {
        let meta = RenditionMetadata {
            file: Some("2024/img-scaled.jpg".into()),
            ..RenditionMetadata::default()
        };
        let paths = resolve_paths(Path::new("/up/2024/img.jpg"), Some(&meta));
        assert!(paths.contains(Path::new("/up/2024/img-scaled.jpg")));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn pre_scale_original_included() {
        let meta = RenditionMetadata {
            file: Some("2024/img-scaled.jpg".into()),
            original_image: Some("img.jpg".into()),
            sizes: BTreeMap::from([("thumbnail".to_string(), size("img-150x150.jpg"))]),
        };
        // Canonical path is the pre-scale original, which dedups with `original_image`
        let paths = resolve_paths(Path::new("/up/2024/img.jpg"), Some(&meta));
        assert_eq!(
            paths,
            set(&[
                "/up/2024/img.jpg",
                "/up/2024/img-scaled.jpg",
                "/up/2024/img-150x150.jpg"
            ])
        );
    }

    #[test]
    fn duplicate_size_files_dedup() {
        let meta = RenditionMetadata {
            sizes: BTreeMap::from([
                ("thumbnail".to_string(), size("img-150x150.jpg")),
                ("woocommerce_gallery".to_string(), size("img-150x150.jpg")),
            ]),
            ..RenditionMetadata::default()
        };
        let paths = resolve_paths(Path::new("/up/img.jpg"), Some(&meta));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn empty_names_ignored() {
        let meta = RenditionMetadata {
            file: Some(String::new()),
            original_image: Some(String::new()),
            sizes: BTreeMap::from([("thumbnail".to_string(), size(""))]),
        };
        let paths = resolve_paths(Path::new("/up/img.jpg"), Some(&meta));
        assert_eq!(paths, set(&["/up/img.jpg"]));
    }

    #[test]
    fn deserializes_stored_metadata() {
        let json = r#"{
            "file": "2024/05/IMG_0042-scaled.jpg",
            "original_image": "IMG_0042.jpg",
            "sizes": {
                "thumbnail": {"file": "IMG_0042-150x150.jpg", "width": 150, "height": 150, "mime_type": "image/jpeg"},
                "medium": {"file": "IMG_0042-300x200.jpg"}
            }
        }"#;
        let meta: RenditionMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.sizes["thumbnail"].width, Some(150));
        assert_eq!(meta.sizes["medium"].mime_type, None);

        let paths = resolve_paths(Path::new("/up/2024/05/IMG_0042.jpg"), Some(&meta));
        assert_eq!(paths.len(), 4);
    }
}
