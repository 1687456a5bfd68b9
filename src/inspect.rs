//! Read-only EXIF view of an image, for checking what a strip left behind.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error reading EXIF data from {path}: {source}")]
    Exif { path: PathBuf, source: exif::Error },
}

/// One EXIF field, already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifField {
    pub tag: String,
    /// `primary` or `thumbnail`.
    pub ifd: String,
    pub value: String,
}

/// All EXIF fields in the file at `path`. A file without EXIF data yields an
/// empty list.
pub fn read_exif(path: &Path) -> Result<Vec<ExifField>, InspectError> {
    let file = File::open(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(Vec::new()),
        Err(source) => {
            return Err(InspectError::Exif {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    Ok(exif
        .fields()
        .map(|field| ExifField {
            tag: field.tag.to_string(),
            ifd: field.ifd_num.to_string(),
            value: field.display_value().with_unit(&exif).to_string(),
        })
        .collect())
}
