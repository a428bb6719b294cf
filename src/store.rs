use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::error::ConvertError;
use crate::fs_util::{reset_dir, resolve_under, zip_folder};

pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Read side of the output tree: listing, single-file fetch and zip bundles.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub path: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Bundle {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl OutputStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn reset(&self) -> Result<(), ConvertError> {
        reset_dir(self.root.as_std_path())
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, ConvertError> {
        resolve_under(self.root.as_std_path(), relative)
    }

    /// Names of the immediate children of `relative`, sorted.
    pub fn list(&self, relative: &str) -> Result<Listing, ConvertError> {
        let dir = self.resolve(relative)?;
        if !dir.is_dir() {
            return Err(ConvertError::NotFound(format!("folder {relative}")));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|err| ConvertError::Filesystem(err.to_string()))? {
            let entry = entry.map_err(|err| ConvertError::Filesystem(err.to_string()))?;
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();
        Ok(Listing {
            path: relative.to_string(),
            entries,
        })
    }

    /// Image children of `folder`, as paths relative to the output root.
    pub fn list_images(&self, folder: &str) -> Result<Vec<String>, ConvertError> {
        let listing = self.list(folder)?;
        let prefix = folder.trim_end_matches('/');
        Ok(listing
            .entries
            .into_iter()
            .filter(|name| {
                let lower = name.to_ascii_lowercase();
                IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            })
            .map(|name| {
                if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                }
            })
            .collect())
    }

    pub fn fetch(&self, relative: &str) -> Result<Vec<u8>, ConvertError> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(ConvertError::NotFound(format!("file {relative}")));
        }
        fs::read(&path).map_err(|err| ConvertError::Filesystem(err.to_string()))
    }

    /// Zips a folder below the root. Nothing is produced unless the folder exists.
    pub fn bundle(&self, folder: Option<&str>) -> Result<Bundle, ConvertError> {
        let folder = folder
            .map(|folder| folder.trim_matches('/'))
            .filter(|folder| !folder.is_empty())
            .ok_or_else(|| ConvertError::BadRequest("folder name is required".to_string()))?;
        let dir = self.resolve(folder)?;
        if !dir.is_dir() {
            return Err(ConvertError::NotFound(format!("folder {folder}")));
        }
        let bytes = zip_folder(&dir)?;
        let base = folder.rsplit('/').next().unwrap_or(folder);
        Ok(Bundle {
            file_name: format!("{base}.zip"),
            bytes,
        })
    }
}
