//! Converts a directory tree of DICOM / NIfTI files into mirrored
//! `image/`, `meta/` and `text/` subtrees.

pub mod dicom;
pub mod nifti;

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::{META_INDENT, MetaDocument, write_json};
use crate::domain::SliceKind;
use crate::error::ConvertError;
use crate::fs_util::ensure_dir;
use crate::render::{self, Raster};

pub const IMAGE_DIR: &str = "image";
pub const META_DIR: &str = "meta";
pub const TEXT_DIR: &str = "text";
pub const TEXT_LOG: &str = "file.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFile {
    pub source: String,
    pub image: String,
    pub meta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImagingOutcome {
    /// Output directories (relative to the output root) holding a triplet.
    pub directories: Vec<String>,
    pub processed: Vec<ProcessedFile>,
    pub skipped: Vec<String>,
}

/// Everything but the last extension: `scan.nii.gz` -> `scan.nii`.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

fn relative_name(path: &Path) -> String {
    let joined = path
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub struct ImagingConverter<'a> {
    output_root: &'a Path,
    jpeg_quality: u8,
    triplets: Vec<PathBuf>,
    started_logs: HashSet<PathBuf>,
    outcome: ImagingOutcome,
}

impl<'a> ImagingConverter<'a> {
    pub fn new(output_root: &'a Path, jpeg_quality: u8) -> Self {
        Self {
            output_root,
            jpeg_quality,
            triplets: Vec::new(),
            started_logs: HashSet::new(),
            outcome: ImagingOutcome::default(),
        }
    }

    /// Lays out a triplet for every subdirectory, then converts files in
    /// sorted walk order.
    pub fn convert(mut self, input_root: &Path) -> Result<ImagingOutcome, ConvertError> {
        ensure_dir(self.output_root)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(input_root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|err| ConvertError::Filesystem(err.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(input_root)
                .map_err(|err| ConvertError::Filesystem(err.to_string()))?
                .to_path_buf();
            if entry.file_type().is_dir() {
                self.ensure_triplet(&relative)?;
            } else if entry.file_type().is_file() {
                files.push(relative);
            }
        }

        for relative in files {
            let Some(kind) = SliceKind::from_path(&relative) else {
                debug!(path = %relative.display(), "ignoring non-imaging file");
                continue;
            };
            self.convert_file(input_root, &relative, kind)?;
        }

        info!(
            processed = self.outcome.processed.len(),
            skipped = self.outcome.skipped.len(),
            "imaging conversion finished"
        );
        Ok(self.outcome)
    }

    fn convert_file(
        &mut self,
        input_root: &Path,
        relative: &Path,
        kind: SliceKind,
    ) -> Result<(), ConvertError> {
        let source = input_root.join(relative);
        let (metadata, raster): (MetaDocument, Raster) = match kind {
            SliceKind::Dicom => {
                let slice = dicom::read_slice(&source)?;
                (slice.metadata, slice.raster)
            }
            SliceKind::Nifti => match nifti::read_slice(&source)? {
                Some(slice) => (slice.metadata, slice.raster),
                None => {
                    self.outcome.skipped.push(relative_name(relative));
                    return Ok(());
                }
            },
        };

        let parent = relative.parent().unwrap_or_else(|| Path::new(""));
        let dir = self.ensure_triplet(parent)?;
        let file_name = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_stem(&file_name);
        let image_name = format!("{stem}.jpg");
        let meta_name = format!("{stem}.json");

        render::write_jpeg(
            &dir.join(IMAGE_DIR).join(&image_name),
            &raster,
            self.jpeg_quality,
        )?;
        write_json(&dir.join(META_DIR).join(&meta_name), &metadata, META_INDENT)?;
        self.append_log(&dir.join(TEXT_DIR).join(TEXT_LOG), &image_name, &meta_name)?;

        info!(source = %relative.display(), image = %image_name, "converted slice file");
        let rel_dir = relative_name(parent);
        self.outcome.processed.push(ProcessedFile {
            source: relative_name(relative),
            image: format!("{rel_dir}/{IMAGE_DIR}/{image_name}"),
            meta: format!("{rel_dir}/{META_DIR}/{meta_name}"),
        });
        Ok(())
    }

    fn ensure_triplet(&mut self, relative: &Path) -> Result<PathBuf, ConvertError> {
        let dir = self.output_root.join(relative);
        if !self.triplets.contains(&dir) {
            for sub in [IMAGE_DIR, META_DIR, TEXT_DIR] {
                ensure_dir(&dir.join(sub))?;
            }
            self.triplets.push(dir.clone());
            self.outcome.directories.push(relative_name(relative));
        }
        Ok(dir)
    }

    /// Truncates the log on its first line of the run, appends afterwards.
    fn append_log(&mut self, log: &Path, image: &str, meta: &str) -> Result<(), ConvertError> {
        let first = self.started_logs.insert(log.to_path_buf());
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(first)
            .append(!first)
            .open(log)
            .map_err(|err| ConvertError::Filesystem(format!("open {}: {err}", log.display())))?;
        let line = format!(
            "{{{}: {}}}\n",
            serde_json::to_string(image).map_err(|err| ConvertError::Serialize(err.to_string()))?,
            serde_json::to_string(meta).map_err(|err| ConvertError::Serialize(err.to_string()))?,
        );
        file.write_all(line.as_bytes())
            .map_err(|err| ConvertError::Filesystem(err.to_string()))
    }
}

/// Convenience wrapper used by the upload flow.
pub fn convert_tree(
    input_root: &Path,
    output_root: &Path,
    jpeg_quality: u8,
) -> Result<ImagingOutcome, ConvertError> {
    if !input_root.is_dir() {
        return Err(ConvertError::Filesystem(format!(
            "input folder {} does not exist",
            input_root.display()
        )));
    }
    ImagingConverter::new(output_root, jpeg_quality).convert(input_root)
}

/// Reads back one directory's text log.
pub fn read_log(dir: &Path) -> Result<Vec<String>, ConvertError> {
    let content = fs::read_to_string(dir.join(TEXT_DIR).join(TEXT_LOG))
        .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_only_the_last_extension() {
        assert_eq!(file_stem("scan.nii.gz"), "scan.nii");
        assert_eq!(file_stem("IM0001.dcm"), "IM0001");
        assert_eq!(file_stem("noext"), "noext");
    }
}
