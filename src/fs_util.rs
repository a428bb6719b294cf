use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ConvertError;

/// Removes `dir` with everything below it and recreates it empty.
pub fn reset_dir(dir: &Path) -> Result<(), ConvertError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|err| {
            ConvertError::Filesystem(format!("remove {}: {err}", dir.display()))
        })?;
    }
    ensure_dir(dir)
}

pub fn ensure_dir(dir: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(dir)
        .map_err(|err| ConvertError::Filesystem(format!("create {}: {err}", dir.display())))
}

pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), ConvertError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        ConvertError::UnreadableUpload(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ConvertError::UnreadableUpload(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| ConvertError::Archive(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(ConvertError::Archive(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            ensure_dir(&entry_path)?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            ensure_dir(parent)?;
        }
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|err| ConvertError::Archive(err.to_string()))?;
    }
    Ok(())
}

/// Deflate-compresses every file below `folder`, naming entries relative to it.
pub fn zip_folder(folder: &Path) -> Result<Vec<u8>, ConvertError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|err| ConvertError::Filesystem(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(folder)
            .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(name, options)
            .map_err(|err| ConvertError::Archive(err.to_string()))?;
        let content =
            fs::read(entry.path()).map_err(|err| ConvertError::Filesystem(err.to_string()))?;
        writer
            .write_all(&content)
            .map_err(|err| ConvertError::Archive(err.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|err| ConvertError::Archive(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Writes through a temporary sibling file and renames it over `path`, so
/// readers never see a half-written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ConvertError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".scan-convert")
        .tempfile_in(parent)
        .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| ConvertError::Filesystem(format!("persist {}: {err}", path.display())))?;
    Ok(())
}

/// Joins a caller-supplied relative path onto `root`, refusing anything that
/// could escape it.
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf, ConvertError> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ConvertError::BadRequest(format!(
                    "path must stay inside the output folder: {relative}"
                )));
            }
        }
    }
    Ok(resolved)
}
