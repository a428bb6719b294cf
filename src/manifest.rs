use std::path::{Path, PathBuf};

use tracing::info;

use crate::document::{INDEX_INDENT, write_json};
use crate::error::ConvertError;
use crate::index::OutputIndex;

pub const MANIFEST_FILE: &str = "nestedDict.json";

pub fn manifest_path(output_root: &Path) -> PathBuf {
    output_root.join(MANIFEST_FILE)
}

pub fn write_manifest(output_root: &Path, index: &OutputIndex) -> Result<PathBuf, ConvertError> {
    let path = manifest_path(output_root);
    write_json(&path, index, INDEX_INDENT)?;
    info!(path = %path.display(), entries = index.len(), "wrote manifest");
    Ok(path)
}
