use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Container,
    Archive,
    Dicom,
    Nifti,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Container => write!(f, "container"),
            InputKind::Archive => write!(f, "archive"),
            InputKind::Dicom => write!(f, "dicom"),
            InputKind::Nifti => write!(f, "nifti"),
        }
    }
}

/// Declared name of an uploaded file, validated against the extension allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    name: String,
    kind: InputKind,
}

impl UploadName {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }
}

impl fmt::Display for UploadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for UploadName {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        if name.is_empty() {
            return Err(ConvertError::BadRequest("no selected file".to_string()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConvertError::BadRequest(format!(
                "file name must not contain a path: {name}"
            )));
        }

        let lower = name.to_ascii_lowercase();
        let extension = if lower.ends_with(".nii.gz") {
            "nii.gz"
        } else {
            match lower.rsplit_once('.') {
                Some((_, ext)) => ext,
                None => return Err(ConvertError::InvalidFileType(name.to_string())),
            }
        };

        let kind = match extension {
            "h5" | "hdf5" => InputKind::Container,
            "zip" => InputKind::Archive,
            "dcm" | "dicom" => InputKind::Dicom,
            "nii" | "nii.gz" => InputKind::Nifti,
            _ => return Err(ConvertError::InvalidFileType(name.to_string())),
        };

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Per-file formats understood by the imaging converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Dicom,
    Nifti,
}

impl SliceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".dcm") || name.ends_with(".dicom") {
            Some(SliceKind::Dicom)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Some(SliceKind::Nifti)
        } else {
            None
        }
    }
}
