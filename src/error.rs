use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("please upload exactly one file")]
    MissingUpload,

    #[error("uploaded file is empty: {0}")]
    EmptyUpload(String),

    #[error("unreadable upload: {0}")]
    UnreadableUpload(String),

    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("container read failed: {0}")]
    Container(String),

    #[error("container support not compiled in (enable the `hdf5` feature)")]
    ContainerUnsupported,

    #[error("unsupported element type in {path}: {element}")]
    UnsupportedElement { path: String, element: String },

    #[error("invalid label at {path}[{index}]: {message}")]
    InvalidLabel {
        path: String,
        index: usize,
        message: String,
    },

    #[error("unsupported image shape {shape:?}: {message}")]
    ImageShape { shape: Vec<usize>, message: String },

    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    #[error("array serialization failed: {0}")]
    ArrayWrite(String),

    #[error("DICOM read failed for {path}: {message}")]
    Dicom { path: String, message: String },

    #[error("NIfTI read failed for {path}: {message}")]
    Nifti { path: String, message: String },

    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// How a failed request is reported to whoever triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    ClientError,
    NotFound,
    ServerError,
}

impl ErrorStatus {
    pub fn http_code(self) -> u16 {
        match self {
            ErrorStatus::ClientError => 400,
            ErrorStatus::NotFound => 404,
            ErrorStatus::ServerError => 500,
        }
    }
}

impl ConvertError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            ConvertError::MissingUpload
            | ConvertError::EmptyUpload(_)
            | ConvertError::UnreadableUpload(_)
            | ConvertError::InvalidFileType(_)
            | ConvertError::BadRequest(_) => ErrorStatus::ClientError,
            ConvertError::NotFound(_) => ErrorStatus::NotFound,
            _ => ErrorStatus::ServerError,
        }
    }
}
