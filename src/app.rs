use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::container::{ContainerOpener, Hdf5Opener};
use crate::domain::{InputKind, UploadName};
use crate::error::ConvertError;
use crate::fs_util::{ensure_dir, extract_zip, reset_dir};
use crate::imaging::convert_tree;
use crate::manifest::write_manifest;
use crate::store::OutputStore;
use crate::walker::{HierarchyWalker, WalkOptions};

/// Staging folder below the upload directory holding the files handed to the
/// imaging converter.
pub const EXTRACTED_DIR: &str = "extracted";

pub const SUCCESS_MESSAGE: &str = "File successfully uploaded and processed";

#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub message: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_path: String,
    pub kind: InputKind,
    pub output_files: Vec<String>,
    pub skipped: Vec<String>,
    pub converted_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<O: ContainerOpener = Hdf5Opener> {
    config: ResolvedConfig,
    store: OutputStore,
    opener: O,
}

impl App<Hdf5Opener> {
    pub fn from_config(config: ResolvedConfig) -> Self {
        Self::new(config, Hdf5Opener)
    }
}

impl<O: ContainerOpener> App<O> {
    pub fn new(config: ResolvedConfig, opener: O) -> Self {
        let store = OutputStore::new(config.output_dir.clone());
        Self {
            config,
            store,
            opener,
        }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    fn output_root(&self) -> &Path {
        self.config.output_dir.as_std_path()
    }

    fn upload_root(&self) -> &Path {
        self.config.upload_dir.as_std_path()
    }

    /// The upload flow: validate, wipe output and staging, stage, dispatch.
    ///
    /// `file_name` is the declared name of the upload and drives dispatch; it
    /// defaults to the file name of `upload`.
    pub fn convert(
        &self,
        upload: Option<&Path>,
        file_name: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<ConvertReport, ConvertError> {
        let upload = upload.ok_or(ConvertError::MissingUpload)?;
        let declared = match file_name {
            Some(name) => name.to_string(),
            None => upload
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let name: UploadName = declared.parse()?;

        let bytes = fs::read(upload).map_err(|err| {
            ConvertError::UnreadableUpload(format!("{}: {err}", upload.display()))
        })?;
        if bytes.is_empty() {
            return Err(ConvertError::EmptyUpload(name.to_string()));
        }

        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Stage; {} ({})", name, name.kind()),
            elapsed: None,
        });
        self.store.reset()?;
        reset_dir(self.upload_root())?;
        let staged = self.upload_root().join(name.as_str());
        fs::write(&staged, &bytes).map_err(|err| {
            ConvertError::Filesystem(format!("stage {}: {err}", staged.display()))
        })?;

        sink.event(ProgressEvent {
            message: format!("phase=Convert; {}", name.kind()),
            elapsed: Some(started.elapsed()),
        });
        let (output_files, skipped) = match name.kind() {
            InputKind::Container => (self.convert_container(&staged, sink, started)?, Vec::new()),
            InputKind::Archive => {
                let extracted = self.upload_root().join(EXTRACTED_DIR);
                extract_zip(&staged, &extracted)?;
                self.convert_imaging(&extracted)?
            }
            InputKind::Dicom | InputKind::Nifti => {
                let extracted = self.upload_root().join(EXTRACTED_DIR);
                ensure_dir(&extracted)?;
                fs::write(extracted.join(name.as_str()), &bytes)
                    .map_err(|err| ConvertError::Filesystem(err.to_string()))?;
                self.convert_imaging(&extracted)?
            }
        };

        info!(
            file = %name,
            outputs = output_files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "conversion finished"
        );

        Ok(ConvertReport {
            message: SUCCESS_MESSAGE.to_string(),
            file_name: name.to_string(),
            file_size: bytes.len() as u64,
            file_path: staged.display().to_string(),
            kind: name.kind(),
            output_files,
            skipped,
            converted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    fn convert_container(
        &self,
        staged: &Path,
        sink: &dyn ProgressSink,
        started: Instant,
    ) -> Result<Vec<String>, ConvertError> {
        let source = self.opener.open(staged)?;
        let options = WalkOptions {
            jpeg_quality: self.config.jpeg_quality,
            sample_seed: self.config.sample_seed,
        };
        let outcome = HierarchyWalker::new(self.output_root(), options).walk(source.as_ref())?;

        sink.event(ProgressEvent {
            message: format!("phase=Manifest; {} artifacts", outcome.artifacts.len()),
            elapsed: Some(started.elapsed()),
        });
        write_manifest(self.output_root(), &outcome.index)?;
        Ok(outcome.index.keys().map(str::to_string).collect())
    }

    fn convert_imaging(&self, input: &Path) -> Result<(Vec<String>, Vec<String>), ConvertError> {
        let outcome = convert_tree(input, self.output_root(), self.config.jpeg_quality)?;
        Ok((outcome.directories, outcome.skipped))
    }
}
