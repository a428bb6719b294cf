use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

pub const DEFAULT_CONFIG_FILE: &str = "scan-convert.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub upload_dir: Option<String>,
    #[serde(default)]
    pub sample_seed: Option<u64>,
    #[serde(default)]
    pub jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_dir: Utf8PathBuf,
    pub upload_dir: Utf8PathBuf,
    pub sample_seed: Option<u64>,
    pub jpeg_quality: u8,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("output"),
            upload_dir: Utf8PathBuf::from("uploads"),
            sample_seed: None,
            jpeg_quality: 75,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ConvertError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConvertError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ConvertError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ConvertError> {
        let defaults = ResolvedConfig::default();

        let jpeg_quality = config.jpeg_quality.unwrap_or(defaults.jpeg_quality);
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ConvertError::InvalidConfig(format!(
                "jpeg_quality must be within 1..=100, got {jpeg_quality}"
            )));
        }

        Ok(ResolvedConfig {
            output_dir: config
                .output_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.output_dir),
            upload_dir: config
                .upload_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            sample_seed: config.sample_seed,
            jpeg_quality,
        })
    }
}
