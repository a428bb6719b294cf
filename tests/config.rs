use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use scan_convert::config::{Config, ConfigLoader};
use scan_convert::error::ConvertError;

#[test]
fn explicit_file_overrides_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scan-convert.json");
    fs::write(
        &path,
        r#"{"output_dir": "out", "sample_seed": 11, "jpeg_quality": 90}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("out"));
    assert_eq!(resolved.upload_dir, Utf8PathBuf::from("uploads"));
    assert_eq!(resolved.sample_seed, Some(11));
    assert_eq!(resolved.jpeg_quality, 90);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(Some(path.to_str().unwrap())),
        Err(ConvertError::ConfigRead(_))
    );
}

#[test]
fn malformed_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("bad.json");
    fs::write(&path, "{ output_dir: ").unwrap();
    assert_matches!(
        ConfigLoader::resolve(Some(path.to_str().unwrap())),
        Err(ConvertError::ConfigParse(_))
    );
}

#[test]
fn quality_above_hundred_is_rejected() {
    let config = Config {
        jpeg_quality: Some(101),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(ConvertError::InvalidConfig(_))
    );
}
