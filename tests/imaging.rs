mod common;

use std::fs;
use std::io::Write;

use assert_matches::assert_matches;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Value, json};

use scan_convert::error::ConvertError;
use scan_convert::imaging::{convert_tree, read_log};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn dicom_metadata_keeps_only_listed_fields() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    common::write_dicom(&input.join("series1/IM0001.dcm"), 3, 4);

    let outcome = convert_tree(&input, &output, 90).unwrap();

    assert_eq!(outcome.processed.len(), 1);
    let meta = read_json(&output.join("series1/meta/IM0001.json"));
    assert_eq!(meta["PatientName"], json!("Doe^Jane"));
    assert_eq!(meta["PatientID"], json!("PID-0001"));
    assert_eq!(meta["Modality"], json!("MR"));
    assert_eq!(meta["Rows"], json!("3"));
    assert_eq!(meta["Columns"], json!("4"));
    assert_eq!(meta["SOPInstanceUID"], json!(common::SOP_INSTANCE_UID));
    assert_eq!(meta["TransferSyntaxUID"], json!("1.2.840.10008.1.2.1"));
    assert!(meta.get("StudyDate").is_none());
    assert!(meta.get("PixelData").is_none());

    let image = image::open(output.join("series1/image/IM0001.jpg")).unwrap();
    assert_eq!((image.width(), image.height()), (4, 3));
}

#[test]
fn metadata_documents_use_four_space_indent() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    common::write_nifti(&input.join("vol.nii"), [4, 5, 6], "T1");

    convert_tree(&input, &output, 90).unwrap();

    let content = fs::read_to_string(output.join("meta/vol.json")).unwrap();
    assert!(content.starts_with("{\n    \"dim\": [\n        4,"));
}

#[test]
fn nifti_middle_slice_and_header_fields() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    common::write_nifti(&input.join("brain/scan.nii"), [4, 5, 6], "test volume");

    convert_tree(&input, &output, 90).unwrap();

    let meta = read_json(&output.join("brain/meta/scan.json"));
    assert_eq!(meta["dim"], json!([4, 5, 6]));
    assert_eq!(meta["datatype"], json!("float32"));
    assert_eq!(meta["voxel_size"], json!([1.0, 2.0, 3.0]));
    assert_eq!(meta["descrip"], json!("test volume"));
    assert_eq!(meta["xyzt_units"], json!(["mm", "sec"]));
    assert_eq!(meta["qform_code"], json!(1));
    assert_eq!(meta["sform_code"], json!(0));

    let image = image::open(output.join("brain/image/scan.jpg")).unwrap();
    assert_eq!((image.width(), image.height()), (5, 4));
}

#[test]
fn malformed_nifti_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    common::write_nifti(&input.join("a_good.nii"), [3, 3, 3], "");
    fs::write(input.join("b_broken.nii"), b"definitely not a nifti header").unwrap();
    common::write_nifti(&input.join("c_good.nii"), [2, 2, 2], "");

    let outcome = convert_tree(&input, &output, 90).unwrap();

    assert_eq!(outcome.processed.len(), 2);
    assert_eq!(outcome.skipped, vec!["b_broken.nii".to_string()]);
    assert!(output.join("image/a_good.jpg").is_file());
    assert!(output.join("image/c_good.jpg").is_file());
    assert!(!output.join("image/b_broken.jpg").exists());
    assert!(!output.join("meta/b_broken.json").exists());
}

#[test]
fn truncated_nifti_volume_fails_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).unwrap();
    let mut bytes = common::nifti_bytes([4, 4, 4], "");
    bytes.truncate(352 + 10);
    fs::write(input.join("trunc.nii"), bytes).unwrap();

    let result = convert_tree(&input, &output, 90);

    assert_matches!(result, Err(ConvertError::Nifti { path, .. }) if path.ends_with("trunc.nii"));
    assert!(!output.join("image/trunc.jpg").exists());
}

#[test]
fn text_log_lists_files_in_processing_order() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    common::write_dicom(&input.join("s/IM2.dcm"), 2, 2);
    common::write_dicom(&input.join("s/IM1.dcm"), 2, 2);
    common::write_nifti(&input.join("s/vol.nii"), [2, 2, 2], "");

    convert_tree(&input, &output, 90).unwrap();
    // A second run over the same output truncates instead of appending.
    convert_tree(&input, &output, 90).unwrap();

    let lines = read_log(&output.join("s")).unwrap();
    assert_eq!(
        lines,
        vec![
            r#"{"IM1.jpg": "IM1.json"}"#,
            r#"{"IM2.jpg": "IM2.json"}"#,
            r#"{"vol.jpg": "vol.json"}"#,
        ]
    );
}

#[test]
fn compressed_nifti_keeps_inner_extension_in_stem() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).unwrap();
    let raw = common::nifti_bytes([3, 3, 2], "gz");
    let file = fs::File::create(input.join("scan.nii.gz")).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&raw).unwrap();
    encoder.finish().unwrap();

    convert_tree(&input, &output, 90).unwrap();

    assert!(output.join("image/scan.nii.jpg").is_file());
    assert!(output.join("meta/scan.nii.json").is_file());
}

#[test]
fn every_subdirectory_gets_a_triplet() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(input.join("empty/nested")).unwrap();
    fs::write(input.join("empty/readme.txt"), b"notes").unwrap();

    let outcome = convert_tree(&input, &output, 90).unwrap();

    for dir in ["empty", "empty/nested"] {
        for sub in ["image", "meta", "text"] {
            assert!(output.join(dir).join(sub).is_dir(), "{dir}/{sub}");
        }
    }
    assert!(outcome.processed.is_empty());
    assert_eq!(outcome.directories, vec!["empty", "empty/nested"]);
}

#[test]
fn corrupt_dicom_fails_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("bad.dcm"), b"not dicom at all").unwrap();

    let result = convert_tree(&input, &output, 90);

    assert_matches!(result, Err(ConvertError::Dicom { .. }));
}
