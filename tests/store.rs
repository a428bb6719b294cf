use std::fs;
use std::io::{Cursor, Read};

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use zip::ZipArchive;

use scan_convert::error::{ConvertError, ErrorStatus};
use scan_convert::store::OutputStore;

fn populated_store() -> (tempfile::TempDir, OutputStore) {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("output");
    fs::create_dir_all(root.join("trainXImages")).unwrap();
    fs::write(root.join("trainXImages/img0.jpg"), b"jpeg-0").unwrap();
    fs::write(root.join("trainXImages/img1.jpg"), b"jpeg-1").unwrap();
    fs::write(root.join("trainXImages/notes.txt"), b"text").unwrap();
    fs::create_dir_all(root.join("trainXImages/nested")).unwrap();
    fs::write(root.join("trainXImages/nested/deep.png"), b"png").unwrap();
    fs::write(root.join("nestedDict.json"), b"{}").unwrap();
    let store = OutputStore::new(Utf8PathBuf::from_path_buf(root).unwrap());
    (temp, store)
}

#[test]
fn list_returns_immediate_children() {
    let (_temp, store) = populated_store();
    let listing = store.list("").unwrap();
    assert_eq!(listing.entries, vec!["nestedDict.json", "trainXImages"]);

    let listing = store.list("trainXImages").unwrap();
    assert_eq!(
        listing.entries,
        vec!["img0.jpg", "img1.jpg", "nested", "notes.txt"]
    );
}

#[test]
fn list_images_filters_by_extension() {
    let (_temp, store) = populated_store();
    let images = store.list_images("trainXImages").unwrap();
    assert_eq!(images, vec!["trainXImages/img0.jpg", "trainXImages/img1.jpg"]);
}

#[test]
fn fetch_returns_file_bytes() {
    let (_temp, store) = populated_store();
    assert_eq!(store.fetch("trainXImages/img1.jpg").unwrap(), b"jpeg-1");
    assert_matches!(
        store.fetch("trainXImages/img9.jpg"),
        Err(ConvertError::NotFound(_))
    );
}

#[test]
fn bundle_of_missing_folder_is_not_found() {
    let (_temp, store) = populated_store();
    let err = store.bundle(Some("doesNotExist")).unwrap_err();
    assert_matches!(err, ConvertError::NotFound(_));
    assert_eq!(err.status(), ErrorStatus::NotFound);
    assert_eq!(err.status().http_code(), 404);
}

#[test]
fn bundle_entries_are_relative_to_the_folder() {
    let (_temp, store) = populated_store();
    let bundle = store.bundle(Some("trainXImages")).unwrap();
    assert_eq!(bundle.file_name, "trainXImages.zip");

    let mut archive = ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["img0.jpg", "img1.jpg", "nested/deep.png", "notes.txt"]
    );

    let mut content = String::new();
    archive
        .by_name("img0.jpg")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "jpeg-0");
}

#[test]
fn paths_escaping_the_root_are_rejected() {
    let (_temp, store) = populated_store();
    let err = store.fetch("../secret.txt").unwrap_err();
    assert_matches!(err, ConvertError::BadRequest(_));
    assert_eq!(err.status(), ErrorStatus::ClientError);
    assert_matches!(store.list("/etc"), Err(ConvertError::BadRequest(_)));
    assert_matches!(store.bundle(Some("..")), Err(ConvertError::BadRequest(_)));
}
