#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::mem::InMemElement;
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const SOP_INSTANCE_UID: &str = "1.2.826.0.1.3680043.2.1125.1";

fn text(tag: dicom_core::Tag, vr: VR, value: &str) -> InMemElement {
    DataElement::new(tag, vr, PrimitiveValue::from(value))
}

fn short(tag: dicom_core::Tag, value: u16) -> InMemElement {
    DataElement::new(tag, VR::US, PrimitiveValue::from(value))
}

/// An 8-bit MONOCHROME2 MR slice with a gradient payload.
pub fn write_dicom(path: &Path, rows: u16, columns: u16) {
    let mut object = InMemDicomObject::new_empty();
    object.put(text(tags::SOP_CLASS_UID, VR::UI, uids::MR_IMAGE_STORAGE));
    object.put(text(tags::SOP_INSTANCE_UID, VR::UI, SOP_INSTANCE_UID));
    object.put(text(tags::STUDY_DATE, VR::DA, "20240101"));
    object.put(text(tags::MODALITY, VR::CS, "MR"));
    object.put(text(tags::PATIENT_NAME, VR::PN, "Doe^Jane"));
    object.put(text(tags::PATIENT_ID, VR::LO, "PID-0001"));
    object.put(short(tags::SAMPLES_PER_PIXEL, 1));
    object.put(text(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2"));
    object.put(short(tags::ROWS, rows));
    object.put(short(tags::COLUMNS, columns));
    object.put(short(tags::BITS_ALLOCATED, 8));
    object.put(short(tags::BITS_STORED, 8));
    object.put(short(tags::HIGH_BIT, 7));
    object.put(short(tags::PIXEL_REPRESENTATION, 0));

    let count = usize::from(rows) * usize::from(columns);
    let pixels: Vec<u8> = (0..count).map(|i| (i * 255 / count.max(1)) as u8).collect();
    object.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OB,
        PrimitiveValue::U8(pixels.into()),
    ));

    let file = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(SOP_INSTANCE_UID),
        )
        .unwrap();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    file.write_to_file(path).unwrap();
}

/// A single-file NIfTI-1 float32 volume of shape `dims`, voxel value = flat index.
pub fn nifti_bytes(dims: [u16; 3], descrip: &str) -> Vec<u8> {
    let mut header = vec![0u8; 348];
    let put_i16 = |buf: &mut Vec<u8>, at: usize, value: i16| {
        buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
    };
    let put_f32 = |buf: &mut Vec<u8>, at: usize, value: f32| {
        buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    };

    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    put_i16(&mut header, 40, 3);
    for (axis, len) in dims.iter().enumerate() {
        put_i16(&mut header, 42 + axis * 2, *len as i16);
    }
    for axis in 3..7 {
        put_i16(&mut header, 42 + axis * 2, 1);
    }
    put_i16(&mut header, 70, 16);
    put_i16(&mut header, 72, 32);
    for (axis, size) in [1.0f32, 1.0, 2.0, 3.0, 1.0, 1.0, 1.0, 1.0].iter().enumerate() {
        put_f32(&mut header, 76 + axis * 4, *size);
    }
    put_f32(&mut header, 108, 352.0);
    put_f32(&mut header, 112, 1.0);
    header[123] = 10;
    header[148..148 + descrip.len()].copy_from_slice(descrip.as_bytes());
    put_i16(&mut header, 252, 1);
    put_i16(&mut header, 254, 0);
    header[344..348].copy_from_slice(b"n+1\0");

    header.extend_from_slice(&[0, 0, 0, 0]);
    let count = dims.iter().map(|len| usize::from(*len)).product::<usize>();
    for value in 0..count {
        header.extend_from_slice(&(value as f32).to_le_bytes());
    }
    header
}

pub fn write_nifti(path: &Path, dims: [u16; 3], descrip: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, nifti_bytes(dims, descrip)).unwrap();
}

/// Zips every file below `dir` with entry names relative to it.
pub fn zip_dir(dir: &Path, zip_path: &Path) {
    let file = fs::File::create(zip_path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(dir)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        writer.start_file(name, options).unwrap();
        writer.write_all(&fs::read(entry.path()).unwrap()).unwrap();
    }
    writer.finish().unwrap();
}
