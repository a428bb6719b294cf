use std::io::ErrorKind;
use std::path::Path;

use ndarray::Array2;
use nifti::{NiftiError, NiftiHeader, NiftiObject, RandomAccessNiftiVolume, ReaderOptions};
use tracing::warn;

use crate::document::{MetaDocument, MetaValue};
use crate::error::ConvertError;
use crate::render::{self, Raster};

pub struct NiftiSlice {
    pub metadata: MetaDocument,
    pub raster: Raster,
}

/// `Ok(None)` means the header could not be parsed and the file was skipped.
/// Once the header is valid, any failure reading the volume is an error.
pub fn read_slice(path: &Path) -> Result<Option<NiftiSlice>, ConvertError> {
    if let Err(err) = NiftiHeader::from_file(path) {
        if is_malformed_header(&err) {
            warn!(path = %path.display(), error = %err, "skipping file, not a valid NIfTI file");
            return Ok(None);
        }
        return Err(nifti_err(path, err));
    }

    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|err| nifti_err(path, err))?;
    let metadata = extract_metadata(object.header());
    let plane = middle_slice(object.volume(), path)?;
    let raster = Raster::Rgb(render::bone_from_values(plane.view()));
    Ok(Some(NiftiSlice { metadata, raster }))
}

/// Short reads and undecodable bytes while parsing the header count as a
/// malformed file; other I/O failures do not.
fn is_malformed_header(err: &NiftiError) -> bool {
    match err {
        NiftiError::Io(io) => matches!(
            io.kind(),
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData | ErrorKind::InvalidInput
        ),
        NiftiError::InvalidFormat | NiftiError::InconsistentDim(..) | NiftiError::InvalidCode(..) => {
            true
        }
        _ => false,
    }
}

fn nifti_err(path: &Path, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Nifti {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

pub fn extract_metadata(header: &NiftiHeader) -> MetaDocument {
    let rank = usize::from(header.dim[0]).clamp(1, 7);
    let units = header.xyzt_units;

    let mut metadata = MetaDocument::new();
    metadata.insert("dim".to_string(), header.dim[1..=rank].to_vec().into());
    metadata.insert(
        "datatype".to_string(),
        MetaValue::from(datatype_name(header.datatype)),
    );
    metadata.insert(
        "voxel_size".to_string(),
        header.pixdim[1..=rank].to_vec().into(),
    );
    metadata.insert(
        "descrip".to_string(),
        MetaValue::Text(decode_descrip(&header.descrip[..])),
    );
    metadata.insert(
        "xyzt_units".to_string(),
        vec![spatial_unit(units), temporal_unit(units)].into(),
    );
    metadata.insert("qform_code".to_string(), header.qform_code.into());
    metadata.insert("sform_code".to_string(), header.sform_code.into());
    metadata
}

/// Slice `[:, :, depth / 2]` of the first volume. A 2-D image is returned whole.
pub fn middle_slice<V: RandomAccessNiftiVolume>(
    volume: &V,
    path: &Path,
) -> Result<Array2<f64>, ConvertError> {
    let dims = volume.dim().to_vec();
    if dims.len() < 2 {
        return Err(nifti_err(
            path,
            format!("expected at least two dimensions, got {dims:?}"),
        ));
    }

    let mut coords = vec![0u16; dims.len()];
    if let Some(depth) = dims.get(2) {
        coords[2] = depth / 2;
    }

    let (width, height) = (usize::from(dims[0]), usize::from(dims[1]));
    let mut plane = Array2::zeros((width, height));
    for ((x, y), value) in plane.indexed_iter_mut() {
        coords[0] = x as u16;
        coords[1] = y as u16;
        *value = volume
            .get_f64(&coords)
            .map_err(|err| nifti_err(path, err))?;
    }
    Ok(plane)
}

pub fn decode_descrip(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|byte| *byte != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Name of the on-disk element type, as numpy spells it.
pub fn datatype_name(code: i16) -> &'static str {
    match code {
        2 => "uint8",
        4 => "int16",
        8 => "int32",
        16 => "float32",
        32 => "complex64",
        64 => "float64",
        128 => "void24",
        256 => "int8",
        512 => "uint16",
        768 => "uint32",
        1024 => "int64",
        1280 => "uint64",
        1536 => "float128",
        1792 => "complex128",
        2048 => "complex256",
        2304 => "void32",
        _ => "unknown",
    }
}

pub fn spatial_unit(units: u8) -> &'static str {
    match units & 0x07 {
        1 => "meter",
        2 => "mm",
        3 => "micron",
        _ => "unknown",
    }
}

pub fn temporal_unit(units: u8) -> &'static str {
    match units & 0x38 {
        8 => "sec",
        16 => "msec",
        24 => "usec",
        32 => "hz",
        40 => "ppm",
        48 => "rads",
        _ => "unknown",
    }
}
