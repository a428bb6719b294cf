use std::path::Path;

use dicom_object::{DefaultDicomObject, open_file};
use dicom_pixeldata::PixelDecoder;
use ndarray::{Array2, Array3};
use tracing::debug;

use crate::document::{MetaDocument, MetaValue};
use crate::error::ConvertError;
use crate::render::{self, Raster};

/// Attribute keywords copied into the metadata document when present.
pub const FIELDS: [&str; 73] = [
    "AccessionNumber",
    "AcquisitionMatrix",
    "B1rms",
    "BitsAllocated",
    "BitsStored",
    "Columns",
    "ConversionType",
    "DiffusionBValue",
    "DiffusionGradientOrientation",
    "EchoNumbers",
    "EchoTime",
    "EchoTrainLength",
    "FlipAngle",
    "HighBit",
    "HighRRValue",
    "ImageDimensions",
    "ImageFormat",
    "ImageGeometryType",
    "ImageLocation",
    "ImageOrientation",
    "ImageOrientationPatient",
    "ImagePosition",
    "ImagePositionPatient",
    "ImageType",
    "ImagedNucleus",
    "ImagingFrequency",
    "InPlanePhaseEncodingDirection",
    "InStackPositionNumber",
    "InstanceNumber",
    "InversionTime",
    "Laterality",
    "LowRRValue",
    "MRAcquisitionType",
    "MagneticFieldStrength",
    "Modality",
    "NumberOfAverages",
    "NumberOfPhaseEncodingSteps",
    "PatientID",
    "PatientName",
    "PatientPosition",
    "PercentPhaseFieldOfView",
    "PercentSampling",
    "PhotometricInterpretation",
    "PixelBandwidth",
    "PixelPaddingValue",
    "PixelRepresentation",
    "PixelSpacing",
    "PlanarConfiguration",
    "PositionReferenceIndicator",
    "PresentationLUTShape",
    "ReconstructionDiameter",
    "RescaleIntercept",
    "RescaleSlope",
    "RescaleType",
    "Rows",
    "SAR",
    "SOPClassUID",
    "SOPInstanceUID",
    "SamplesPerPixel",
    "SeriesDescription",
    "SeriesInstanceUID",
    "SeriesNumber",
    "SliceLocation",
    "SliceThickness",
    "SpacingBetweenSlices",
    "SpatialResolution",
    "SpecificCharacterSet",
    "StudyInstanceUID",
    "TemporalResolution",
    "TransferSyntaxUID",
    "TriggerWindow",
    "WindowCenter",
    "WindowWidth",
];

const TRANSFER_SYNTAX_FIELD: &str = "TransferSyntaxUID";

pub struct DicomSlice {
    pub metadata: MetaDocument,
    pub raster: Raster,
}

pub fn read_slice(path: &Path) -> Result<DicomSlice, ConvertError> {
    let object = open_file(path).map_err(|err| dicom_err(path, err))?;
    let metadata = extract_metadata(&object);
    let raster = render_pixels(&object, path)?;
    Ok(DicomSlice { metadata, raster })
}

/// Allow-listed attributes in list order, each rendered as text. Keywords the
/// dictionary does not know, or that the object lacks, are left out.
pub fn extract_metadata(object: &DefaultDicomObject) -> MetaDocument {
    let mut metadata = MetaDocument::new();
    for field in FIELDS {
        if field == TRANSFER_SYNTAX_FIELD {
            let uid = object
                .meta()
                .transfer_syntax()
                .trim_end_matches(['\0', ' '])
                .to_string();
            metadata.insert(field.to_string(), MetaValue::Text(uid));
            continue;
        }
        let Ok(element) = object.element_by_name(field) else {
            continue;
        };
        match element.to_str() {
            Ok(text) => {
                metadata.insert(field.to_string(), MetaValue::Text(text.into_owned()));
            }
            Err(err) => debug!(field, error = %err, "attribute has no text form"),
        }
    }
    metadata
}

/// First frame only. Single-sample data goes through the bone colormap,
/// three-sample data is min/max scaled per image and kept in colour.
fn render_pixels(object: &DefaultDicomObject, path: &Path) -> Result<Raster, ConvertError> {
    let decoded = object
        .decode_pixel_data()
        .map_err(|err| dicom_err(path, err))?;
    let rows = decoded.rows() as usize;
    let columns = decoded.columns() as usize;
    let samples = decoded.samples_per_pixel() as usize;
    let values = decoded
        .to_vec_frame::<f64>(0)
        .map_err(|err| dicom_err(path, err))?;

    match samples {
        1 => {
            let frame = Array2::from_shape_vec((rows, columns), values)
                .map_err(|err| dicom_err(path, err))?;
            Ok(Raster::Rgb(render::bone_from_values(frame.view())))
        }
        3 => {
            let mut frame = Array3::from_shape_vec((rows, columns, 3), values)
                .map_err(|err| dicom_err(path, err))?;
            let (min, max) = frame
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
                    (lo.min(*value), hi.max(*value))
                });
            let span = max - min;
            frame.mapv_inplace(|value| if span > 0.0 { (value - min) / span } else { 0.0 });
            Ok(Raster::Rgb(render::rgb_from_unit(frame.view())))
        }
        other => Err(ConvertError::Dicom {
            path: path.display().to_string(),
            message: format!("unsupported samples per pixel: {other}"),
        }),
    }
}

fn dicom_err(path: &Path, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Dicom {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
