use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::WriteNpyExt;

use crate::error::ConvertError;

/// A dataset payload, kept in the element type it was stored with.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayPayload {
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Bool(ArrayD<bool>),
    Bytes(ArrayD<Vec<u8>>),
    Text(ArrayD<String>),
}

macro_rules! for_numeric {
    ($payload:expr, $array:ident => $body:expr, $other:ident => $fallback:expr) => {
        match $payload {
            ArrayPayload::Float32($array) => $body,
            ArrayPayload::Float64($array) => $body,
            ArrayPayload::Int8($array) => $body,
            ArrayPayload::Int16($array) => $body,
            ArrayPayload::Int32($array) => $body,
            ArrayPayload::Int64($array) => $body,
            ArrayPayload::UInt8($array) => $body,
            ArrayPayload::UInt16($array) => $body,
            ArrayPayload::UInt32($array) => $body,
            ArrayPayload::UInt64($array) => $body,
            ArrayPayload::Bool($array) => $body,
            $other => $fallback,
        }
    };
}

impl ArrayPayload {
    pub fn shape(&self) -> &[usize] {
        for_numeric!(self, array => array.shape(), other => match other {
            ArrayPayload::Bytes(array) => array.shape(),
            ArrayPayload::Text(array) => array.shape(),
            _ => &[],
        })
    }

    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            ArrayPayload::Float32(_) => "float32",
            ArrayPayload::Float64(_) => "float64",
            ArrayPayload::Int8(_) => "int8",
            ArrayPayload::Int16(_) => "int16",
            ArrayPayload::Int32(_) => "int32",
            ArrayPayload::Int64(_) => "int64",
            ArrayPayload::UInt8(_) => "uint8",
            ArrayPayload::UInt16(_) => "uint16",
            ArrayPayload::UInt32(_) => "uint32",
            ArrayPayload::UInt64(_) => "uint64",
            ArrayPayload::Bool(_) => "bool",
            ArrayPayload::Bytes(_) => "bytes",
            ArrayPayload::Text(_) => "str",
        }
    }

    /// Widens a numeric payload to `f64`; string payloads have no numeric view.
    pub fn to_f64(&self) -> Option<ArrayD<f64>> {
        match self {
            ArrayPayload::Float32(array) => Some(array.mapv(f64::from)),
            ArrayPayload::Float64(array) => Some(array.clone()),
            ArrayPayload::Int8(array) => Some(array.mapv(f64::from)),
            ArrayPayload::Int16(array) => Some(array.mapv(f64::from)),
            ArrayPayload::Int32(array) => Some(array.mapv(f64::from)),
            ArrayPayload::Int64(array) => Some(array.mapv(|value| value as f64)),
            ArrayPayload::UInt8(array) => Some(array.mapv(f64::from)),
            ArrayPayload::UInt16(array) => Some(array.mapv(f64::from)),
            ArrayPayload::UInt32(array) => Some(array.mapv(f64::from)),
            ArrayPayload::UInt64(array) => Some(array.mapv(|value| value as f64)),
            ArrayPayload::Bool(array) => Some(array.mapv(|value| f64::from(u8::from(value)))),
            ArrayPayload::Bytes(_) | ArrayPayload::Text(_) => None,
        }
    }

    /// Writes the payload as a `.npy` file in its stored element type.
    pub fn write_npy(&self, path: &Path, dataset_path: &str) -> Result<(), ConvertError> {
        let file = File::create(path)
            .map_err(|err| ConvertError::Filesystem(format!("create {}: {err}", path.display())))?;
        let writer = BufWriter::new(file);
        for_numeric!(
            self,
            array => array
                .write_npy(writer)
                .map_err(|err| ConvertError::ArrayWrite(err.to_string())),
            other => Err(ConvertError::UnsupportedElement {
                path: dataset_path.to_string(),
                element: other.element_name().to_string(),
            })
        )
    }
}
