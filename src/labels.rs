use indexmap::IndexMap;
use ndarray::ArrayD;
use serde::Serialize;

use crate::container::ArrayPayload;
use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LabelValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
}

/// Synthetic image name -> label, in index order.
pub type LabelMap = IndexMap<String, LabelValue>;

pub fn label_key(index: usize) -> String {
    format!("img{index}.jpg")
}

/// Byte strings are decoded first, native text is kept, everything else is
/// cast to an integer (floats truncate toward zero).
pub fn coerce_labels(payload: &ArrayPayload, dataset_path: &str) -> Result<LabelMap, ConvertError> {
    if payload.rank() != 1 {
        return Err(ConvertError::InvalidLabel {
            path: dataset_path.to_string(),
            index: 0,
            message: format!("expected a 1-D dataset, got shape {:?}", payload.shape()),
        });
    }

    let values = match payload {
        ArrayPayload::Bytes(array) => collect(array, |index, bytes| {
            String::from_utf8(bytes.clone())
                .map(LabelValue::Text)
                .map_err(|err| invalid(dataset_path, index, err.to_string()))
        })?,
        ArrayPayload::Text(array) => {
            collect(array, |_, text| Ok(LabelValue::Text(text.clone())))?
        }
        ArrayPayload::Float32(array) => collect(array, |index, value| {
            float_label(f64::from(*value), dataset_path, index)
        })?,
        ArrayPayload::Float64(array) => {
            collect(array, |index, value| float_label(*value, dataset_path, index))?
        }
        ArrayPayload::Int8(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::Int16(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::Int32(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::Int64(array) => collect(array, |_, value| Ok(LabelValue::Integer(*value)))?,
        ArrayPayload::UInt8(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::UInt16(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::UInt32(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
        ArrayPayload::UInt64(array) => collect(array, |_, value| Ok(LabelValue::Unsigned(*value)))?,
        ArrayPayload::Bool(array) => {
            collect(array, |_, value| Ok(LabelValue::Integer(i64::from(*value))))?
        }
    };

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| (label_key(index), value))
        .collect())
}

fn collect<T, F>(array: &ArrayD<T>, mut convert: F) -> Result<Vec<LabelValue>, ConvertError>
where
    F: FnMut(usize, &T) -> Result<LabelValue, ConvertError>,
{
    array
        .iter()
        .enumerate()
        .map(|(index, value)| convert(index, value))
        .collect()
}

/// 2^63, the first magnitude an `i64` cannot hold.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// NaN, infinities and values outside the `i64` range are rejected rather
/// than saturated.
fn float_label(value: f64, path: &str, index: usize) -> Result<LabelValue, ConvertError> {
    let truncated = value.trunc();
    if !(-I64_BOUND..I64_BOUND).contains(&truncated) {
        return Err(invalid(path, index, format!("cannot cast {value} to an integer")));
    }
    Ok(LabelValue::Integer(truncated as i64))
}

fn invalid(path: &str, index: usize, message: String) -> ConvertError {
    ConvertError::InvalidLabel {
        path: path.to_string(),
        index,
        message,
    }
}
