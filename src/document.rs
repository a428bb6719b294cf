//! JSON documents written into the output tree.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::ConvertError;
use crate::fs_util::write_atomic;

/// Indentation of `nestedDict.json` and label maps.
pub const INDEX_INDENT: usize = 1;

/// Indentation of per-file metadata documents.
pub const META_INDENT: usize = 4;

/// A metadata leaf. Every numeric source type is narrowed to one of two
/// portable number kinds before serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Float(f64),
    List(Vec<MetaValue>),
}

pub type MetaDocument = IndexMap<String, MetaValue>;

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<f32> for MetaValue {
    fn from(value: f32) -> Self {
        MetaValue::Float(f64::from(value))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

macro_rules! integer_meta {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for MetaValue {
                fn from(value: $ty) -> Self {
                    MetaValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_meta!(i8, i16, i32, i64, u8, u16, u32);

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(values: Vec<T>) -> Self {
        MetaValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Serializes `value` with `indent` spaces per level.
pub fn to_json_bytes<T: Serialize>(value: &T, indent: usize) -> Result<Vec<u8>, ConvertError> {
    let indent = vec![b' '; indent];
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(&indent));
    value
        .serialize(&mut serializer)
        .map_err(|err| ConvertError::Serialize(err.to_string()))?;
    Ok(buffer)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T, indent: usize) -> Result<(), ConvertError> {
    let content = to_json_bytes(value, indent)?;
    write_atomic(path, &content)
}
