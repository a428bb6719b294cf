//! HDF5 adapter backed by the `hdf5` crate.

use std::path::Path;

use hdf5::types::{
    FixedAscii, FixedUnicode, FloatSize, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode,
};
use hdf5::{Dataset, File, Group, H5Type, LinkType, LocationType};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::container::{ArrayPayload, ContainerNode, ContainerSource, DatasetNode};
use crate::error::ConvertError;

/// Capacity used when reading fixed-length strings; longer values are truncated.
const FIXED_STRING_CAPACITY: usize = 1024;

pub struct Hdf5Container {
    file: File,
}

impl Hdf5Container {
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let file = File::open(path)
            .map_err(|err| ConvertError::Container(format!("open {}: {err}", path.display())))?;
        Ok(Self { file })
    }
}

impl ContainerSource for Hdf5Container {
    fn nodes(&self) -> Result<Vec<ContainerNode>, ConvertError> {
        let mut nodes = Vec::new();
        collect_nodes(&self.file, "", &mut nodes)?;
        Ok(nodes)
    }

    fn read_payload(&self, node: &DatasetNode) -> Result<ArrayPayload, ConvertError> {
        let dataset = self
            .file
            .dataset(&node.path)
            .map_err(|err| container_err(&node.path, err))?;
        let descriptor = dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|err| container_err(&node.path, err))?;
        debug!(path = %node.path, dtype = ?descriptor, "reading dataset");

        let shape = node.shape.as_slice();
        let payload = match descriptor {
            TypeDescriptor::Float(FloatSize::U4) => ArrayPayload::Float32(read(&dataset, node)?),
            TypeDescriptor::Float(_) => ArrayPayload::Float64(read(&dataset, node)?),
            TypeDescriptor::Integer(IntSize::U1) => ArrayPayload::Int8(read(&dataset, node)?),
            TypeDescriptor::Integer(IntSize::U2) => ArrayPayload::Int16(read(&dataset, node)?),
            TypeDescriptor::Integer(IntSize::U4) => ArrayPayload::Int32(read(&dataset, node)?),
            TypeDescriptor::Integer(IntSize::U8) => ArrayPayload::Int64(read(&dataset, node)?),
            TypeDescriptor::Unsigned(IntSize::U1) => ArrayPayload::UInt8(read(&dataset, node)?),
            TypeDescriptor::Unsigned(IntSize::U2) => ArrayPayload::UInt16(read(&dataset, node)?),
            TypeDescriptor::Unsigned(IntSize::U4) => ArrayPayload::UInt32(read(&dataset, node)?),
            TypeDescriptor::Unsigned(IntSize::U8) => ArrayPayload::UInt64(read(&dataset, node)?),
            TypeDescriptor::Boolean => ArrayPayload::Bool(read(&dataset, node)?),
            TypeDescriptor::FixedAscii(_) => {
                let values = read_raw::<FixedAscii<FIXED_STRING_CAPACITY>>(&dataset, node)?
                    .into_iter()
                    .map(|value| value.as_bytes().to_vec())
                    .collect();
                ArrayPayload::Bytes(shaped(values, shape, &node.path)?)
            }
            TypeDescriptor::FixedUnicode(_) => {
                let values = read_raw::<FixedUnicode<FIXED_STRING_CAPACITY>>(&dataset, node)?
                    .into_iter()
                    .map(|value| value.as_bytes().to_vec())
                    .collect();
                ArrayPayload::Bytes(shaped(values, shape, &node.path)?)
            }
            TypeDescriptor::VarLenAscii => {
                let values = read_raw::<VarLenAscii>(&dataset, node)?
                    .into_iter()
                    .map(|value| value.as_bytes().to_vec())
                    .collect();
                ArrayPayload::Bytes(shaped(values, shape, &node.path)?)
            }
            TypeDescriptor::VarLenUnicode => {
                let values = read_raw::<VarLenUnicode>(&dataset, node)?
                    .into_iter()
                    .map(|value| value.as_str().to_string())
                    .collect();
                ArrayPayload::Text(shaped(values, shape, &node.path)?)
            }
            other => {
                return Err(ConvertError::UnsupportedElement {
                    path: node.path.clone(),
                    element: format!("{other:?}"),
                });
            }
        };
        Ok(payload)
    }
}

fn collect_nodes(
    group: &Group,
    prefix: &str,
    nodes: &mut Vec<ContainerNode>,
) -> Result<(), ConvertError> {
    let links = group
        .iter_visit_default(
            Vec::<(String, LinkType)>::new(),
            |_, name, info, links| {
                links.push((name.to_string(), info.link_type));
                true
            },
        )
        .map_err(|err| container_err(prefix, err))?;
    for (name, link_type) in links {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        // Soft and external links are recorded but never resolved.
        if !matches!(link_type, LinkType::Hard) {
            debug!(path = %path, "not following soft or external link");
            nodes.push(ContainerNode::Other { path });
            continue;
        }
        let location = group
            .loc_type_by_name(&name)
            .map_err(|err| container_err(&path, err))?;
        match location {
            LocationType::Group => {
                nodes.push(ContainerNode::Group { path: path.clone() });
                let child = group.group(&name).map_err(|err| container_err(&path, err))?;
                collect_nodes(&child, &path, nodes)?;
            }
            LocationType::Dataset => {
                let dataset = group
                    .dataset(&name)
                    .map_err(|err| container_err(&path, err))?;
                nodes.push(ContainerNode::Dataset(DatasetNode {
                    path,
                    shape: dataset.shape(),
                }));
            }
            _ => nodes.push(ContainerNode::Other { path }),
        }
    }
    Ok(())
}

fn read<T: H5Type>(dataset: &Dataset, node: &DatasetNode) -> Result<ArrayD<T>, ConvertError> {
    let values = read_raw::<T>(dataset, node)?;
    shaped(values, &node.shape, &node.path)
}

fn read_raw<T: H5Type>(dataset: &Dataset, node: &DatasetNode) -> Result<Vec<T>, ConvertError> {
    dataset
        .read_raw::<T>()
        .map_err(|err| container_err(&node.path, err))
}

fn shaped<T>(values: Vec<T>, shape: &[usize], path: &str) -> Result<ArrayD<T>, ConvertError> {
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|err| ConvertError::Container(format!("{path}: {err}")))
}

fn container_err(path: &str, err: hdf5::Error) -> ConvertError {
    ConvertError::Container(format!("{path}: {err}"))
}
