//! Container adapters.
//!
//! Readers flatten a container into a pre-order list of [`ContainerNode`]s so
//! the walker never sees library-specific object types. Payloads are fetched
//! lazily, one dataset at a time.

#[cfg(feature = "hdf5")]
pub mod h5;
pub mod memory;
pub mod payload;

#[cfg(feature = "hdf5")]
pub use h5::Hdf5Container;
pub use memory::MemoryContainer;
pub use payload::ArrayPayload;

use std::path::Path;

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetNode {
    pub path: String,
    pub shape: Vec<usize>,
}

impl DatasetNode {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerNode {
    Group { path: String },
    Dataset(DatasetNode),
    Other { path: String },
}

impl ContainerNode {
    pub fn path(&self) -> &str {
        match self {
            ContainerNode::Group { path } | ContainerNode::Other { path } => path,
            ContainerNode::Dataset(dataset) => &dataset.path,
        }
    }
}

pub trait ContainerSource {
    /// Every node below the root, groups before their members.
    fn nodes(&self) -> Result<Vec<ContainerNode>, ConvertError>;

    fn read_payload(&self, dataset: &DatasetNode) -> Result<ArrayPayload, ConvertError>;
}

/// Opens an uploaded container file for walking.
pub trait ContainerOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerSource>, ConvertError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Opener;

impl ContainerOpener for Hdf5Opener {
    #[cfg(feature = "hdf5")]
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerSource>, ConvertError> {
        Ok(Box::new(Hdf5Container::open(path)?))
    }

    #[cfg(not(feature = "hdf5"))]
    fn open(&self, _path: &Path) -> Result<Box<dyn ContainerSource>, ConvertError> {
        Err(ConvertError::ContainerUnsupported)
    }
}
