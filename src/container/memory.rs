use crate::container::{ArrayPayload, ContainerNode, ContainerSource, DatasetNode};
use crate::error::ConvertError;

#[derive(Debug, Clone)]
enum Slot {
    Node(ContainerNode),
    Dataset(DatasetNode, Option<ArrayPayload>),
}

/// A container assembled in memory, node by node, in visitation order.
///
/// Useful for driving the walker without a file on disk; a dataset added via
/// [`MemoryContainer::unreadable`] fails when its payload is requested.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    slots: Vec<Slot>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, path: &str) -> Self {
        self.slots.push(Slot::Node(ContainerNode::Group {
            path: path.to_string(),
        }));
        self
    }

    pub fn dataset(mut self, path: &str, payload: ArrayPayload) -> Self {
        let node = DatasetNode {
            path: path.to_string(),
            shape: payload.shape().to_vec(),
        };
        self.slots.push(Slot::Dataset(node, Some(payload)));
        self
    }

    pub fn unreadable(mut self, path: &str, shape: &[usize]) -> Self {
        let node = DatasetNode {
            path: path.to_string(),
            shape: shape.to_vec(),
        };
        self.slots.push(Slot::Dataset(node, None));
        self
    }

    pub fn other(mut self, path: &str) -> Self {
        self.slots.push(Slot::Node(ContainerNode::Other {
            path: path.to_string(),
        }));
        self
    }
}

impl ContainerSource for MemoryContainer {
    fn nodes(&self) -> Result<Vec<ContainerNode>, ConvertError> {
        Ok(self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Node(node) => node.clone(),
                Slot::Dataset(node, _) => ContainerNode::Dataset(node.clone()),
            })
            .collect())
    }

    fn read_payload(&self, dataset: &DatasetNode) -> Result<ArrayPayload, ConvertError> {
        self.slots
            .iter()
            .find_map(|slot| match slot {
                Slot::Dataset(node, payload) if node.path == dataset.path => Some(payload),
                _ => None,
            })
            .ok_or_else(|| ConvertError::Container(format!("no dataset at {}", dataset.path)))?
            .clone()
            .ok_or_else(|| ConvertError::Container(format!("unreadable payload at {}", dataset.path)))
    }
}
