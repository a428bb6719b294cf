//! Pre-order traversal of a container, converting each dataset into an
//! artifact under the output root and mirroring the hierarchy in an
//! [`OutputIndex`].

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{DatasetKind, classify};
use crate::container::{ContainerNode, ContainerSource, DatasetNode};
use crate::document::{INDEX_INDENT, write_json};
use crate::error::ConvertError;
use crate::fs_util::ensure_dir;
use crate::index::{OutputIndex, split_path};
use crate::labels::coerce_labels;
use crate::normalize::prepare_stack;

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub jpeg_quality: u8,
    /// Seed for the value-range sampler; `None` draws from OS entropy.
    pub sample_seed: Option<u64>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            sample_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub dataset: String,
    pub kind: DatasetKind,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub index: OutputIndex,
    pub artifacts: Vec<Artifact>,
}

/// Flattened artifact name: every path segment concatenated, then the kind suffix.
pub fn artifact_name(dataset_path: &str, kind: DatasetKind) -> String {
    let mut name = split_path(dataset_path).concat();
    name.push_str(kind.artifact_suffix());
    name
}

pub struct HierarchyWalker<'a> {
    output_root: &'a Path,
    options: WalkOptions,
    rng: ChaCha8Rng,
    index: OutputIndex,
    artifacts: Vec<Artifact>,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(output_root: &'a Path, options: WalkOptions) -> Self {
        let rng = options
            .sample_seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            output_root,
            options,
            rng,
            index: OutputIndex::new(),
            artifacts: Vec::new(),
        }
    }

    /// Visits every node once. The first failing node aborts the walk.
    pub fn walk(mut self, source: &dyn ContainerSource) -> Result<WalkOutcome, ConvertError> {
        ensure_dir(self.output_root)?;
        for node in source.nodes()? {
            match &node {
                ContainerNode::Group { path } => self.index.insert_group(path)?,
                ContainerNode::Dataset(dataset) => self.visit_dataset(source, dataset)?,
                ContainerNode::Other { .. } => {
                    debug!(path = node.path(), "ignoring link or non-group, non-dataset node");
                }
            }
        }
        Ok(WalkOutcome {
            index: self.index,
            artifacts: self.artifacts,
        })
    }

    fn visit_dataset(
        &mut self,
        source: &dyn ContainerSource,
        dataset: &DatasetNode,
    ) -> Result<(), ConvertError> {
        self.index.parent_of(&dataset.path)?;

        let Some(kind) = classify(&dataset.path, dataset.rank()) else {
            debug!(path = %dataset.path, "scalar dataset, no artifact");
            return Ok(());
        };

        let name = artifact_name(&dataset.path, kind);
        let target = self.output_root.join(&name);
        info!(path = %dataset.path, ?kind, shape = ?dataset.shape, artifact = %name, "converting dataset");

        let payload = source.read_payload(dataset)?;
        match kind {
            DatasetKind::ImageStack => {
                ensure_dir(&target)?;
                let stack = prepare_stack(&payload, &dataset.path, &mut self.rng)?;
                let written = stack.write_jpegs(&target, self.options.jpeg_quality)?;
                debug!(path = %dataset.path, written, rescaled = stack.rescaled, "wrote images");
            }
            DatasetKind::RawArray => payload.write_npy(&target, &dataset.path)?,
            DatasetKind::LabelVector => {
                let labels = coerce_labels(&payload, &dataset.path)?;
                write_json(&target, &labels, INDEX_INDENT)?;
            }
        }

        let location = target.display().to_string();
        let (parent, key) = self.index.parent_of(&dataset.path)?;
        parent.set_leaf(key, location.clone());
        self.artifacts.push(Artifact {
            dataset: dataset.path.clone(),
            kind,
            location,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_concatenate_segments() {
        assert_eq!(
            artifact_name("/train/X", DatasetKind::ImageStack),
            "trainXImages"
        );
        assert_eq!(
            artifact_name("a/b/weights", DatasetKind::RawArray),
            "abweightsData.npy"
        );
        assert_eq!(
            artifact_name("labels", DatasetKind::LabelVector),
            "labelsLabels.json"
        );
    }
}
