use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IndexEntry {
    Branch(OutputIndex),
    Leaf(String),
}

/// Nested mirror of a container hierarchy whose leaves name produced artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputIndex {
    entries: IndexMap<String, IndexEntry>,
}

/// Splits a container path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

impl OutputIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Follows `segments` from this level, creating missing branches on the way.
    pub fn branch_mut(&mut self, segments: &[&str]) -> Result<&mut OutputIndex, ConvertError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(self);
        };
        let entry = self
            .entries
            .entry((*first).to_string())
            .or_insert_with(|| IndexEntry::Branch(OutputIndex::default()));
        match entry {
            IndexEntry::Branch(child) => child.branch_mut(rest),
            IndexEntry::Leaf(_) => Err(ConvertError::Container(format!(
                "index segment {first} already holds an artifact"
            ))),
        }
    }

    /// Ensures a (possibly empty) branch exists for the group at `path`.
    pub fn insert_group(&mut self, path: &str) -> Result<(), ConvertError> {
        let segments = split_path(path);
        self.branch_mut(&segments).map(|_| ())
    }

    /// Creates the ancestor chain of `path` and returns the branch that will
    /// hold its leaf, together with the leaf key.
    pub fn parent_of<'p>(
        &mut self,
        path: &'p str,
    ) -> Result<(&mut OutputIndex, &'p str), ConvertError> {
        let segments = split_path(path);
        let Some((leaf, ancestors)) = segments.split_last() else {
            return Err(ConvertError::Container("empty dataset path".to_string()));
        };
        let leaf = *leaf;
        let parent = self.branch_mut(ancestors)?;
        Ok((parent, leaf))
    }

    pub fn set_leaf(&mut self, key: &str, location: String) {
        self.entries
            .insert(key.to_string(), IndexEntry::Leaf(location));
    }
}
