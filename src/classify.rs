use serde::Serialize;

/// Substrings that mark a dataset as an image stack. Matched case-sensitively
/// against the full dataset path.
pub const IMAGE_MARKERS: [&str; 3] = ["X", "data", "image"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    ImageStack,
    RawArray,
    LabelVector,
}

impl DatasetKind {
    /// Suffix appended to the flattened dataset name to form the artifact name.
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            DatasetKind::ImageStack => "Images",
            DatasetKind::RawArray => "Data.npy",
            DatasetKind::LabelVector => "Labels.json",
        }
    }
}

/// Returns `None` for scalar (rank 0) datasets, which produce no artifact.
pub fn classify(path: &str, rank: usize) -> Option<DatasetKind> {
    match rank {
        0 => None,
        1 => Some(DatasetKind::LabelVector),
        _ if IMAGE_MARKERS.iter().any(|marker| path.contains(marker)) => {
            Some(DatasetKind::ImageStack)
        }
        _ => Some(DatasetKind::RawArray),
    }
}
