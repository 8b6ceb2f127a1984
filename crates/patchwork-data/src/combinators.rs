// Dataset combinators — in-memory datasets and index views

use crate::dataset::{Dataset, Sample};

// SubsetDataset — view of selected indices

/// A dataset that exposes only the samples at the given indices.
///
/// Useful for carving a training split out of a larger collection before
/// handing it to a patch buffer.
pub struct SubsetDataset<D: Dataset> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Create a subset of `inner` containing only the samples at `indices`.
    ///
    /// # Panics
    /// Panics (lazily, at `get` time) if any index is out of range.
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    /// Position in the inner dataset of subset index `index`.
    pub fn inner_index(&self, index: usize) -> Option<usize> {
        self.indices.get(index).copied()
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Sample {
        self.inner.get(self.indices[index])
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// VecDataset — in-memory dataset

/// A simple in-memory dataset backed by a `Vec<Sample>`.
///
/// Samples are cheap to clone (array storage is shared), so `get` hands out
/// clones without copying voxel data.
pub struct VecDataset {
    samples: Vec<Sample>,
    dataset_name: String,
}

impl VecDataset {
    /// Create a VecDataset from a vector of samples.
    pub fn new(samples: Vec<Sample>, name: &str) -> Self {
        Self {
            samples,
            dataset_name: name.to_string(),
        }
    }
}

impl Dataset for VecDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Sample {
        self.samples[index].clone()
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}
