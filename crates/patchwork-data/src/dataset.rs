// Dataset trait — the backing store the patch buffer draws samples from

use patchwork_core::NdArray;

/// One item of a dataset: an ordered tuple of co-indexed arrays.
///
/// Typically `[input, target]`, e.g. a `[1, D, H, W]` signal volume and its
/// `[1, D, H, W]` label volume. Arrays share their trailing (spatial)
/// extents; each may carry its own number of leading channel dimensions.
#[derive(Debug, Clone)]
pub struct Sample {
    arrays: Vec<NdArray>,
}

impl Sample {
    pub fn new(arrays: Vec<NdArray>) -> Self {
        Self { arrays }
    }

    /// The common input/target case.
    pub fn pair(input: NdArray, target: NdArray) -> Self {
        Self {
            arrays: vec![input, target],
        }
    }

    pub fn arrays(&self) -> &[NdArray] {
        &self.arrays
    }

    pub fn into_arrays(self) -> Vec<NdArray> {
        self.arrays
    }

    pub fn first(&self) -> Option<&NdArray> {
        self.arrays.first()
    }

    /// Number of arrays in the tuple.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Trailing `spatial_rank` extents of the first array.
    pub fn spatial_dims(&self, spatial_rank: usize) -> Option<&[usize]> {
        let (_, spatial) = self.first()?.shape().split_spatial(spatial_rank).ok()?;
        Some(spatial)
    }
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the initial buffer fill can read
/// from several threads. Reads must be repeatable: the same index may be
/// fetched many times over a buffer's lifetime.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Panics
    /// May panic if `index >= self.len()`.
    fn get(&self, index: usize) -> Sample;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spatial_dims_of_first_array() {
        let s = Sample::pair(NdArray::zeros((2, 4, 5)), NdArray::zeros((4, 5)));
        assert_eq!(s.len(), 2);
        assert_eq!(s.spatial_dims(2), Some(&[4usize, 5][..]));
        assert_eq!(s.spatial_dims(3), Some(&[2usize, 4, 5][..]));
        assert_eq!(s.spatial_dims(4), None);
    }

    #[test]
    fn empty_sample() {
        let s = Sample::new(vec![]);
        assert!(s.is_empty());
        assert!(s.first().is_none());
        assert!(s.spatial_dims(0).is_none());
    }
}
