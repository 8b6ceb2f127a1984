/// Errors raised while building or serving from a [`PatchBuffer`](crate::PatchBuffer).
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The backing dataset has no samples to admit.
    #[error("backing dataset is empty")]
    EmptyDataset,

    /// A buffer of capacity 0 was requested.
    #[error("buffer_size must be at least 1")]
    ZeroCapacity,

    /// `patch_size` does not cover every dimension but the leading one.
    #[error("patch size has {patch_dims} dims but sample {index} has rank {sample_rank}")]
    PatchRank {
        index: usize,
        patch_dims: usize,
        sample_rank: usize,
    },

    /// A dataset sample contained no arrays.
    #[error("sample {index} has no arrays")]
    EmptySample { index: usize },

    /// An array of a sample does not share the spatial extents of the first array.
    #[error("sample {index}, array {array}: spatial extents {got:?} do not match {expected:?}")]
    SpatialMismatch {
        index: usize,
        array: usize,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Array-level failure, e.g. squeezing a dimension whose extent is not 1.
    #[error(transparent)]
    Shape(#[from] patchwork_core::Error),
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
