use crate::shape::Shape;

/// All errors raised by array operations in patchwork.
///
/// Shape failures, out-of-range dimensions and bad slicing all land here so
/// callers in `patchwork-data` can wrap a single type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the array's rank.
    #[error("dimension out of range: dim {dim} for array with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// Squeeze requested on a dimension whose extent is not 1.
    #[error("cannot squeeze dim {dim}: extent is {size}, expected 1")]
    SqueezeNonUnit { dim: usize, size: usize },

    /// Element count mismatch when creating from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },
}

/// Convenience Result type used throughout patchwork-core.
pub type Result<T> = std::result::Result<T, Error>;

