//! # patchwork-data
//!
//! Datasets and a rotating patch buffer for random-crop training streams.
//!
//! This crate provides:
//! - [`Dataset`] trait — indexed access to whole samples (tuples of arrays)
//! - [`PatchBuffer`] — keeps a few samples resident and serves random,
//!   spatially aligned crops of them, rotating in new samples periodically
//! - [`Traversal`] — shuffled or sequential admission order
//   - Dataset combinators — VecDataset, SubsetDataset

pub mod buffer;
pub mod combinators;
pub mod dataset;
pub mod error;
pub mod traversal;

pub use buffer::{Patch, PatchBuffer, PatchBufferConfig, PatchIter};
pub use combinators::{SubsetDataset, VecDataset};
pub use dataset::{Dataset, Sample};
pub use error::{BufferError, Result};
pub use traversal::{Traversal, TraversalOrder};
