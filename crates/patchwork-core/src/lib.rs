//! # patchwork-core
//!
//! Host-side array primitives for patchwork.
//!
//! This crate provides:
//! - [`NdArray`] — immutable n-dimensional `f64` array with zero-copy views
//! - [`Shape`] / [`Layout`] — extents, strides and offsets
//! - [`Error`] — the error type shared by all array operations

pub mod array;
pub mod error;
pub mod layout;
pub mod shape;

pub use array::NdArray;
pub use error::{Error, Result};
pub use layout::{Layout, StridedIter};
pub use shape::Shape;
