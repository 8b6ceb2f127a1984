// NdArray — immutable host array with cheap views
//
// Samples held by the patch buffer are large volumes; patches are small
// windows into them. An NdArray shares its storage through an `Arc`, so a
// crop or squeeze produces a new Layout over the same data. Only `to_vec`
// and `contiguous` copy.

use std::ops::Range;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

/// An n-dimensional `f64` array.
#[derive(Debug, Clone)]
pub struct NdArray {
    storage: Arc<Vec<f64>>,
    layout: Layout,
}

impl NdArray {
    /// Build an array from row-major data.
    pub fn from_vec(data: Vec<f64>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Self {
            storage: Arc::new(data),
            layout: Layout::contiguous(shape),
        })
    }

    /// Array filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        Self {
            storage: Arc::new(vec![0.0; shape.elem_count()]),
            layout: Layout::contiguous(shape),
        }
    }

    /// Array whose elements are 0, 1, 2, ... in row-major order.
    ///
    /// Handy for checking which window of a source a crop came from.
    pub fn arange(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = (0..shape.elem_count()).map(|i| i as f64).collect();
        Self {
            storage: Arc::new(data),
            layout: Layout::contiguous(shape),
        }
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.layout.elem_count()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Whether two arrays view the same storage buffer.
    pub fn shares_storage(&self, other: &NdArray) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    fn view(&self, layout: Layout) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            layout,
        }
    }

    /// Element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.rank() || index.iter().zip(self.dims()).any(|(&i, &d)| i >= d) {
            return None;
        }
        self.storage.get(self.layout.flat_index(index)).copied()
    }

    /// View of `len` elements along `dim` starting at `start`.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        Ok(self.view(self.layout.narrow(dim, start, len)?))
    }

    /// Crop the trailing `window.len()` dimensions to the given ranges.
    ///
    /// Leading dimensions are kept whole. A range that runs past the extent
    /// of its dimension is clipped to the extent rather than padded; a range
    /// that starts past the extent is an error.
    pub fn crop(&self, window: &[Range<usize>]) -> Result<Self> {
        let rank = self.rank();
        if window.len() > rank {
            return Err(Error::RankMismatch {
                expected: window.len(),
                got: rank,
            });
        }
        let lead = rank - window.len();
        let mut layout = self.layout.clone();
        for (i, range) in window.iter().enumerate() {
            let dim = lead + i;
            let dim_size = layout.dims()[dim];
            let end = range.end.min(dim_size);
            if range.start > end {
                return Err(Error::NarrowOutOfBounds {
                    dim,
                    start: range.start,
                    len: range.end.saturating_sub(range.start),
                    dim_size,
                });
            }
            layout = layout.narrow(dim, range.start, end - range.start)?;
        }
        Ok(self.view(layout))
    }

    /// Remove dimension `dim`, which must have extent 1.
    pub fn squeeze(&self, dim: usize) -> Result<Self> {
        Ok(self.view(self.layout.squeeze(dim)?))
    }

    /// Copy the elements out in logical (row-major) order.
    pub fn to_vec(&self) -> Vec<f64> {
        if self.layout.is_contiguous() && self.storage.len() == self.elem_count() {
            return self.storage.as_ref().clone();
        }
        self.layout
            .strided_indices()
            .map(|i| self.storage[i])
            .collect()
    }

    /// A contiguous copy of this array (or a cheap clone if already contiguous).
    pub fn contiguous(&self) -> Self {
        if self.is_contiguous() {
            return self.clone();
        }
        Self {
            storage: Arc::new(self.to_vec()),
            layout: Layout::contiguous(self.shape().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_element_count() {
        assert!(NdArray::from_vec(vec![1.0, 2.0, 3.0], (2, 2)).is_err());
        let a = NdArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], (2, 2)).unwrap();
        assert_eq!(a.dims(), &[2, 2]);
        assert_eq!(a.get(&[1, 0]), Some(3.0));
        assert_eq!(a.get(&[2, 0]), None);
    }

    #[test]
    fn test_crop_trailing_dims() {
        // [1, 4, 4] → crop rows 1..3, cols 2..4
        let a = NdArray::arange((1, 4, 4));
        let c = a.crop(&[1..3, 2..4]).unwrap();
        assert_eq!(c.dims(), &[1, 2, 2]);
        assert_eq!(c.to_vec(), vec![6.0, 7.0, 10.0, 11.0]);
        assert!(c.shares_storage(&a));
    }

    #[test]
    fn test_crop_clips_past_extent() {
        let a = NdArray::arange((2, 3));
        let c = a.crop(&[0..5]).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
        assert_eq!(c.to_vec(), a.to_vec());
    }

    #[test]
    fn test_crop_start_past_extent_fails() {
        let a = NdArray::arange((2, 3));
        assert!(a.crop(&[4..6]).is_err());
        assert!(a.crop(&[0..1, 0..1, 0..1]).is_err());
    }

    #[test]
    fn test_squeeze() {
        let a = NdArray::arange((2, 1, 3));
        let s = a.squeeze(1).unwrap();
        assert_eq!(s.dims(), &[2, 3]);
        assert_eq!(s.to_vec(), a.to_vec());
        assert!(matches!(
            a.squeeze(0),
            Err(Error::SqueezeNonUnit { dim: 0, size: 2 })
        ));
    }

    #[test]
    fn test_contiguous_copy_of_view() {
        let a = NdArray::arange((3, 3));
        let v = a.narrow(1, 1, 2).unwrap();
        assert!(!v.is_contiguous());
        let c = v.contiguous();
        assert!(c.is_contiguous());
        assert!(!c.shares_storage(&a));
        assert_eq!(c.to_vec(), vec![1.0, 2.0, 4.0, 5.0, 7.0, 8.0]);
    }

    #[test]
    fn test_zeros() {
        let z = NdArray::zeros((2, 2));
        assert_eq!(z.to_vec(), vec![0.0; 4]);
    }
}
