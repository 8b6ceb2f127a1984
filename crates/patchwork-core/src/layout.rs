use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — how an array's logical shape maps onto flat storage
//
// A crop never copies: narrowing a dimension only moves the offset and
// shrinks the extent, and squeezing a unit dimension only drops one
// (extent, stride) pair. Every patch handed out by the buffer is therefore
// a view over the resident sample's storage.
//
//   [4, 6] contiguous, strides [6, 1], offset 0
//   narrow(dim=1, start=2, len=3) → [4, 3], strides [6, 1], offset 2
//
// Reading a view back in logical order goes through `StridedIter`.

/// Shape + strides + offset into a flat storage buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Where this view's first element lives in the storage buffer.
    offset: usize,
}

impl Layout {
    /// Row-major layout for `shape` starting at offset 0.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Layout with explicit strides and offset (for views).
    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Self {
        Layout {
            shape,
            strides,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// True when strides are the default row-major strides and offset is 0.
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == self.shape.stride_contiguous()
    }

    /// Narrow (slice) along a dimension. The result views the same storage.
    ///
    /// Example: [4, 6], narrow(dim=1, start=2, len=3) → [4, 3], offset += 2
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        let dim_size = self.shape.dims()[dim];
        if start + len > dim_size {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        new_dims[dim] = len;
        let new_offset = self.offset + start * self.strides[dim];
        Ok(Layout::new(
            Shape::new(new_dims),
            self.strides.clone(),
            new_offset,
        ))
    }

    /// Drop dimension `dim`, which must have extent 1.
    ///
    /// squeeze(1) on [3, 1, 4] → [3, 4]
    pub fn squeeze(&self, dim: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        let size = self.shape.dims()[dim];
        if size != 1 {
            return Err(Error::SqueezeNonUnit { dim, size });
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.remove(dim);
        new_strides.remove(dim);
        Ok(Layout::new(Shape::new(new_dims), new_strides, self.offset))
    }

    /// flat_index = offset + sum(index[i] * stride[i])
    pub fn flat_index(&self, index: &[usize]) -> usize {
        let mut flat = self.offset;
        for (i, &idx) in index.iter().enumerate() {
            flat += idx * self.strides[i];
        }
        flat
    }

    /// Iterator over the storage indices of this layout, in logical order.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self)
    }
}

// StridedIter — walks a (possibly non-contiguous) view in logical order
//
// For a contiguous layout this just counts offset, offset+1, ...; for a
// cropped view it skips the gaps between rows and planes.

/// Yields flat storage indices for each element of a Layout.
pub struct StridedIter {
    current: Vec<usize>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    remaining: usize,
    started: bool,
}

impl StridedIter {
    fn new(layout: &Layout) -> Self {
        StridedIter {
            current: vec![0; layout.rank()],
            dims: layout.dims().to_vec(),
            strides: layout.strides().to_vec(),
            offset: layout.offset(),
            remaining: layout.elem_count(),
            started: false,
        }
    }

    fn flat_index(&self) -> usize {
        let mut idx = self.offset;
        for i in 0..self.current.len() {
            idx += self.current[i] * self.strides[i];
        }
        idx
    }

    /// Advance the multi-dimensional index by one (rightmost dimension first).
    fn advance(&mut self) {
        for i in (0..self.dims.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                return;
            }
            self.current[i] = 0;
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        if self.started {
            self.advance();
        }
        self.started = true;
        self.remaining -= 1;
        Some(self.flat_index())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        assert!(layout.is_contiguous());
        assert_eq!(layout.strides(), &[3, 1]);
        assert_eq!(layout.offset(), 0);
    }

    #[test]
    fn test_contiguous_indices() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let indices: Vec<usize> = layout.strided_indices().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_narrow() {
        let layout = Layout::contiguous(Shape::from((4, 6)));
        let narrowed = layout.narrow(1, 2, 3).unwrap();
        assert_eq!(narrowed.dims(), &[4, 3]);
        assert_eq!(narrowed.offset(), 2);
        assert_eq!(narrowed.strides(), &[6, 1]);
        assert!(!narrowed.is_contiguous());
    }

    #[test]
    fn test_narrow_out_of_bounds() {
        let layout = Layout::contiguous(Shape::from((4, 6)));
        assert!(layout.narrow(1, 5, 3).is_err()); // 5+3 = 8 > 6
        assert!(layout.narrow(2, 0, 1).is_err());
    }

    #[test]
    fn test_narrowed_indices_skip_gaps() {
        // [3, 4]:
        //   [[0, 1, 2, 3],
        //    [4, 5, 6, 7],
        //    [8, 9,10,11]]
        // rows 1..3, cols 1..3 → 5, 6, 9, 10
        let layout = Layout::contiguous(Shape::from((3, 4)));
        let view = layout.narrow(0, 1, 2).unwrap().narrow(1, 1, 2).unwrap();
        let indices: Vec<usize> = view.strided_indices().collect();
        assert_eq!(indices, vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_squeeze_unit_dim() {
        let layout = Layout::contiguous(Shape::from((3, 1, 4)));
        let squeezed = layout.squeeze(1).unwrap();
        assert_eq!(squeezed.dims(), &[3, 4]);
        assert_eq!(squeezed.strides(), &[4, 1]);
    }

    #[test]
    fn test_squeeze_non_unit_dim_fails() {
        let layout = Layout::contiguous(Shape::from((3, 2, 4)));
        match layout.squeeze(1) {
            Err(Error::SqueezeNonUnit { dim: 1, size: 2 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_flat_index() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4)));
        assert_eq!(layout.flat_index(&[1, 2, 3]), 23);
        assert_eq!(layout.flat_index(&[0, 0, 0]), 0);
    }
}
