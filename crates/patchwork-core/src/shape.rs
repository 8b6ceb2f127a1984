use std::fmt;

// Shape — per-dimension extents of an array
//
//   - Scalar: Shape([])              — 0 dimensions, 1 element
//   - Image:  Shape([3, 128, 128])   — channels, height, width
//   - Volume: Shape([1, 64, 64, 64]) — channels, depth, height, width
//
// Patch extraction splits a shape into a leading (non-spatial) part and a
// trailing spatial part; `split_spatial` does that split.

/// N-dimensional shape of an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    /// A scalar shape [] has 1 element; any zero extent gives 0.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1].
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1] * self.0[i + 1];
            }
        }
        strides
    }

    /// Split into `(leading, spatial)` where `spatial` holds the last
    /// `spatial_rank` extents.
    pub fn split_spatial(&self, spatial_rank: usize) -> crate::Result<(&[usize], &[usize])> {
        if spatial_rank > self.rank() {
            return Err(crate::Error::RankMismatch {
                expected: spatial_rank,
                got: self.rank(),
            });
        }
        Ok(self.0.split_at(self.rank() - spatial_rank))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::from(());
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 1);
        assert_eq!(s.stride_contiguous(), Vec::<usize>::new());
    }

    #[test]
    fn test_volume_strides() {
        let s = Shape::from((1, 4, 5, 6));
        assert_eq!(s.stride_contiguous(), vec![120, 30, 6, 1]);
        assert_eq!(s.elem_count(), 120);
    }

    #[test]
    fn test_zero_extent_has_no_elements() {
        assert_eq!(Shape::from((3, 0)).elem_count(), 0);
    }

    #[test]
    fn test_split_spatial() {
        let s = Shape::from((2, 8, 16, 16));
        let (lead, spatial) = s.split_spatial(3).unwrap();
        assert_eq!(lead, &[2]);
        assert_eq!(spatial, &[8, 16, 16]);
        assert!(s.split_spatial(5).is_err());
    }

    #[test]
    fn test_display() {
        let s = Shape::from((1, 32, 32, 32));
        assert_eq!(format!("{}", s), "[1, 32, 32, 32]");
    }
}
