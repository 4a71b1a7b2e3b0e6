use core::{
    fmt::Display,
    ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{INLINE_DIMS, ShapeError};

/// The size of every logical axis of an iteration domain or operand.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; INLINE_DIMS]>,
}

impl Shape {
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    pub fn new_raw(dims: SmallVec<[usize; INLINE_DIMS]>) -> Self {
        Self { dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of points in the domain described by this shape.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Left-pad the shape with size-1 axes until it has `rank` axes.
    ///
    /// Shapes already at or above `rank` are returned unchanged.
    pub fn expanded(&self, rank: usize) -> Self {
        let missing = rank.saturating_sub(self.rank());
        let mut dims = SmallVec::with_capacity(rank.max(self.rank()));
        dims.extend(core::iter::repeat_n(1, missing));
        dims.extend_from_slice(&self.dims);
        Self { dims }
    }

    /// Fails if any axis has size zero.
    pub fn validate(&self) -> Result<(), ShapeError> {
        match self.dims.iter().position(|dim| *dim == 0) {
            Some(axis) => Err(ShapeError::EmptyAxis {
                shape: self.clone(),
                axis,
            }),
            None => Ok(()),
        }
    }
}

/// Compute the joint shape of two operands under broadcasting.
///
/// The shorter shape is aligned on the right. Each pair of axes must either be equal or
/// contain a 1.
pub fn broadcast_shapes(lhs: &Shape, rhs: &Shape) -> Result<Shape, ShapeError> {
    let rank = lhs.rank().max(rhs.rank());
    let (left, right) = (lhs.expanded(rank), rhs.expanded(rank));

    left.iter()
        .zip(right.iter())
        .enumerate()
        .map(|(axis, (l, r))| match (*l, *r) {
            (l, r) if l == r => Ok(l),
            (1, r) => Ok(r),
            (l, 1) => Ok(l),
            _ => Err(ShapeError::Mismatch {
                left: lhs.clone(),
                right: rhs.clone(),
                axis,
            }),
        })
        .collect()
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.dims
    }
}

impl DerefMut for Shape {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dims
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        &self.dims
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str(")")
    }
}

#[macro_export]
macro_rules! shape {
    () => (
        $crate::Shape::new_raw($crate::SmallVec::new())
    );
    ($elem:expr; $n:expr) => ({
        $crate::Shape::new_raw($crate::smallvec!($elem; $n))
    });
    ($($x:expr),+$(,)?) => ({
        $crate::Shape::new_raw($crate::smallvec!($($x),*))
    });
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(&dims)
    }
}

impl From<alloc::vec::Vec<usize>> for Shape {
    fn from(dims: alloc::vec::Vec<usize>) -> Self {
        Shape::new(&dims)
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Shape {
            dims: iter.into_iter().collect(),
        }
    }
}
