use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    INLINE_DIMS, Shape, ShapeError, Strides,
    striding::{column_major_contiguous_strides, row_major_contiguous_strides},
};

/// How an operand's elements are laid out in its buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryLayout {
    /// Last axis is contiguous.
    #[default]
    RowMajor,
    /// First axis is contiguous.
    ColumnMajor,
    /// Explicit element strides, one per axis.
    Strided(Strides),
}

impl MemoryLayout {
    /// Element strides of a buffer holding `shape` with this layout.
    pub fn strides(&self, shape: &Shape) -> Result<Strides, ShapeError> {
        match self {
            MemoryLayout::RowMajor => {
                largest_stride(shape.iter().skip(1), shape)?;
                Ok(row_major_contiguous_strides(shape))
            }
            MemoryLayout::ColumnMajor => {
                largest_stride(shape.iter().rev().skip(1), shape)?;
                Ok(column_major_contiguous_strides(shape))
            }
            MemoryLayout::Strided(strides) if strides.rank() == shape.rank() => {
                Ok(strides.clone())
            }
            MemoryLayout::Strided(strides) => Err(ShapeError::RankMismatch {
                left: shape.rank(),
                right: strides.rank(),
            }),
        }
    }
}

/// Product of the extents the outermost contiguous stride spans.
fn largest_stride<'a>(
    mut extents: impl Iterator<Item = &'a usize>,
    shape: &Shape,
) -> Result<usize, ShapeError> {
    extents
        .try_fold(1usize, |product, extent| product.checked_mul(*extent))
        .ok_or_else(|| ShapeError::StrideOverflow {
            shape: shape.clone(),
        })
}

/// Affine mapping from the logical axes of an operation to one operand's buffer.
///
/// Broadcast axes are tracked explicitly: a broadcast axis contributes nothing to the
/// offset whatever its stored stride is. A stride that is legitimately zero is not a
/// broadcast marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrideDescriptor {
    strides: Strides,
    broadcast: SmallVec<[bool; INLINE_DIMS]>,
}

impl StrideDescriptor {
    /// A descriptor without broadcast axes.
    pub fn new(strides: Strides) -> Self {
        let broadcast = SmallVec::from_elem(false, strides.rank());
        Self { strides, broadcast }
    }

    /// Build the descriptor of an operand of `shape`, stored with `layout`, read over the
    /// iteration domain `domain`.
    ///
    /// Axes where the operand has size 1 and the domain is larger are marked as broadcast.
    /// Both shapes must have the same rank; callers align lower-rank operands first.
    pub fn broadcast_to(
        shape: &Shape,
        layout: &MemoryLayout,
        domain: &Shape,
    ) -> Result<Self, ShapeError> {
        if shape.rank() != domain.rank() {
            return Err(ShapeError::RankMismatch {
                left: domain.rank(),
                right: shape.rank(),
            });
        }

        let mut descriptor = Self::new(layout.strides(shape)?);

        for (axis, (dim, target)) in shape.iter().zip(domain.iter()).enumerate() {
            match (*dim, *target) {
                (dim, target) if dim == target => {}
                (1, _) => descriptor.broadcast[axis] = true,
                _ => {
                    return Err(ShapeError::Mismatch {
                        left: shape.clone(),
                        right: domain.clone(),
                        axis,
                    });
                }
            }
        }

        Ok(descriptor)
    }

    pub fn rank(&self) -> usize {
        self.strides.rank()
    }

    /// Stride contributing to the offset for `axis`, zero when the axis is broadcast.
    pub fn stride(&self, axis: usize) -> usize {
        match self.broadcast[axis] {
            true => 0,
            false => self.strides[axis],
        }
    }

    /// Stride as stored in the buffer layout, ignoring broadcasting.
    pub fn layout_stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    pub fn is_broadcast(&self, axis: usize) -> bool {
        self.broadcast[axis]
    }

    /// Mark `axis` as broadcast.
    pub fn set_broadcast(&mut self, axis: usize) {
        self.broadcast[axis] = true;
    }

    /// Effective strides of every axis.
    pub fn effective(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rank()).map(|axis| self.stride(axis))
    }

    /// Linear offset of the element at `indices`.
    pub fn offset(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(indices.len(), self.rank());
        indices
            .iter()
            .zip(self.effective())
            .map(|(index, stride)| index * stride)
            .sum()
    }
}
