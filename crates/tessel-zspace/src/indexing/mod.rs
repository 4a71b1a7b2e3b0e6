//! Indexing Utilities
//!
//! Plain numeric ravel/unravel, used as the nested-loop reference for flattened addressing.

use smallvec::SmallVec;

use crate::INLINE_DIMS;

/// Linear offset of `indices` under `strides`.
pub fn ravel_index(indices: &[usize], strides: &[usize]) -> usize {
    debug_assert_eq!(indices.len(), strides.len());
    indices
        .iter()
        .zip(strides.iter())
        .map(|(index, stride)| index * stride)
        .sum()
}

/// Row-major multi-axis index of the `linear`-th point of `shape`.
///
/// The last axis varies fastest.
pub fn unravel_index(mut linear: usize, shape: &[usize]) -> SmallVec<[usize; INLINE_DIMS]> {
    let mut indices = SmallVec::from_elem(0, shape.len());
    for (axis, dim) in shape.iter().enumerate().rev() {
        indices[axis] = linear % dim;
        linear /= dim;
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::striding::row_major_contiguous_strides;
    use pretty_assertions::assert_eq;

    #[test]
    fn unravel_is_row_major() {
        assert_eq!(unravel_index(0, &[2, 3]).as_slice(), &[0, 0]);
        assert_eq!(unravel_index(4, &[2, 3]).as_slice(), &[1, 1]);
        assert_eq!(unravel_index(279, &[5, 7, 8]).as_slice(), &[4, 6, 7]);
    }

    #[test]
    fn ravel_inverts_unravel_for_contiguous_strides() {
        let shape = [2, 3, 5, 7, 8];
        let strides = row_major_contiguous_strides(shape);
        for linear in 0..shape.iter().product::<usize>() {
            let indices = unravel_index(linear, &shape);
            assert_eq!(ravel_index(&indices, &strides), linear);
        }
    }
}
