//! # Contiguous Stride Builders

use crate::{Strides, strides};

/// Contiguous strides where the last axis varies fastest.
///
/// `strides[rank - 1] == 1` and `strides[i] == strides[i + 1] * shape[i + 1]`.
/// A rank 0 shape has no strides.
pub fn row_major_contiguous_strides<S>(shape: S) -> Strides
where
    S: AsRef<[usize]>,
{
    let shape = shape.as_ref();
    let mut strides = strides![1; shape.len()];
    for axis in (1..shape.len()).rev() {
        strides[axis - 1] = strides[axis] * shape[axis];
    }
    strides
}

/// Contiguous strides where the first axis varies fastest.
///
/// `strides[0] == 1` and `strides[i] == strides[i - 1] * shape[i - 1]`.
pub fn column_major_contiguous_strides<S>(shape: S) -> Strides
where
    S: AsRef<[usize]>,
{
    let shape = shape.as_ref();
    let mut strides = strides![1; shape.len()];
    for axis in 1..shape.len() {
        strides[axis] = strides[axis - 1] * shape[axis - 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_axis_is_contiguous_in_row_major() {
        assert_eq!(row_major_contiguous_strides([]), strides![]);
        assert_eq!(row_major_contiguous_strides([1, 2, 3]), strides![6, 3, 1]);
        assert_eq!(
            row_major_contiguous_strides([2, 3, 5, 7, 8]),
            strides![840, 280, 56, 8, 1]
        );
    }

    #[test]
    fn first_axis_is_contiguous_in_column_major() {
        assert_eq!(column_major_contiguous_strides([]), strides![]);
        assert_eq!(column_major_contiguous_strides([2, 3, 4]), strides![1, 2, 6]);
    }
}
