use thiserror::Error;

use crate::Shape;

/// Errors raised while building or combining shapes and strides.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Two descriptions of the same axes disagree on the number of axes.
    #[error("Rank mismatch: expected {left} axes, got {right}")]
    RankMismatch { left: usize, right: usize },

    /// Two shapes are neither equal nor size 1 on some axis.
    #[error("Shapes {left} and {right} cannot be broadcast together (axis {axis})")]
    Mismatch {
        left: Shape,
        right: Shape,
        axis: usize,
    },

    /// Shapes must only contain positive sizes.
    #[error("Axis {axis} of shape {shape} is empty")]
    EmptyAxis { shape: Shape, axis: usize },

    /// Contiguous strides of the shape don't fit in `usize`.
    #[error("Strides of shape {shape} overflow the address space")]
    StrideOverflow { shape: Shape },
}
