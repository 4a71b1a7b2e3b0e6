use tessel_zspace::ShapeError;
use thiserror::Error;

use crate::GridLimits;

/// Errors raised while lowering one operation.
///
/// Lowering never mutates shared state, so an error only aborts the operation it was raised
/// for; the caller decides whether to keep lowering the others.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// Operand shapes can't be broadcast against each other or the output.
    #[error("Incompatible operand shapes\nCaused by:\n  {0}")]
    ShapeMismatch(#[from] ShapeError),

    /// The parallel axes don't fit the launch grid, even after folding.
    #[error(
        "Parallel extents {extents:?} can't be bound to the launch grid.\nCapacities are x={}, y={}, z={}.",
        limits.x,
        limits.y,
        limits.z
    )]
    GridCapacityExceeded {
        /// Extents of the parallel axes, outermost first.
        extents: Vec<u64>,
        /// Capacities the binding was checked against.
        limits: GridLimits,
    },

    /// Concatenation or padding sources don't cover every output position exactly once.
    #[error(
        "Sources along axis {axis} cover output position {position} {covered} time(s), expected exactly once"
    )]
    CoverageGap {
        /// The concatenation or padding axis.
        axis: usize,
        /// First output position where the coverage breaks.
        position: usize,
        /// Number of sources covering that position.
        covered: usize,
    },

    /// The descriptor contradicts itself.
    #[error("Invalid operation descriptor\nCaused by:\n  {reason}")]
    InvalidDescriptor {
        /// What is inconsistent.
        reason: String,
    },
}

impl LoweringError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        LoweringError::InvalidDescriptor {
            reason: reason.into(),
        }
    }
}
