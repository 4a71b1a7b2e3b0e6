//! # Shape and stride model for `tessel`
//!
//! Every operand taking part in one lowered operation is described over the same
//! logical axes. This crate owns:
//! - shape construction, validation and broadcasting.
//! - row-major / column-major / explicit stride layouts.
//! - stride descriptors carrying an explicit per-axis broadcast marker.
//! - ravel/unravel helpers used as the reference for flattened addressing.

#![no_std]

extern crate alloc;

mod errors;
pub mod indexing;
pub mod striding;

pub(crate) const INLINE_DIMS: usize = 5;

mod shape;
mod strides;

pub use errors::*;
/// Reexport to avoid annoying rust-analyzer bug where it imports the module instead of the macro
pub use shape::*;
pub use strides::*;
pub use striding::{MemoryLayout, StrideDescriptor};

/// Reexport for use in macros
pub use smallvec::{SmallVec, smallvec};
