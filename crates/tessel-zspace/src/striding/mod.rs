//! Stride layouts and per-operand stride descriptors.

mod descriptor;
mod layout_builders;

pub use descriptor::*;
pub use layout_builders::*;
