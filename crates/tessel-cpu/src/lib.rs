//! Host execution of tessel kernels.
//!
//! The [Interpreter] runs a [KernelDefinition](tessel_core::ir::KernelDefinition) exactly as
//! a device would: one independent logical thread per grid point, sequential loops inside the
//! thread. It is the reference the emitted kernels are checked against.

mod error;
mod interpreter;
mod variables;

pub use error::*;
pub use interpreter::*;
