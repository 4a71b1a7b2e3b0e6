//! Lowering of tensor operation descriptors into grid-mapped kernels.
//!
//! A [OperationDescriptor] names the operation, the shape and layout of its output and its
//! sources. The [Lowerer] turns it into a [KernelDefinition](ir::KernelDefinition): parallel
//! axes are folded onto the three launch grid dimensions, every axis index is recovered
//! from the grid coordinates, and the body reads, combines and writes one output element
//! per grid point. A [Compiler] then renders the definition in a target language.

#[macro_use]
extern crate derive_new;

/// Kernel Internal Representation.
pub use tessel_ir as ir;
/// Shapes, strides and layouts.
pub use tessel_zspace as zspace;

pub mod compute;
pub mod config;
pub mod lower;

mod builder;
mod descriptor;
mod error;
mod index;
mod mapper;
mod naming;

pub use builder::*;
pub use compute::{CompiledKernel, Compiler, KernelCompiler, lower_batch};
pub use descriptor::*;
pub use error::*;
pub use index::*;
pub use lower::Lowerer;
pub use mapper::*;
pub use naming::*;
