//! Lowering of tensor operations into grid-mapped GPU kernels.
//!
//! ```ignore
//! use tessel::prelude::*;
//!
//! let descriptor = OperationDescriptor::elementwise(
//!     ElementwiseOp::Sub,
//!     OperandDescriptor::contiguous([2, 3]),
//!     vec![Source::buffer([2, 3]), Source::buffer([3])],
//! );
//! let kernel = tessel::compile(HipCompiler::new(), &descriptor)?;
//! println!("{}", kernel.source);
//! ```

pub use tessel_core::*;

pub use tessel_cpp as cpp;

#[cfg(feature = "hip")]
pub use tessel_cpp::HipCompiler;

#[cfg(feature = "cuda")]
pub use tessel_cpp::CudaCompiler;

#[cfg(feature = "cpu")]
pub use tessel_cpu as cpu;

pub mod prelude;

/// Lower `descriptor` and compile it with `compiler` in a fresh session.
///
/// Use a [KernelCompiler] directly to keep kernel names unique across several operations.
pub fn compile<C: Compiler>(
    compiler: C,
    descriptor: &OperationDescriptor,
) -> Result<CompiledKernel, LoweringError> {
    KernelCompiler::new(compiler).compile(descriptor)
}
