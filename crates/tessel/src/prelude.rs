pub use tessel_core::{
    CompiledKernel, Compiler, ElementwiseOp, KernelCompiler, Lowerer, LoweringError,
    OperandDescriptor, OperationDescriptor, OperationKind, ReduceOp, Source,
    ir::{ConstantValue, Elem, KernelDefinition, LaunchConfig},
    zspace::{MemoryLayout, Shape},
};

#[cfg(feature = "hip")]
pub use tessel_cpp::HipCompiler;

#[cfg(feature = "cuda")]
pub use tessel_cpp::CudaCompiler;

#[cfg(feature = "cpu")]
pub use tessel_cpu::{ExecutionStats, Interpreter};
