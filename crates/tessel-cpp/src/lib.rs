#[macro_use]
extern crate derive_new;

pub mod shared;

pub use shared::{ComputeKernel, CppCompiler, Dialect};

#[cfg(feature = "hip")]
pub mod hip;
#[cfg(feature = "hip")]
pub type HipCompiler = shared::CppCompiler<hip::HipDialect>;

#[cfg(feature = "cuda")]
pub mod cuda;
#[cfg(feature = "cuda")]
pub type CudaCompiler = shared::CppCompiler<cuda::CudaDialect>;
