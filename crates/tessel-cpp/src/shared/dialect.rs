use std::fmt::Debug;
use std::hash::Hash;

use tessel_core::ir::{BinaryOp, GridDim};

use super::{Binding, Elem};

// Base dialect

/// The parts of the emitted source that differ between C++ GPU languages.
///
/// Everything is written through static functions so a dialect stays a zero-sized marker.
pub trait Dialect:
    DialectIncludes<Self>
    + DialectTypes<Self>
    + DialectBindings<Self>
    + DialectGridBuiltins<Self>
    + Default
    + Clone
    + Copy
    + Debug
    + Send
    + Sync
    + Eq
    + Hash
    + 'static
{
    /// Tag of the language, used when logging compiled kernels.
    const LANG_TAG: &'static str;
    /// Extension of the emitted source files.
    const EXTENSION: &'static str;
}

// Includes

pub trait DialectIncludes<D: Dialect> {
    /// Headers and defines at the top of the source, `INFINITY` and `NAN` included.
    fn compile_includes(f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;
}

// Types

pub trait DialectTypes<D: Dialect> {
    fn compile_elem(f: &mut std::fmt::Formatter<'_>, elem: &Elem<D>) -> std::fmt::Result {
        match elem {
            Elem::F32 => f.write_str("float"),
            Elem::F64 => f.write_str("double"),
            Elem::I32 => f.write_str("int"),
            Elem::_Dialect(_) => Ok(()),
        }
    }

    fn compile_type_definitions(_f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }

    /// Name of the function computing `op` when it isn't an infix operator.
    fn compile_binary_function(
        f: &mut std::fmt::Formatter<'_>,
        op: BinaryOp,
    ) -> std::fmt::Result {
        match op {
            BinaryOp::Max => f.write_str("max"),
            BinaryOp::Min => f.write_str("min"),
            _ => write!(f, "{op}"),
        }
    }
}

// Kernel argument bindings

pub trait DialectBindings<D: Dialect> {
    /// Entry point declaration, without the opening brace of the body.
    fn compile_kernel_signature(
        f: &mut std::fmt::Formatter<'_>,
        kernel_name: &str,
        buffers: &[Binding<D>],
        threads: u32,
    ) -> std::fmt::Result;

    fn compile_parameters(
        f: &mut std::fmt::Formatter<'_>,
        buffers: &[Binding<D>],
    ) -> std::fmt::Result {
        for (i, binding) in buffers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{binding}")?;
        }
        Ok(())
    }
}

// Grid builtins

pub trait DialectGridBuiltins<D: Dialect> {
    fn compile_grid_index(f: &mut std::fmt::Formatter<'_>, dim: GridDim) -> std::fmt::Result {
        write!(f, "blockIdx.{dim}")
    }
}
