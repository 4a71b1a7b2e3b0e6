use tessel_core::ir::Id;
use thiserror::Error;

/// Errors raised while running a kernel on the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The kernel declares a buffer the launch didn't provide.
    #[error("Buffer data{id} is declared by the kernel but wasn't provided")]
    MissingBuffer { id: Id },

    /// A load or store falls outside its buffer.
    #[error("Access to data{buffer} at {index} is out of bounds (len {len})")]
    OutOfBounds { buffer: Id, index: i64, len: usize },

    /// A variable is read before being declared in an enclosing scope.
    #[error("Variable {name} is used before being declared")]
    UnboundVariable { name: String },

    /// An integer expression divides by zero.
    #[error("Division by zero in {expr}")]
    DivisionByZero { expr: String },
}
