//! Kernel intermediate representation produced by lowering and consumed by emitters and
//! the reference interpreter.
//!
//! Integer index arithmetic is kept symbolic ([IndexExpr], [Condition]) so every target
//! renders the same math in its own syntax.

#[macro_use]
extern crate derive_new;

mod elem;
mod index;
mod instruction;
mod kernel;

pub use elem::*;
pub use index::*;
pub use instruction::*;
pub use kernel::*;

/// Identifier of a kernel-local variable or buffer binding.
pub type Id = u32;
