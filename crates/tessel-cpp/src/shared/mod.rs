mod base;
mod body;
mod dialect;
mod element;
mod index;
mod instruction;
mod kernel;

pub use base::*;
pub use body::*;
pub use dialect::*;
pub use element::*;
pub use index::*;
pub use instruction::*;
pub use kernel::*;
