/// Compilation config module.
pub mod compilation;
/// Grid config module.
pub mod grid;

mod base;
mod logger;

pub use base::*;
pub use logger::{BinaryLogLevel, CompilationLogger, LogCrateLevel, LogLevel, LoggerConfig};
