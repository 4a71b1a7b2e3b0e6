use std::fmt::Display;

use tessel_core::ir::GridAxis;

use super::{Dialect, Instruction};

/// Body of the entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Body<D: Dialect> {
    /// Grid coordinates, declared in order as `gidx0`, `gidx1`, ...
    pub coordinates: Vec<GridAxis>,
    pub instructions: Vec<Instruction<D>>,
}

impl<D: Dialect> Display for Body<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (position, axis) in self.coordinates.iter().enumerate() {
            write!(f, "  int gidx{position} = ")?;
            D::compile_grid_index(f, axis.dim)?;
            writeln!(f, "; /* {} */", axis.extent)?;
        }

        for instruction in self.instructions.iter() {
            instruction.fmt_indented(f, 1)?;
        }

        Ok(())
    }
}
