use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Elem, Id, Instruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Read,
    ReadWrite,
}

/// A buffer parameter of the kernel entry point.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub id: Id,
    pub elem: Elem,
    pub visibility: Visibility,
    /// Minimum number of elements the buffer must hold.
    pub size: usize,
}

/// One of the three launch grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GridDim {
    X,
    Y,
    Z,
}

impl Display for GridDim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GridDim::X => f.write_str("x"),
            GridDim::Y => f.write_str("y"),
            GridDim::Z => f.write_str("z"),
        }
    }
}

/// A grid coordinate declared by the kernel, in declaration order.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridAxis {
    pub dim: GridDim,
    pub extent: u32,
}

/// Number of blocks along each grid dimension.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridSize {
    pub fn get(&self, dim: GridDim) -> u32 {
        match dim {
            GridDim::X => self.x,
            GridDim::Y => self.y,
            GridDim::Z => self.z,
        }
    }

    pub fn num_blocks(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

/// Number of threads in one block.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDim {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockDim {
    pub fn num_elems(&self) -> u32 {
        self.x * self.y * self.z
    }
}

impl Default for BlockDim {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

/// Launch metadata emitted alongside the kernel source.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub grid: GridSize,
    pub block: BlockDim,
}

impl LaunchConfig {
    /// Build the launch configuration covering `coordinates` with one thread per block.
    ///
    /// Dimensions without a declared coordinate are launched with size 1.
    pub fn single_thread(coordinates: &[GridAxis]) -> Self {
        let extent = |dim: GridDim| {
            coordinates
                .iter()
                .find(|axis| axis.dim == dim)
                .map(|axis| axis.extent)
                .unwrap_or(1)
        };

        Self {
            grid: GridSize::new(extent(GridDim::X), extent(GridDim::Y), extent(GridDim::Z)),
            block: BlockDim::default(),
        }
    }
}

/// A fully lowered kernel, independent of the target language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelDefinition {
    pub name: String,
    pub elem: Elem,
    /// Buffer parameters: the output first, then inputs in source order.
    pub buffers: Vec<Binding>,
    pub coordinates: Vec<GridAxis>,
    pub body: Vec<Instruction>,
    pub launch: LaunchConfig,
}
