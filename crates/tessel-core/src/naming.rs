use hashbrown::{HashMap, HashSet};
use tessel_ir::KernelDefinition;
use tessel_zspace::Shape;

use crate::{AxisPartition, OperationKind};

/// Name derived from the operation: `E_` or `r_` followed by the extents of the non-unit
/// parallel axes and of the reduced axes.
pub fn kernel_name(kind: &OperationKind, domain: &Shape, partition: &AxisPartition) -> String {
    let prefix = match kind.is_reduce() {
        true => "r",
        false => "E",
    };

    let parallel = partition
        .parallel
        .iter()
        .map(|axis| domain[*axis])
        .filter(|extent| *extent > 1);
    let sequential = partition.sequential.iter().map(|axis| domain[*axis]);

    parallel
        .chain(sequential)
        .fold(prefix.to_string(), |name, extent| format!("{name}_{extent}"))
}

/// Keeps entry point names unique within one compilation session.
///
/// The first kernel using a name keeps it, the `k`-th repeat gets the suffix `n{k}`.
/// Suffixed names already taken by an earlier kernel are skipped.
#[derive(Debug, Default)]
pub struct KernelNamer {
    issued: HashSet<String>,
    repeats: HashMap<String, u32>,
}

impl KernelNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        if self.issued.contains(&name) {
            let repeats = self.repeats.entry(name.clone()).or_insert(0);
            while self.issued.contains(&name) {
                *repeats += 1;
                name = format!("{base}n{repeats}");
            }
        }
        self.issued.insert(name.clone());
        name
    }

    /// Rename `kernel` so it doesn't collide with kernels named before.
    pub fn assign(&mut self, mut kernel: KernelDefinition) -> KernelDefinition {
        kernel.name = self.unique(&kernel.name);
        kernel
    }
}
