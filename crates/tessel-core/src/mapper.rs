//! Axis-to-grid mapping.
//!
//! Parallel axes are bound to the three launch grid dimensions, one logical thread per
//! combination of their indices. When more axes remain than there are dimensions, or an
//! axis is too large for its dimension, adjacent axes are folded into a composite
//! coordinate that the index builder decomposes again with div/mod.

use serde::{Deserialize, Serialize};
use tessel_ir::{GridAxis, GridDim};
use tessel_zspace::{Shape, StrideDescriptor};

use crate::LoweringError;

/// Maximum number of blocks along each grid dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLimits {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            x: i32::MAX as u32,
            y: 65535,
            z: 65535,
        }
    }
}

impl GridLimits {
    pub fn capacity(&self, dim: GridDim) -> u64 {
        match dim {
            GridDim::X => self.x as u64,
            GridDim::Y => self.y as u64,
            GridDim::Z => self.z as u64,
        }
    }
}

/// Split of the iteration domain into parallel and sequential axes.
///
/// Parallel axes keep the domain order, sequential axes keep the order they were reduced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPartition {
    pub parallel: Vec<usize>,
    pub sequential: Vec<usize>,
}

impl AxisPartition {
    /// Every axis of a domain of `rank` axes is parallel except the `reduce_axes`.
    pub fn new(rank: usize, reduce_axes: &[usize]) -> Self {
        let parallel = (0..rank)
            .filter(|axis| !reduce_axes.contains(axis))
            .collect();
        let sequential = reduce_axes.to_vec();
        Self {
            parallel,
            sequential,
        }
    }
}

/// Parallel axes sharing one grid dimension, outermost axis first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisGroup {
    pub dim: GridDim,
    pub axes: Vec<usize>,
    pub extent: u64,
}

/// The grid coordinates of a kernel, in declaration order (`gidx0` first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridBinding {
    pub groups: Vec<AxisGroup>,
}

impl GridBinding {
    pub fn coordinates(&self) -> Vec<GridAxis> {
        self.groups
            .iter()
            .map(|group| GridAxis::new(group.dim, group.extent as u32))
            .collect()
    }
}

/// Binds the parallel axes of an iteration domain to the launch grid.
#[derive(new, Debug, Clone, Copy, Default)]
pub struct AxisMapper {
    limits: GridLimits,
}

impl AxisMapper {
    /// Bind the parallel axes of `domain`.
    ///
    /// Axes are ordered by descending stride in the `output` layout, ties by declaration
    /// order. Size-1 axes are left unbound. Groups are bound from the innermost: the last
    /// group to `x`, then `y`, then `z`.
    pub fn bind(
        &self,
        domain: &Shape,
        partition: &AxisPartition,
        output: &StrideDescriptor,
    ) -> Result<GridBinding, LoweringError> {
        let mut axes: Vec<usize> = partition
            .parallel
            .iter()
            .copied()
            .filter(|axis| domain[*axis] > 1)
            .collect();
        axes.sort_by_key(|axis| core::cmp::Reverse(output.layout_stride(*axis)));

        let mut groups: Vec<(Vec<usize>, u64)> = axes
            .iter()
            .map(|axis| (vec![*axis], domain[*axis] as u64))
            .collect();

        while !self.fits(&groups) {
            let merged = match self.foldable_pair(&groups) {
                Some(index) => index,
                None => {
                    return Err(LoweringError::GridCapacityExceeded {
                        extents: axes.iter().map(|axis| domain[*axis] as u64).collect(),
                        limits: self.limits,
                    });
                }
            };

            let (inner_axes, inner_extent) = groups.remove(merged + 1);
            let (outer_axes, outer_extent) = &mut groups[merged];
            outer_axes.extend(inner_axes);
            *outer_extent *= inner_extent;
        }

        let dims = dims_for(groups.len());
        let groups: Vec<AxisGroup> = groups
            .into_iter()
            .zip(dims.iter())
            .map(|((axes, extent), dim)| AxisGroup {
                dim: *dim,
                axes,
                extent,
            })
            .collect();

        log::debug!(
            "Bound {} parallel axes of {domain} to {:?}",
            axes.len(),
            groups
                .iter()
                .map(|group| (group.dim, group.extent))
                .collect::<Vec<_>>()
        );

        Ok(GridBinding { groups })
    }

    fn fits(&self, groups: &[(Vec<usize>, u64)]) -> bool {
        groups.len() <= 3
            && groups
                .iter()
                .zip(dims_for(groups.len()))
                .all(|((_, extent), dim)| *extent <= self.limits.capacity(*dim))
    }

    /// Innermost adjacent pair whose merged extent fits the dimension it would land on.
    fn foldable_pair(&self, groups: &[(Vec<usize>, u64)]) -> Option<usize> {
        let count = groups.len();
        if count < 2 {
            return None;
        }

        (0..count - 1).rev().find(|index| {
            let merged = groups[*index].1.checked_mul(groups[index + 1].1);
            let capacity = match count - 1 {
                remaining if remaining <= 3 => self.limits.capacity(dims_for(remaining)[*index]),
                _ => self.limits.capacity(GridDim::X),
            };
            merged.is_some_and(|merged| merged <= capacity)
        })
    }
}

/// Dimensions of `count <= 3` groups, outermost group first.
fn dims_for(count: usize) -> &'static [GridDim] {
    match count {
        0 => &[],
        1 => &[GridDim::X],
        2 => &[GridDim::Y, GridDim::X],
        _ => &[GridDim::Z, GridDim::Y, GridDim::X],
    }
}
