//! Recovering logical axis indices from grid coordinates and loop counters.
//!
//! A coordinate carrying a single axis is that axis' index. A coordinate folding axes
//! `a_0..a_k` (outermost first) yields `i_j = (coord / P_j) % s_j` where `P_j` is the product
//! of the sizes of the axes inner to `a_j`. This is exactly row-major unravelling of the
//! coordinate over the folded sizes.

use tessel_ir::IndexExpr;
use tessel_zspace::{Shape, StrideDescriptor};

use crate::{AxisPartition, GridBinding};

/// Symbolic index of one logical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisIndex {
    /// Unbound size-1 axis, always 0.
    Zero,
    /// The axis alone owns grid coordinate `position`.
    Coordinate { position: u8 },
    /// One axis folded into grid coordinate `position`.
    ///
    /// The modulus is `None` for the outermost axis of the fold, whose quotient is already
    /// bounded by the coordinate range.
    Component {
        position: u8,
        divisor: u64,
        modulus: Option<u64>,
    },
    /// Sequential axis iterated by loop `position`.
    Loop { position: u8 },
}

impl AxisIndex {
    /// The index as an integer expression, `None` when it is the constant 0.
    pub fn expr(&self) -> Option<IndexExpr> {
        match self {
            AxisIndex::Zero => None,
            AxisIndex::Coordinate { position } => Some(IndexExpr::grid(*position)),
            AxisIndex::Component {
                position,
                divisor,
                modulus,
            } => {
                let quotient = IndexExpr::grid(*position).divided(*divisor as i64);
                Some(match modulus {
                    Some(modulus) => quotient.remainder(*modulus as i64),
                    None => quotient,
                })
            }
            AxisIndex::Loop { position } => Some(IndexExpr::loop_var(*position)),
        }
    }

    /// Numeric value of the index for the given coordinate and loop counter values.
    pub fn evaluate(&self, coordinates: &[u64], loops: &[u64]) -> u64 {
        match self {
            AxisIndex::Zero => 0,
            AxisIndex::Coordinate { position } => coordinates[*position as usize],
            AxisIndex::Component {
                position,
                divisor,
                modulus,
            } => {
                let quotient = coordinates[*position as usize] / divisor;
                match modulus {
                    Some(modulus) => quotient % modulus,
                    None => quotient,
                }
            }
            AxisIndex::Loop { position } => loops[*position as usize],
        }
    }
}

/// Index of every logical axis of an iteration domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMap {
    axes: Vec<AxisIndex>,
}

impl IndexMap {
    pub fn new(domain: &Shape, partition: &AxisPartition, binding: &GridBinding) -> Self {
        let mut axes = vec![AxisIndex::Zero; domain.rank()];

        for (position, group) in binding.groups.iter().enumerate() {
            let position = position as u8;

            if let [axis] = group.axes.as_slice() {
                axes[*axis] = AxisIndex::Coordinate { position };
                continue;
            }

            let mut divisor = 1;
            for (rank, axis) in group.axes.iter().enumerate().rev() {
                let size = domain[*axis] as u64;
                axes[*axis] = AxisIndex::Component {
                    position,
                    divisor,
                    modulus: (rank > 0).then_some(size),
                };
                divisor *= size;
            }
        }

        for (position, axis) in partition.sequential.iter().enumerate() {
            axes[*axis] = AxisIndex::Loop {
                position: position as u8,
            };
        }

        Self { axes }
    }

    pub fn axis(&self, axis: usize) -> &AxisIndex {
        &self.axes[axis]
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// Logical index of every axis for the given coordinate and loop counter values.
    pub fn evaluate(&self, coordinates: &[u64], loops: &[u64]) -> Vec<u64> {
        self.axes
            .iter()
            .map(|index| index.evaluate(coordinates, loops))
            .collect()
    }
}

/// A linear buffer offset before materialization: `sum(index(axis) * coefficient) + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineAddress {
    /// `(axis, coefficient)` pairs in axis order, without zero coefficients.
    pub terms: Vec<(usize, i64)>,
    pub offset: i64,
}

impl AffineAddress {
    /// Address of an operand read through `strides` over the iteration domain.
    ///
    /// Broadcast axes contribute no term.
    pub fn from_strides(strides: &StrideDescriptor) -> Self {
        let terms = strides
            .effective()
            .enumerate()
            .filter(|(_, stride)| *stride != 0)
            .map(|(axis, stride)| (axis, stride as i64))
            .collect();

        Self { terms, offset: 0 }
    }

    pub fn coefficient(&self, axis: usize) -> i64 {
        self.terms
            .iter()
            .find(|(term, _)| *term == axis)
            .map(|(_, coefficient)| *coefficient)
            .unwrap_or(0)
    }

    /// Address of the same operand when its data starts at `start` along `axis` of the domain.
    pub fn shifted(mut self, axis: usize, start: usize) -> Self {
        self.offset -= start as i64 * self.coefficient(axis);
        self
    }

    pub fn evaluate(&self, indices: &[u64]) -> i64 {
        self.terms
            .iter()
            .map(|(axis, coefficient)| indices[*axis] as i64 * coefficient)
            .sum::<i64>()
            + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AxisMapper;
    use pretty_assertions::assert_eq;
    use tessel_zspace::{
        MemoryLayout, indexing::ravel_index, indexing::unravel_index, shape, strides,
    };

    fn index_map(domain: &Shape, reduce: &[usize]) -> IndexMap {
        let partition = AxisPartition::new(domain.rank(), reduce);
        let output = StrideDescriptor::new(MemoryLayout::RowMajor.strides(domain).unwrap());
        let binding = AxisMapper::default()
            .bind(domain, &partition, &output)
            .unwrap();
        IndexMap::new(domain, &partition, &binding)
    }

    #[test]
    fn folded_axes_use_div_mod() {
        let map = index_map(&shape![2, 3, 5, 7, 8], &[]);

        let rendered: Vec<String> = (0..5)
            .map(|axis| map.axis(axis).expr().unwrap().to_string())
            .collect();

        assert_eq!(
            rendered,
            vec!["gidx0", "gidx1", "(gidx2 / 56)", "((gidx2 / 8) % 7)", "(gidx2 % 8)"]
        );
    }

    #[test]
    fn folded_coordinate_unravels_row_major() {
        let domain = shape![2, 3, 5, 7, 8];
        let map = index_map(&domain, &[]);

        for linear in 0..280 {
            let indices = map.evaluate(&[1, 2, linear], &[]);
            let expected = unravel_index(linear as usize, &[5, 7, 8]);
            let expected: Vec<u64> = [1, 2]
                .into_iter()
                .chain(expected.iter().map(|index| *index as u64))
                .collect();

            assert_eq!(indices, expected);
        }
    }

    #[test]
    fn address_matches_nested_loop_offset() {
        let domain = shape![2, 3, 5, 7, 8];
        let map = index_map(&domain, &[]);
        let operand = StrideDescriptor::broadcast_to(
            &shape![2, 1, 5, 1, 8],
            &MemoryLayout::Strided(strides![40, 0, 8, 0, 1]),
            &domain,
        )
        .unwrap();
        let address = AffineAddress::from_strides(&operand);

        assert_eq!(address.terms, vec![(0, 40), (2, 8), (4, 1)]);

        for gidx0 in 0..2 {
            for gidx1 in 0..3 {
                for gidx2 in 0..280 {
                    let indices = map.evaluate(&[gidx0, gidx1, gidx2], &[]);
                    let nested: Vec<usize> = indices.iter().map(|index| *index as usize).collect();
                    let reference = ravel_index(&nested, &[40, 0, 8, 0, 1]);

                    assert_eq!(address.evaluate(&indices), reference as i64);
                }
            }
        }
    }

    #[test]
    fn sequential_axes_are_loops_and_unit_axes_zero() {
        let map = index_map(&shape![256, 1, 256], &[2]);

        assert_eq!(*map.axis(0), AxisIndex::Coordinate { position: 0 });
        assert_eq!(*map.axis(1), AxisIndex::Zero);
        assert_eq!(*map.axis(2), AxisIndex::Loop { position: 0 });
        assert_eq!(map.evaluate(&[17], &[42]), vec![17, 0, 42]);
    }

    #[test]
    fn shifted_address_subtracts_start() {
        let address = AffineAddress {
            terms: vec![(0, 65), (1, 1)],
            offset: 0,
        };

        let shifted = address.shifted(1, 130);

        assert_eq!(shifted.offset, -130);
        assert_eq!(shifted.evaluate(&[2, 135]), 2 * 65 + 5);
    }
}
