use tessel_ir::{BinaryOp, Condition, ConstantValue, ElemExpr, Value};
use tessel_zspace::ShapeError;

use super::{LoweringContext, LoweringRule, OUTPUT_BUFFER, OperandAccess, RulePlan, own_strides};
use crate::{KernelBuilder, LoweringError, OperationDescriptor, Source};

/// Sum over every source of `guard ? value : 0`, where source `i` covers
/// `intervals[i] = start..end` along `axis`.
#[derive(new, Debug, Clone)]
pub struct ConcatRule {
    axis: usize,
    intervals: Vec<(usize, usize)>,
}

impl LoweringRule for ConcatRule {
    fn lower(&self, context: &LoweringContext, builder: &mut KernelBuilder<'_>) {
        for (operand, (start, _)) in context.operands.iter().zip(self.intervals.iter()) {
            if let OperandAccess::Buffer { address, .. } = operand {
                builder.register_access(address);
            }
            builder.register_lower_bound(self.axis, *start);
        }
        builder.register_access(&context.output);

        let extent = context.domain[self.axis];
        let neutral = ConstantValue::zero(context.elem);
        let values: Vec<ElemExpr> = context
            .operands
            .iter()
            .zip(self.intervals.iter())
            .map(|(operand, (start, end))| match operand {
                OperandAccess::Buffer { id, address } => {
                    let address = builder.address(&address.clone().shifted(self.axis, *start));
                    let guard = builder.interval_guard(self.axis, *start, *end, extent);
                    builder
                        .load(*id, address, Condition::all(guard), neutral)
                        .into()
                }
                OperandAccess::Constant(value) => Value::Constant(*value).into(),
            })
            .collect();

        let address = builder.address(&context.output);
        builder.store(OUTPUT_BUFFER, address, ElemExpr::fold(BinaryOp::Add, values));
    }
}

/// Check that `intervals` tile `0..extent` along `axis`: every position is covered by
/// exactly one interval.
pub fn check_coverage(
    axis: usize,
    intervals: &[(usize, usize)],
    extent: usize,
) -> Result<(), LoweringError> {
    let mut sorted: Vec<(usize, usize)> = intervals
        .iter()
        .copied()
        .filter(|(start, end)| start < end)
        .collect();
    sorted.sort_unstable();

    let mut position = 0;
    for (start, end) in sorted {
        if start > position {
            return Err(LoweringError::CoverageGap {
                axis,
                position,
                covered: 0,
            });
        }
        if start < position {
            return Err(LoweringError::CoverageGap {
                axis,
                position: start,
                covered: 2,
            });
        }
        position = end;
    }

    match position.cmp(&extent) {
        core::cmp::Ordering::Less => Err(LoweringError::CoverageGap {
            axis,
            position,
            covered: 0,
        }),
        core::cmp::Ordering::Equal => Ok(()),
        core::cmp::Ordering::Greater => Err(LoweringError::invalid(format!(
            "sources along axis {axis} end at {position}, past the output extent {extent}"
        ))),
    }
}

pub(super) fn plan(
    axis: usize,
    offsets: &[usize],
    descriptor: &OperationDescriptor,
) -> Result<RulePlan, LoweringError> {
    let domain = descriptor.output.shape.clone();
    let rank = domain.rank();

    if axis >= rank {
        return Err(LoweringError::invalid(format!(
            "concatenation axis {axis} is out of range for {domain}"
        )));
    }
    if descriptor.inputs.is_empty() || offsets.len() != descriptor.inputs.len() {
        return Err(LoweringError::invalid(format!(
            "{} offset(s) given for {} source(s)",
            offsets.len(),
            descriptor.inputs.len()
        )));
    }

    let mut sources = Vec::with_capacity(descriptor.inputs.len());
    let mut intervals = Vec::with_capacity(descriptor.inputs.len());

    for (source, offset) in descriptor.inputs.iter().zip(offsets.iter()) {
        let Source::Buffer(operand) = source else {
            return Err(LoweringError::invalid(
                "concatenation sources must be buffers",
            ));
        };
        let shape = &operand.shape;
        if shape.rank() != rank {
            return Err(ShapeError::RankMismatch {
                left: rank,
                right: shape.rank(),
            }
            .into());
        }
        if let Some(other) = (0..rank).find(|other| *other != axis && shape[*other] != domain[*other])
        {
            return Err(ShapeError::Mismatch {
                left: shape.clone(),
                right: domain.clone(),
                axis: other,
            }
            .into());
        }

        let end = offset.checked_add(shape[axis]).ok_or_else(|| {
            LoweringError::invalid(format!(
                "source of extent {} at offset {offset} overflows axis {axis}",
                shape[axis]
            ))
        })?;
        intervals.push((*offset, end));
        sources.push(Some(own_strides(operand)?));
    }

    check_coverage(axis, &intervals, domain[axis])?;

    let output = own_strides(&descriptor.output)?;

    Ok(RulePlan {
        domain,
        reduce_axes: Vec::new(),
        output,
        sources,
        rule: Box::new(ConcatRule::new(axis, intervals)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lowerer, OperandDescriptor};
    use pretty_assertions::assert_eq;
    use tessel_ir::Instruction;

    fn concat(offsets: Vec<usize>, sizes: &[usize]) -> OperationDescriptor {
        let total = sizes.iter().sum::<usize>();
        OperationDescriptor::concat(
            1,
            offsets,
            OperandDescriptor::contiguous([4, total]),
            sizes.iter().map(|size| Source::buffer([4, *size])).collect(),
        )
    }

    #[test]
    fn offset_past_the_address_space_is_invalid() {
        let err = Lowerer::default()
            .lower(&concat(vec![0, usize::MAX], &[3, 4]))
            .unwrap_err();

        assert!(
            matches!(err, LoweringError::InvalidDescriptor { .. }),
            "Expected an invalid descriptor, got {err:?}"
        );
    }

    #[test]
    fn tiling_intervals_are_accepted_in_any_order() {
        assert_eq!(check_coverage(0, &[(65, 130), (0, 65), (130, 195)], 195), Ok(()));
    }

    #[test]
    fn gap_is_reported_at_its_first_position() {
        assert_eq!(
            check_coverage(1, &[(0, 60), (65, 195)], 195),
            Err(LoweringError::CoverageGap {
                axis: 1,
                position: 60,
                covered: 0,
            })
        );
        assert_eq!(
            check_coverage(1, &[(0, 65), (65, 190)], 195),
            Err(LoweringError::CoverageGap {
                axis: 1,
                position: 190,
                covered: 0,
            })
        );
    }

    #[test]
    fn overlap_is_reported() {
        assert_eq!(
            check_coverage(0, &[(0, 70), (65, 130)], 130),
            Err(LoweringError::CoverageGap {
                axis: 0,
                position: 65,
                covered: 2,
            })
        );
    }

    #[test]
    fn overlapping_descriptor_fails_before_emission() {
        let descriptor = concat(vec![0, 2], &[3, 3]);

        assert!(matches!(
            Lowerer::default().lower(&descriptor),
            Err(LoweringError::CoverageGap { covered: 2, .. })
        ));
    }

    #[test]
    fn every_source_is_guarded_and_shifted() {
        let descriptor = concat(vec![0, 3], &[3, 5]);

        let kernel = Lowerer::default().lower(&descriptor).unwrap();
        let loads: Vec<(i64, Option<String>)> = kernel
            .body
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Load {
                    address, guard, ..
                } => Some((address.offset, guard.as_ref().map(|guard| guard.to_string()))),
                _ => None,
            })
            .collect();

        assert_eq!(
            loads,
            vec![
                (0, Some("gidx1 < 3".to_string())),
                (-3, Some("(gidx1 * -1) < -2".to_string())),
            ]
        );
    }

    #[test]
    fn source_disagreeing_off_axis_is_a_shape_mismatch() {
        let descriptor = OperationDescriptor::concat(
            1,
            vec![0, 3],
            OperandDescriptor::contiguous([4, 6]),
            vec![Source::buffer([4, 3]), Source::buffer([5, 3])],
        );

        assert!(matches!(
            Lowerer::default().lower(&descriptor),
            Err(LoweringError::ShapeMismatch(ShapeError::Mismatch { axis: 0, .. }))
        ));
    }
}
