use tessel_ir::{Condition, ConstantValue};
use tessel_zspace::ShapeError;

use super::{
    LoweringContext, LoweringRule, OUTPUT_BUFFER, OperandAccess, RulePlan, check_coverage,
    own_strides,
};
use crate::{KernelBuilder, LoweringError, OperationDescriptor, Source};

/// Copy of the single source surrounded by `value`.
///
/// The source covers `intervals[axis] = start..end` of every output axis; the load is
/// guarded by all of them and produces `value` elsewhere.
#[derive(new, Debug, Clone)]
pub struct PadRule {
    intervals: Vec<(usize, usize)>,
    value: ConstantValue,
}

impl LoweringRule for PadRule {
    fn lower(&self, context: &LoweringContext, builder: &mut KernelBuilder<'_>) {
        let Some(OperandAccess::Buffer { id, address }) = context.operands.first() else {
            return;
        };

        builder.register_access(address);
        for (axis, (start, _)) in self.intervals.iter().enumerate() {
            builder.register_lower_bound(axis, *start);
        }
        builder.register_access(&context.output);

        let shifted = self
            .intervals
            .iter()
            .enumerate()
            .fold(address.clone(), |address, (axis, (start, _))| {
                address.shifted(axis, *start)
            });
        let address = builder.address(&shifted);

        let mut guard = Vec::new();
        for (axis, (start, end)) in self.intervals.iter().enumerate() {
            guard.extend(builder.interval_guard(axis, *start, *end, context.domain[axis]));
        }

        let value = builder.load(*id, address, Condition::all(guard), self.value);

        let address = builder.address(&context.output);
        builder.store(OUTPUT_BUFFER, address, value.into());
    }
}

pub(super) fn plan(
    padding: &[(usize, usize)],
    value: ConstantValue,
    descriptor: &OperationDescriptor,
) -> Result<RulePlan, LoweringError> {
    let [Source::Buffer(operand)] = descriptor.inputs.as_slice() else {
        return Err(LoweringError::invalid("padding takes a single buffer source"));
    };

    let domain = descriptor.output.shape.clone();
    let rank = domain.rank();
    if operand.shape.rank() != rank {
        return Err(ShapeError::RankMismatch {
            left: rank,
            right: operand.shape.rank(),
        }
        .into());
    }
    if padding.len() != rank {
        return Err(LoweringError::invalid(format!(
            "{} padding pair(s) given for {rank} axes",
            padding.len()
        )));
    }

    let mut intervals = Vec::with_capacity(rank);
    for (axis, (before, after)) in padding.iter().enumerate() {
        let start = *before;
        let overflow = || {
            LoweringError::invalid(format!(
                "padding ({before}, {after}) overflows axis {axis} of {}",
                operand.shape
            ))
        };
        let end = start.checked_add(operand.shape[axis]).ok_or_else(overflow)?;
        let trailing = end.checked_add(*after).ok_or_else(overflow)?;

        // Leading fill, source, trailing fill.
        check_coverage(axis, &[(0, start), (start, end), (end, trailing)], domain[axis])?;
        intervals.push((start, end));
    }

    let output = own_strides(&descriptor.output)?;

    Ok(RulePlan {
        domain,
        reduce_axes: Vec::new(),
        output,
        sources: vec![Some(own_strides(operand)?)],
        rule: Box::new(PadRule::new(intervals, value)),
    })
}
