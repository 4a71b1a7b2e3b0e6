use tessel_ir::{ElemExpr, Value};
use tessel_zspace::{Shape, ShapeError, StrideDescriptor, Strides};

use super::{
    LoweringContext, LoweringRule, OUTPUT_BUFFER, OperandAccess, RulePlan, aligned_strides,
};
use crate::{KernelBuilder, LoweringError, OperationDescriptor, ReduceOp, Source};

/// Sequential reduction of the sequential axes inside one thread.
///
/// The accumulator is seeded with the identity of the operation, updated once per loop
/// iteration and written after the last loop closes. Every iteration of the reduced domain
/// is executed, even when the combined value can no longer change.
#[derive(new, Debug, Clone, Copy)]
pub struct ReduceRule {
    op: ReduceOp,
}

impl LoweringRule for ReduceRule {
    fn lower(&self, context: &LoweringContext, builder: &mut KernelBuilder<'_>) {
        for operand in context.operands.iter() {
            if let OperandAccess::Buffer { address, .. } = operand {
                builder.register_access(address);
            }
        }
        builder.register_access(&context.output);

        let acc = builder.declare_accumulator(self.op.identity(context.elem));
        for (position, extent) in context.loops.iter().enumerate() {
            builder.open_loop(position as u8, *extent);
        }

        for operand in context.operands.iter() {
            let value = match operand {
                OperandAccess::Buffer { id, address } => {
                    let address = builder.address(address);
                    let neutral = self.op.identity(context.elem);
                    builder.load(*id, address, None, neutral)
                }
                OperandAccess::Constant(value) => Value::Constant(*value),
            };
            let combined = builder.compute(ElemExpr::fold(
                self.op.combine(),
                vec![value.into(), Value::Accumulator(acc).into()],
            ));
            builder.accumulate(acc, combined);
        }

        for _ in context.loops.iter() {
            builder.close_loop();
        }

        let address = builder.address(&context.output);
        builder.store(OUTPUT_BUFFER, address, Value::Accumulator(acc).into());
    }
}

pub(super) fn plan(
    op: ReduceOp,
    axes: &[usize],
    descriptor: &OperationDescriptor,
) -> Result<RulePlan, LoweringError> {
    let [source] = descriptor.inputs.as_slice() else {
        return Err(LoweringError::invalid(format!(
            "a reduction takes one source, got {}",
            descriptor.inputs.len()
        )));
    };

    let domain = source.shape().clone();
    let rank = domain.rank();

    if axes.is_empty() {
        return Err(LoweringError::invalid("a reduction needs at least one axis"));
    }
    for (index, axis) in axes.iter().enumerate() {
        if *axis >= rank {
            return Err(LoweringError::invalid(format!(
                "reduction axis {axis} is out of range for {domain}"
            )));
        }
        if axes[..index].contains(axis) {
            return Err(LoweringError::invalid(format!(
                "reduction axis {axis} is listed twice"
            )));
        }
    }

    let output = output_strides(descriptor, &domain, axes)?;
    let strides = aligned_strides(source, &domain)?;
    let sources = vec![match source {
        Source::Buffer(_) => Some(strides),
        Source::Constant { .. } => None,
    }];

    // Loops nest in the order the axes are listed, the first one outermost.
    Ok(RulePlan {
        domain,
        reduce_axes: axes.to_vec(),
        output,
        sources,
        rule: Box::new(ReduceRule::new(op)),
    })
}

/// Output strides over the reduced domain.
///
/// The output may keep the reduced axes with size 1 or drop them; either way the reduced
/// axes contribute nothing to its address.
fn output_strides(
    descriptor: &OperationDescriptor,
    domain: &Shape,
    axes: &[usize],
) -> Result<StrideDescriptor, LoweringError> {
    let output = &descriptor.output;
    let keep_dim: Shape = domain
        .iter()
        .enumerate()
        .map(|(axis, dim)| match axes.contains(&axis) {
            true => 1,
            false => *dim,
        })
        .collect();
    let dropped: Shape = domain
        .iter()
        .enumerate()
        .filter(|(axis, _)| !axes.contains(axis))
        .map(|(_, dim)| *dim)
        .collect();

    let strides = output.layout.strides(&output.shape)?;
    let strides: Strides = if output.shape == keep_dim {
        strides
    } else if output.shape == dropped {
        let mut kept = strides.iter().copied();
        (0..domain.rank())
            .map(|axis| match axes.contains(&axis) {
                true => 0,
                false => kept.next().unwrap_or(0),
            })
            .collect()
    } else {
        let axis = (0..keep_dim.rank())
            .find(|axis| output.shape.get(*axis) != keep_dim.get(*axis))
            .unwrap_or(0);
        return Err(ShapeError::Mismatch {
            left: output.shape.clone(),
            right: keep_dim,
            axis,
        }
        .into());
    };

    let mut reduced = StrideDescriptor::new(strides);
    for axis in axes.iter() {
        reduced.set_broadcast(*axis);
    }

    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lowerer, OperandDescriptor};
    use pretty_assertions::assert_eq;
    use tessel_ir::{ConstantValue, GridAxis, GridDim, Instruction};
    use tessel_zspace::shape;

    #[test]
    fn kept_and_dropped_outputs_lower_alike() {
        let keep = OperationDescriptor::reduce(
            ReduceOp::Sum,
            vec![1],
            OperandDescriptor::contiguous([32, 8]),
            Source::buffer([32, 8]),
        );
        let keep = OperationDescriptor {
            output: OperandDescriptor::contiguous([32, 1]),
            ..keep
        };
        let drop = OperationDescriptor {
            output: OperandDescriptor::contiguous([32]),
            ..keep.clone()
        };

        let keep = Lowerer::default().lower(&keep).unwrap();
        let drop = Lowerer::default().lower(&drop).unwrap();

        assert_eq!(keep.body, drop.body);
        assert_eq!(keep.coordinates, vec![GridAxis::new(GridDim::X, 32)]);
        assert_eq!(keep.name, "r_32_8");
    }

    #[test]
    fn accumulator_is_seeded_and_written_after_the_loop() {
        let descriptor = OperationDescriptor::reduce(
            ReduceOp::Max,
            vec![1],
            OperandDescriptor::contiguous([256, 1]),
            Source::constant(ConstantValue::Float(1.0), shape![256, 256]),
        );

        let kernel = Lowerer::default().lower(&descriptor).unwrap();
        let rendered: Vec<String> = kernel
            .body
            .iter()
            .map(|instruction| match instruction {
                Instruction::DeclareAccumulator { out, init } => format!("acc{out} = {init}"),
                Instruction::RangeLoop { var, end, body } => {
                    format!("loop ridx{var} < {end} ({} statements)", body.len())
                }
                Instruction::Store { address, value, .. } => format!("[{address}] = {value}"),
                other => format!("{other:?}"),
            })
            .collect();

        assert_eq!(
            rendered,
            vec![
                "acc0 = -inf".to_string(),
                "loop ridx0 < 256 (2 statements)".to_string(),
                "[gidx0 + 0] = acc0".to_string(),
            ]
        );
    }

    #[test]
    fn output_must_match_the_reduced_domain() {
        let descriptor = OperationDescriptor::reduce(
            ReduceOp::Sum,
            vec![0],
            OperandDescriptor::contiguous([3, 4]),
            Source::buffer([3, 4]),
        );

        assert_eq!(
            Lowerer::default().lower(&descriptor).unwrap_err(),
            LoweringError::ShapeMismatch(ShapeError::Mismatch {
                left: shape![3, 4],
                right: shape![1, 4],
                axis: 0,
            })
        );
    }

    #[test]
    fn repeated_axis_is_invalid() {
        let descriptor = OperationDescriptor::reduce(
            ReduceOp::Sum,
            vec![1, 1],
            OperandDescriptor::contiguous([3, 1]),
            Source::buffer([3, 4]),
        );

        assert!(matches!(
            Lowerer::default().lower(&descriptor),
            Err(LoweringError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn first_listed_axis_is_the_outermost_loop() {
        let descriptor = OperationDescriptor::reduce(
            ReduceOp::Sum,
            vec![2, 0],
            OperandDescriptor::contiguous([1, 3, 1]),
            Source::buffer([2, 3, 4]),
        );

        let kernel = Lowerer::default().lower(&descriptor).unwrap();
        let mut extents = Vec::new();
        let mut body = kernel.body.as_slice();
        while let Some(Instruction::RangeLoop { var, end, body: inner }) = body
            .iter()
            .find(|instruction| matches!(instruction, Instruction::RangeLoop { .. }))
        {
            extents.push((*var, *end));
            body = inner.as_slice();
        }

        assert_eq!(extents, vec![(0, 4), (1, 2)]);
        assert_eq!(kernel.name, "r_3_4_2");
    }
}
