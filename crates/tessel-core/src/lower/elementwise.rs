use tessel_ir::{ConstantValue, ElemExpr, Value};
use tessel_zspace::{Shape, StrideDescriptor, broadcast_shapes};

use super::{
    LoweringContext, LoweringRule, OUTPUT_BUFFER, OperandAccess, RulePlan, aligned_strides,
};
use crate::{ElementwiseOp, KernelBuilder, LoweringError, OperationDescriptor, Source};

/// Pointwise function of every source, each read through its own (possibly broadcast)
/// strides.
#[derive(new, Debug, Clone, Copy)]
pub struct ElementwiseRule {
    op: ElementwiseOp,
}

impl LoweringRule for ElementwiseRule {
    fn lower(&self, context: &LoweringContext, builder: &mut KernelBuilder<'_>) {
        for operand in context.operands.iter() {
            if let OperandAccess::Buffer { address, .. } = operand {
                builder.register_access(address);
            }
        }
        builder.register_access(&context.output);

        let values: Vec<ElemExpr> = context
            .operands
            .iter()
            .map(|operand| match operand {
                OperandAccess::Buffer { id, address } => {
                    let address = builder.address(address);
                    builder
                        .load(*id, address, None, ConstantValue::zero(context.elem))
                        .into()
                }
                OperandAccess::Constant(value) => Value::Constant(*value).into(),
            })
            .collect();

        let value = match self.op.binary() {
            Some(op) => ElemExpr::fold(op, values),
            None => values
                .into_iter()
                .next()
                .unwrap_or(Value::Constant(ConstantValue::zero(context.elem)).into()),
        };

        let address = builder.address(&context.output);
        builder.store(OUTPUT_BUFFER, address, value);
    }
}

pub(super) fn plan(
    op: ElementwiseOp,
    descriptor: &OperationDescriptor,
) -> Result<RulePlan, LoweringError> {
    let inputs = &descriptor.inputs;
    match (op.binary(), inputs.len()) {
        (None, 1) => {}
        (Some(_), count) if count >= 2 => {}
        (_, count) => {
            return Err(LoweringError::invalid(format!(
                "{op:?} can't be applied to {count} operand(s)"
            )));
        }
    }

    let domain = descriptor.output.shape.clone();

    // Sources must agree among themselves before being checked against the output.
    inputs
        .iter()
        .try_fold(Shape::default(), |joint, source| {
            broadcast_shapes(&joint, source.shape())
        })?;

    let mut sources = Vec::with_capacity(inputs.len());
    for source in inputs.iter() {
        let strides = aligned_strides(source, &domain)?;
        sources.push(match source {
            Source::Buffer(_) => Some(strides),
            Source::Constant { .. } => None,
        });
    }

    let output = StrideDescriptor::new(descriptor.output.layout.strides(&domain)?);

    Ok(RulePlan {
        domain,
        reduce_axes: Vec::new(),
        output,
        sources,
        rule: Box::new(ElementwiseRule::new(op)),
    })
}
