//! Lowering of operation descriptors into kernel definitions.
//!
//! Lowering validates the descriptor, binds the parallel axes to the grid, recovers every
//! axis index and lets the rule of the operation kind emit the body through a
//! [KernelBuilder]. Every error is detected before the first instruction is emitted.

mod concat;
mod elementwise;
mod pad;
mod reduce;

pub use concat::{ConcatRule, check_coverage};
pub use elementwise::ElementwiseRule;
pub use pad::PadRule;
pub use reduce::ReduceRule;

use tessel_ir::{Binding, ConstantValue, Elem, Id, KernelDefinition, LaunchConfig, Visibility};
use tessel_zspace::{MemoryLayout, Shape, ShapeError, StrideDescriptor, Strides};

use crate::{
    AffineAddress, AxisMapper, AxisPartition, GridLimits, IndexMap, KernelBuilder, LoweringError,
    OperandDescriptor, OperationDescriptor, OperationKind, Source, config::GlobalConfig,
    kernel_name,
};

/// Buffer parameter the output is written to.
pub const OUTPUT_BUFFER: Id = 0;

/// How one source of the operation is read.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandAccess {
    /// Load from buffer `id` at `address`.
    Buffer { id: Id, address: AffineAddress },
    Constant(ConstantValue),
}

/// What a rule emits from, besides the builder.
#[derive(Debug, Clone)]
pub struct LoweringContext {
    pub domain: Shape,
    pub elem: Elem,
    /// Address of the output element of the current thread.
    pub output: AffineAddress,
    /// One access per source, in source order.
    pub operands: Vec<OperandAccess>,
    /// Extents of the sequential loops, outermost first.
    pub loops: Vec<u64>,
}

/// Emits the body of one operation kind.
///
/// Implementations register every access with the builder before emitting any of them.
pub trait LoweringRule: core::fmt::Debug + Send + Sync {
    fn lower(&self, context: &LoweringContext, builder: &mut KernelBuilder<'_>);
}

/// A validated descriptor, ready to be mapped and emitted.
#[derive(Debug)]
pub(crate) struct RulePlan {
    pub domain: Shape,
    pub reduce_axes: Vec<usize>,
    /// Output strides over the domain, reduced axes marked as broadcast.
    pub output: StrideDescriptor,
    /// Strides of every buffer source over the domain, `None` for constants.
    pub sources: Vec<Option<StrideDescriptor>>,
    pub rule: Box<dyn LoweringRule>,
}

/// Lowers operation descriptors against fixed grid capacities.
#[derive(new, Debug, Clone, Copy, Default)]
pub struct Lowerer {
    mapper: AxisMapper,
}

impl Lowerer {
    pub fn with_limits(limits: GridLimits) -> Self {
        Self::new(AxisMapper::new(limits))
    }

    /// A lowerer using the grid capacities of the global configuration.
    pub fn from_config() -> Self {
        Self::with_limits(GlobalConfig::get().grid.limits)
    }

    pub fn lower(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<KernelDefinition, LoweringError> {
        let elem = descriptor.output.elem;
        let plan = plan(descriptor)?;

        let partition = AxisPartition::new(plan.domain.rank(), &plan.reduce_axes);
        let binding = self.mapper.bind(&plan.domain, &partition, &plan.output)?;
        let indices = IndexMap::new(&plan.domain, &partition, &binding);

        let mut buffers = vec![Binding::new(
            OUTPUT_BUFFER,
            elem,
            Visibility::ReadWrite,
            required_len(&descriptor.output)?,
        )];
        let mut operands = Vec::with_capacity(descriptor.inputs.len());

        for (source, strides) in descriptor.inputs.iter().zip(plan.sources.iter()) {
            match (source, strides) {
                (Source::Buffer(operand), Some(strides)) => {
                    let id = buffers.len() as Id;
                    buffers.push(Binding::new(
                        id,
                        elem,
                        Visibility::Read,
                        required_len(operand)?,
                    ));
                    operands.push(OperandAccess::Buffer {
                        id,
                        address: AffineAddress::from_strides(strides),
                    });
                }
                (Source::Constant { value, .. }, _) => {
                    operands.push(OperandAccess::Constant(*value))
                }
                (Source::Buffer(_), None) => {
                    return Err(LoweringError::invalid("buffer source without strides"));
                }
            }
        }

        let context = LoweringContext {
            elem,
            output: AffineAddress::from_strides(&plan.output),
            operands,
            loops: partition
                .sequential
                .iter()
                .map(|axis| plan.domain[*axis] as u64)
                .collect(),
            domain: plan.domain.clone(),
        };

        let mut builder = KernelBuilder::new(&indices);
        plan.rule.lower(&context, &mut builder);
        let body = builder.finish();

        let name = match &descriptor.name {
            Some(name) => name.clone(),
            None => kernel_name(&descriptor.kind, &plan.domain, &partition),
        };
        let coordinates = binding.coordinates();
        let launch = LaunchConfig::single_thread(&coordinates);

        log::debug!(
            "Lowered {name} over {} with {:?} ({} instructions)",
            plan.domain,
            launch.grid,
            body.len()
        );

        Ok(KernelDefinition {
            name,
            elem,
            buffers,
            coordinates,
            body,
            launch,
        })
    }
}

fn plan(descriptor: &OperationDescriptor) -> Result<RulePlan, LoweringError> {
    validate_shape(&descriptor.output.shape)?;
    for source in descriptor.inputs.iter() {
        validate_shape(source.shape())?;

        match source {
            Source::Buffer(operand) if operand.elem != descriptor.output.elem => {
                return Err(LoweringError::invalid(format!(
                    "source of type {} written to an output of type {}",
                    operand.elem, descriptor.output.elem
                )));
            }
            _ => {}
        }
    }

    match &descriptor.kind {
        OperationKind::Elementwise(op) => elementwise::plan(*op, descriptor),
        OperationKind::Reduce { op, axes } => reduce::plan(*op, axes, descriptor),
        OperationKind::Concat { axis, offsets } => concat::plan(*axis, offsets, descriptor),
        OperationKind::Pad { padding, value } => pad::plan(padding, *value, descriptor),
    }
}

fn validate_shape(shape: &Shape) -> Result<(), LoweringError> {
    shape
        .validate()
        .map_err(|err| LoweringError::invalid(err.to_string()))
}

/// Strides of an operand over its own shape.
pub(crate) fn own_strides(operand: &OperandDescriptor) -> Result<StrideDescriptor, LoweringError> {
    Ok(StrideDescriptor::new(operand.layout.strides(&operand.shape)?))
}

/// Strides of a source read over `domain`, lower-rank shapes aligned on the right.
pub(crate) fn aligned_strides(
    source: &Source,
    domain: &Shape,
) -> Result<StrideDescriptor, LoweringError> {
    let shape = source.shape();
    let rank = domain.rank();
    if shape.rank() > rank {
        return Err(ShapeError::RankMismatch {
            left: rank,
            right: shape.rank(),
        }
        .into());
    }

    let strides = match source {
        Source::Buffer(operand) => operand.layout.strides(shape)?,
        Source::Constant { .. } => MemoryLayout::RowMajor.strides(shape)?,
    };
    let strides: Strides = core::iter::repeat_n(0, rank - shape.rank())
        .chain(strides.iter().copied())
        .collect();

    Ok(StrideDescriptor::broadcast_to(
        &shape.expanded(rank),
        &MemoryLayout::Strided(strides),
        domain,
    )?)
}

/// Number of elements a buffer must hold to back `operand`.
fn required_len(operand: &OperandDescriptor) -> Result<usize, LoweringError> {
    let strides = operand.layout.strides(&operand.shape)?;
    operand
        .shape
        .iter()
        .zip(strides.iter())
        .try_fold(1usize, |len, (dim, stride)| {
            (dim - 1).checked_mul(*stride)?.checked_add(len)
        })
        .ok_or_else(|| {
            LoweringError::invalid(format!(
                "operand of shape {} spans more than the address space",
                operand.shape
            ))
        })
}
