//! Operation descriptors handed over by the front-end.
//!
//! A descriptor names the output, the sources in parameter order and what to compute. It
//! only carries logical fields; everything derived from them (strides, grid binding,
//! addresses) is computed during lowering.

use serde::{Deserialize, Serialize};
use tessel_ir::{BinaryOp, ConstantValue, Elem};
use tessel_zspace::{MemoryLayout, Shape};

/// Shape, layout and element type of one buffer.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandDescriptor {
    pub shape: Shape,
    #[serde(default)]
    pub layout: MemoryLayout,
    #[serde(default)]
    pub elem: Elem,
}

impl OperandDescriptor {
    /// A row-major `f32` buffer.
    pub fn contiguous(shape: impl Into<Shape>) -> Self {
        Self::new(shape.into(), MemoryLayout::RowMajor, Elem::F32)
    }

    pub fn with_layout(mut self, layout: MemoryLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_elem(mut self, elem: Elem) -> Self {
        self.elem = elem;
        self
    }
}

/// One input of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// Read from a buffer parameter.
    Buffer(OperandDescriptor),
    /// A constant folded into the kernel, logically expanded over `shape`.
    ///
    /// An empty shape is a scalar and broadcasts against anything.
    Constant { value: ConstantValue, shape: Shape },
}

impl Source {
    pub fn buffer(shape: impl Into<Shape>) -> Self {
        Source::Buffer(OperandDescriptor::contiguous(shape))
    }

    pub fn constant(value: ConstantValue, shape: impl Into<Shape>) -> Self {
        Source::Constant {
            value,
            shape: shape.into(),
        }
    }

    pub fn shape(&self) -> &Shape {
        match self {
            Source::Buffer(operand) => &operand.shape,
            Source::Constant { shape, .. } => shape,
        }
    }
}

/// Pointwise functions of elementwise operations.
///
/// Binary operators accept two or more operands and fold left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementwiseOp {
    /// Copy (and possibly expand) a single operand.
    Identity,
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
}

impl ElementwiseOp {
    /// The combining operator, `None` for [ElementwiseOp::Identity].
    pub fn binary(&self) -> Option<BinaryOp> {
        match self {
            ElementwiseOp::Identity => None,
            ElementwiseOp::Add => Some(BinaryOp::Add),
            ElementwiseOp::Sub => Some(BinaryOp::Sub),
            ElementwiseOp::Mul => Some(BinaryOp::Mul),
            ElementwiseOp::Div => Some(BinaryOp::Div),
            ElementwiseOp::Max => Some(BinaryOp::Max),
            ElementwiseOp::Min => Some(BinaryOp::Min),
        }
    }
}

/// Associative combining functions of reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceOp {
    Sum,
    Prod,
    Max,
    Min,
}

impl ReduceOp {
    pub fn combine(&self) -> BinaryOp {
        match self {
            ReduceOp::Sum => BinaryOp::Add,
            ReduceOp::Prod => BinaryOp::Mul,
            ReduceOp::Max => BinaryOp::Max,
            ReduceOp::Min => BinaryOp::Min,
        }
    }

    /// The value the accumulator is seeded with.
    pub fn identity(&self, elem: Elem) -> ConstantValue {
        match (self, elem.is_float()) {
            (ReduceOp::Sum, _) => ConstantValue::zero(elem),
            (ReduceOp::Prod, true) => ConstantValue::Float(1.0),
            (ReduceOp::Prod, false) => ConstantValue::Int(1),
            (ReduceOp::Max, true) => ConstantValue::Float(f64::NEG_INFINITY),
            (ReduceOp::Max, false) => ConstantValue::Int(i32::MIN as i64),
            (ReduceOp::Min, true) => ConstantValue::Float(f64::INFINITY),
            (ReduceOp::Min, false) => ConstantValue::Int(i32::MAX as i64),
        }
    }
}

/// What an operation computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Pointwise function of every source, broadcast to the output shape.
    Elementwise(ElementwiseOp),
    /// Reduce the single source over `axes` of its shape.
    Reduce { op: ReduceOp, axes: Vec<usize> },
    /// Place every source along `axis`, source `i` starting at `offsets[i]`.
    Concat { axis: usize, offsets: Vec<usize> },
    /// Surround the single source with `padding[axis] = (before, after)` elements of `value`.
    Pad {
        padding: Vec<(usize, usize)>,
        #[serde(default)]
        value: ConstantValue,
    },
}

impl OperationKind {
    pub fn is_reduce(&self) -> bool {
        matches!(self, OperationKind::Reduce { .. })
    }
}

/// A complete operation to lower into one kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Entry point name, derived from the operation when absent.
    #[serde(default)]
    pub name: Option<String>,
    pub output: OperandDescriptor,
    pub inputs: Vec<Source>,
    pub kind: OperationKind,
}

impl OperationDescriptor {
    pub fn elementwise(op: ElementwiseOp, output: OperandDescriptor, inputs: Vec<Source>) -> Self {
        Self {
            name: None,
            output,
            inputs,
            kind: OperationKind::Elementwise(op),
        }
    }

    pub fn reduce(
        op: ReduceOp,
        axes: Vec<usize>,
        output: OperandDescriptor,
        input: Source,
    ) -> Self {
        Self {
            name: None,
            output,
            inputs: vec![input],
            kind: OperationKind::Reduce { op, axes },
        }
    }

    pub fn concat(
        axis: usize,
        offsets: Vec<usize>,
        output: OperandDescriptor,
        inputs: Vec<Source>,
    ) -> Self {
        Self {
            name: None,
            output,
            inputs,
            kind: OperationKind::Concat { axis, offsets },
        }
    }

    pub fn pad(
        padding: Vec<(usize, usize)>,
        value: ConstantValue,
        output: OperandDescriptor,
        input: Source,
    ) -> Self {
        Self {
            name: None,
            output,
            inputs: vec![input],
            kind: OperationKind::Pad { padding, value },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
