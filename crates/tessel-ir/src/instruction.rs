use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Address, Condition, ConstantValue, Id, IndexExpr};

/// An element-typed value available in a kernel body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Result of a [Instruction::Load].
    Loaded(Id),
    /// Result of a [Instruction::Compute].
    Local(Id),
    /// A reduction accumulator.
    Accumulator(Id),
    Constant(ConstantValue),
}

/// Pointwise binary operators on element values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
}

impl BinaryOp {
    /// Whether the operator is written infix in C-like languages.
    pub fn is_infix(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Max => lhs.max(rhs),
            BinaryOp::Min => lhs.min(rhs),
        }
    }
}

/// An expression over element values.
///
/// [ElemExpr::Fold] applies its operator left to right: `((a op b) op c)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElemExpr {
    Value(Value),
    Fold { op: BinaryOp, operands: Vec<ElemExpr> },
}

impl ElemExpr {
    /// Left fold of `op` over `values`; a single value is returned as is.
    pub fn fold(op: BinaryOp, mut values: Vec<ElemExpr>) -> Self {
        match values.len() {
            1 => values.remove(0),
            _ => ElemExpr::Fold {
                op,
                operands: values,
            },
        }
    }
}

impl From<Value> for ElemExpr {
    fn from(value: Value) -> Self {
        ElemExpr::Value(value)
    }
}

/// One statement of a kernel body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Declare the integer local `out`.
    DeclareIndex { out: Id, value: IndexExpr },
    /// Read `buffer` at `address`, or produce `neutral` when `guard` does not hold.
    Load {
        out: Id,
        buffer: Id,
        address: Address,
        guard: Option<Condition>,
        neutral: ConstantValue,
    },
    /// Declare the element local `out`.
    Compute { out: Id, value: ElemExpr },
    /// Declare accumulator `out`, seeded with `init`.
    DeclareAccumulator { out: Id, init: ConstantValue },
    /// Replace the state of accumulator `acc` with `value`.
    Accumulate { acc: Id, value: Value },
    /// Run `body` for every loop counter value in `0..end`.
    RangeLoop {
        var: u8,
        end: u64,
        body: Vec<Instruction>,
    },
    /// Write `value` to `buffer` at `address`.
    Store {
        buffer: Id,
        address: Address,
        value: ElemExpr,
    },
}

impl Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Loaded(id) => write!(f, "val{id}"),
            Value::Local(id) => write!(f, "alu{id}"),
            Value::Accumulator(id) => write!(f, "acc{id}"),
            Value::Constant(val) => write!(f, "{val}"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BinaryOp::Add => f.write_str("+"),
            BinaryOp::Sub => f.write_str("-"),
            BinaryOp::Mul => f.write_str("*"),
            BinaryOp::Div => f.write_str("/"),
            BinaryOp::Max => f.write_str("max"),
            BinaryOp::Min => f.write_str("min"),
        }
    }
}

impl Display for ElemExpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ElemExpr::Value(value) => write!(f, "{value}"),
            ElemExpr::Fold { op, operands } => {
                write!(f, "{op}(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                f.write_str(")")
            }
        }
    }
}
