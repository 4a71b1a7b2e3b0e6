use std::fmt::Display;

use tessel_core::ir::{Address, BinaryOp, Condition, Id, IndexExpr};

use super::{Constant, Dialect, Guard, IndexValue, Pointer, Variable};

/// An element expression, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<D: Dialect> {
    Variable(Variable<D>),
    Binary {
        op: BinaryOp,
        operands: Vec<Expr<D>>,
    },
}

impl<D: Dialect> Expr<D> {
    fn fmt_operand(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Variable(var) => var.fmt_operand(f),
            Expr::Binary { .. } => write!(f, "{self}"),
        }
    }

    // `max(max(a,b),c)` for the function form.
    fn fmt_call(
        f: &mut std::fmt::Formatter<'_>,
        op: BinaryOp,
        operands: &[Expr<D>],
    ) -> std::fmt::Result {
        match operands.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                D::compile_binary_function(f, op)?;
                f.write_str("(")?;
                Self::fmt_call(f, op, rest)?;
                f.write_str(",")?;
                last.fmt_operand(f)?;
                f.write_str(")")
            }
            Some((last, _)) => last.fmt_operand(f),
            None => Ok(()),
        }
    }
}

impl<D: Dialect> Display for Expr<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Variable(var) => write!(f, "{var}"),
            Expr::Binary { op, operands } if op.is_infix() => {
                // Infix operators associate left to right in C, so a left fold needs no
                // inner parentheses.
                f.write_str("(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{op}")?;
                    }
                    operand.fmt_operand(f)?;
                }
                f.write_str(")")
            }
            Expr::Binary { op, operands } => Self::fmt_call(f, *op, operands),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<D: Dialect> {
    DeclareIndex {
        out: Id,
        value: IndexExpr,
    },
    Load {
        out: Variable<D>,
        buffer: Id,
        address: Address,
        guard: Option<Condition>,
        neutral: Constant<D>,
    },
    Compute {
        out: Variable<D>,
        value: Expr<D>,
    },
    DeclareAccumulator {
        out: Variable<D>,
        init: Constant<D>,
    },
    Accumulate {
        acc: Variable<D>,
        value: Variable<D>,
    },
    RangeLoop {
        var: u8,
        end: u64,
        body: Vec<Instruction<D>>,
    },
    Store {
        buffer: Id,
        address: Address,
        value: Expr<D>,
    },
}

impl<D: Dialect> Instruction<D> {
    /// Writes the instruction, one statement per line, indented `depth` levels.
    pub fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);

        match self {
            Instruction::DeclareIndex { out, value } => {
                writeln!(f, "{indent}int alu{out} = {};", IndexValue::new(value))
            }
            Instruction::Load {
                out,
                buffer,
                address,
                guard: None,
                ..
            } => {
                let pointer = Pointer::new(*buffer, address);
                writeln!(f, "{indent}{} {out} = {pointer};", out.elem())
            }
            Instruction::Load {
                out,
                buffer,
                address,
                guard: Some(guard),
                neutral,
            } => {
                let pointer = Pointer::new(*buffer, address);
                let guard = Guard::new(guard);
                writeln!(
                    f,
                    "{indent}{} {out} = ({guard})?({pointer}):{neutral};",
                    out.elem()
                )
            }
            Instruction::Compute { out, value } => {
                writeln!(f, "{indent}{} {out} = {value};", out.elem())
            }
            Instruction::DeclareAccumulator { out, init } => {
                writeln!(f, "{indent}{} {out} = {init};", out.elem())
            }
            Instruction::Accumulate { acc, value } => {
                writeln!(f, "{indent}{acc} = {value};")
            }
            Instruction::RangeLoop { var, end, body } => {
                writeln!(
                    f,
                    "{indent}for (int ridx{var} = 0; ridx{var} < {end}; ridx{var}++) {{"
                )?;
                for instruction in body.iter() {
                    instruction.fmt_indented(f, depth + 1)?;
                }
                writeln!(f, "{indent}}}")
            }
            Instruction::Store {
                buffer,
                address,
                value,
            } => {
                writeln!(f, "{indent}{} = {value};", Pointer::new(*buffer, address))
            }
        }
    }
}

impl<D: Dialect> Display for Instruction<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}
