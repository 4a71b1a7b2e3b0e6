use std::fmt::Display;

use tessel_core::ir::{Address, Condition, Id, IndexExpr};

/// C rendering of an integer expression. Every operation is parenthesized and negative
/// literals are wrapped, so the text never depends on operator precedence.
#[derive(new, Debug, Clone, Copy)]
pub struct IndexValue<'a> {
    expr: &'a IndexExpr,
}

/// An integer literal, parenthesized when negative.
#[derive(new, Debug, Clone, Copy)]
pub struct IndexConst {
    value: i64,
}

impl Display for IndexConst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value < 0 {
            true => write!(f, "({})", self.value),
            false => write!(f, "{}", self.value),
        }
    }
}

impl Display for IndexValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.expr {
            IndexExpr::Var(var) => write!(f, "{var}"),
            IndexExpr::Const(val) => write!(f, "{}", IndexConst::new(*val)),
            IndexExpr::Mul(lhs, rhs) => {
                write!(f, "({}*{})", IndexValue::new(lhs), IndexConst::new(*rhs))
            }
            IndexExpr::Div(lhs, rhs) => {
                write!(f, "({}/{})", IndexValue::new(lhs), IndexConst::new(*rhs))
            }
            IndexExpr::Rem(lhs, rhs) => {
                write!(f, "({}%{})", IndexValue::new(lhs), IndexConst::new(*rhs))
            }
            IndexExpr::Sum(terms) => {
                f.write_str("(")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str("+")?;
                    }
                    write!(f, "{}", IndexValue::new(term))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// C rendering of a guard, a conjunction being the product of its parts.
#[derive(new, Debug, Clone, Copy)]
pub struct Guard<'a> {
    condition: &'a Condition,
}

impl Display for Guard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.condition {
            Condition::Lt(lhs, rhs) => {
                write!(f, "({}<{})", IndexValue::new(lhs), IndexConst::new(*rhs))
            }
            Condition::All(conditions) => {
                f.write_str("(")?;
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write!(f, "{}", Guard::new(condition))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Dereference of a buffer element: `*(dataN+term+...+offset)`.
#[derive(new, Debug, Clone, Copy)]
pub struct Pointer<'a> {
    buffer: Id,
    address: &'a Address,
}

impl Display for Pointer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "*(data{}", self.buffer)?;
        for term in self.address.terms.iter() {
            write!(f, "+{}", IndexValue::new(term))?;
        }
        if self.address.offset != 0 || self.address.terms.is_empty() {
            write!(f, "+{}", IndexConst::new(self.address.offset))?;
        }
        f.write_str(")")
    }
}
