use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Id;

/// An integer variable available inside a kernel body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexVar {
    /// The `n`-th declared grid coordinate.
    Grid(u8),
    /// Counter of the `n`-th sequential loop, outermost first.
    Loop(u8),
    /// A materialized integer local.
    Local(Id),
}

/// Symbolic integer arithmetic over grid coordinates, loop counters and locals.
///
/// Division and remainder follow C semantics (truncation toward zero). Coefficients and
/// divisors are compile-time constants, so every expression is affine up to div/mod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexExpr {
    Var(IndexVar),
    Const(i64),
    Mul(Box<IndexExpr>, i64),
    Div(Box<IndexExpr>, i64),
    Rem(Box<IndexExpr>, i64),
    Sum(Vec<IndexExpr>),
}

impl IndexExpr {
    pub fn grid(position: u8) -> Self {
        IndexExpr::Var(IndexVar::Grid(position))
    }

    pub fn loop_var(position: u8) -> Self {
        IndexExpr::Var(IndexVar::Loop(position))
    }

    pub fn local(id: Id) -> Self {
        IndexExpr::Var(IndexVar::Local(id))
    }

    /// `self * coefficient`, without wrapping when the coefficient is 1.
    pub fn scaled(self, coefficient: i64) -> Self {
        match coefficient {
            1 => self,
            _ => IndexExpr::Mul(Box::new(self), coefficient),
        }
    }

    /// `self / divisor`, without wrapping when the divisor is 1.
    pub fn divided(self, divisor: i64) -> Self {
        match divisor {
            1 => self,
            _ => IndexExpr::Div(Box::new(self), divisor),
        }
    }

    pub fn remainder(self, modulus: i64) -> Self {
        IndexExpr::Rem(Box::new(self), modulus)
    }

    /// Whether the expression is a single variable, which never needs materializing.
    pub fn is_var(&self) -> bool {
        matches!(self, IndexExpr::Var(_))
    }

    /// Call `visitor` on every variable referenced by the expression.
    pub fn visit_vars(&self, visitor: &mut impl FnMut(IndexVar)) {
        match self {
            IndexExpr::Var(var) => visitor(*var),
            IndexExpr::Const(_) => {}
            IndexExpr::Mul(expr, _) | IndexExpr::Div(expr, _) | IndexExpr::Rem(expr, _) => {
                expr.visit_vars(visitor)
            }
            IndexExpr::Sum(terms) => terms.iter().for_each(|term| term.visit_vars(visitor)),
        }
    }
}

impl From<IndexVar> for IndexExpr {
    fn from(var: IndexVar) -> Self {
        IndexExpr::Var(var)
    }
}

/// A guard over integer expressions: either `lhs < rhs` or a conjunction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Lt(IndexExpr, i64),
    All(Vec<Condition>),
}

impl Condition {
    /// Conjunction of `conditions`, `None` when there is nothing to test.
    pub fn all(mut conditions: Vec<Condition>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Condition::All(conditions)),
        }
    }

    pub fn visit_vars(&self, visitor: &mut impl FnMut(IndexVar)) {
        match self {
            Condition::Lt(lhs, _) => lhs.visit_vars(visitor),
            Condition::All(conditions) => conditions
                .iter()
                .for_each(|condition| condition.visit_vars(visitor)),
        }
    }
}

/// A linear buffer offset: a sum of index terms plus a constant.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub terms: Vec<IndexExpr>,
    pub offset: i64,
}

impl Display for IndexVar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexVar::Grid(position) => write!(f, "gidx{position}"),
            IndexVar::Loop(position) => write!(f, "ridx{position}"),
            IndexVar::Local(id) => write!(f, "alu{id}"),
        }
    }
}

impl Display for IndexExpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexExpr::Var(var) => write!(f, "{var}"),
            IndexExpr::Const(val) => write!(f, "{val}"),
            IndexExpr::Mul(expr, coefficient) => write!(f, "({expr} * {coefficient})"),
            IndexExpr::Div(expr, divisor) => write!(f, "({expr} / {divisor})"),
            IndexExpr::Rem(expr, modulus) => write!(f, "({expr} % {modulus})"),
            IndexExpr::Sum(terms) => {
                f.write_str("(")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{term}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Condition::Lt(lhs, rhs) => write!(f, "{lhs} < {rhs}"),
            Condition::All(conditions) => {
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "({condition})")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for term in self.terms.iter() {
            write!(f, "{term} + ")?;
        }
        write!(f, "{}", self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scaling_and_division_by_one_are_identities() {
        assert_eq!(IndexExpr::grid(0).scaled(1), IndexExpr::grid(0));
        assert_eq!(IndexExpr::grid(0).divided(1), IndexExpr::grid(0));
        assert_eq!(
            IndexExpr::grid(2).divided(8).remainder(7).to_string(),
            "((gidx2 / 8) % 7)"
        );
    }

    #[test]
    fn visit_collects_every_variable() {
        let expr = IndexExpr::Sum(vec![
            IndexExpr::grid(0).scaled(65),
            IndexExpr::loop_var(1),
            IndexExpr::local(3).remainder(4),
        ]);
        let mut vars = Vec::new();
        expr.visit_vars(&mut |var| vars.push(var));

        assert_eq!(
            vars,
            vec![IndexVar::Grid(0), IndexVar::Loop(1), IndexVar::Local(3)]
        );
    }

    #[test]
    fn conjunction_of_one_condition_is_the_condition() {
        let lt = Condition::Lt(IndexExpr::grid(1), 65);
        assert_eq!(Condition::all(vec![]), None);
        assert_eq!(Condition::all(vec![lt.clone()]), Some(lt));
    }
}
