use hashbrown::HashMap;
use tessel_core::ir::{Id, IndexExpr, IndexVar, Value};

use crate::ExecutionError;

/// State of one logical thread: its coordinates, loop counters and declared locals.
#[derive(Debug, Default)]
pub(crate) struct Variables {
    pub grid: Vec<i64>,
    pub loops: Vec<i64>,
    indices: HashMap<Id, i64>,
    loaded: HashMap<Id, f64>,
    locals: HashMap<Id, f64>,
    accumulators: HashMap<Id, f64>,
}

impl Variables {
    pub fn new(grid: Vec<i64>) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    pub fn declare_index(&mut self, id: Id, value: i64) {
        self.indices.insert(id, value);
    }

    pub fn declare_value(&mut self, value: Value, val: f64) {
        match value {
            Value::Loaded(id) => self.loaded.insert(id, val),
            Value::Local(id) => self.locals.insert(id, val),
            Value::Accumulator(id) => self.accumulators.insert(id, val),
            Value::Constant(_) => None,
        };
    }

    pub fn index(&self, var: IndexVar) -> Result<i64, ExecutionError> {
        let value = match var {
            IndexVar::Grid(position) => self.grid.get(position as usize),
            IndexVar::Loop(position) => self.loops.get(position as usize),
            IndexVar::Local(id) => self.indices.get(&id),
        };

        value.copied().ok_or_else(|| ExecutionError::UnboundVariable {
            name: var.to_string(),
        })
    }

    pub fn value(&self, value: Value) -> Result<f64, ExecutionError> {
        let val = match value {
            Value::Loaded(id) => self.loaded.get(&id),
            Value::Local(id) => self.locals.get(&id),
            Value::Accumulator(id) => self.accumulators.get(&id),
            Value::Constant(constant) => return Ok(constant.as_f64()),
        };

        val.copied().ok_or_else(|| ExecutionError::UnboundVariable {
            name: value.to_string(),
        })
    }

    /// Evaluates `expr` with C semantics: division and remainder truncate toward zero.
    pub fn eval_index(&self, expr: &IndexExpr) -> Result<i64, ExecutionError> {
        match expr {
            IndexExpr::Var(var) => self.index(*var),
            IndexExpr::Const(val) => Ok(*val),
            IndexExpr::Mul(lhs, rhs) => Ok(self.eval_index(lhs)? * rhs),
            IndexExpr::Div(lhs, rhs) => self
                .eval_index(lhs)?
                .checked_div(*rhs)
                .ok_or_else(|| ExecutionError::DivisionByZero {
                    expr: expr.to_string(),
                }),
            IndexExpr::Rem(lhs, rhs) => self
                .eval_index(lhs)?
                .checked_rem(*rhs)
                .ok_or_else(|| ExecutionError::DivisionByZero {
                    expr: expr.to_string(),
                }),
            IndexExpr::Sum(terms) => terms.iter().map(|term| self.eval_index(term)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_truncates_toward_zero() {
        let mut variables = Variables::new(vec![-7]);
        variables.declare_index(0, 70);

        let div = IndexExpr::grid(0).divided(2);
        let rem = IndexExpr::grid(0).remainder(4);
        let sum = IndexExpr::Sum(vec![IndexExpr::local(0).scaled(-1), IndexExpr::Const(5)]);

        assert_eq!(variables.eval_index(&div), Ok(-3));
        assert_eq!(variables.eval_index(&rem), Ok(-3));
        assert_eq!(variables.eval_index(&sum), Ok(-65));
    }

    #[test]
    fn undeclared_locals_are_reported() {
        let variables = Variables::new(vec![]);

        assert_eq!(
            variables.eval_index(&IndexExpr::loop_var(0)),
            Err(ExecutionError::UnboundVariable {
                name: "ridx0".to_string()
            })
        );
        assert_eq!(
            variables.value(Value::Accumulator(2)),
            Err(ExecutionError::UnboundVariable {
                name: "acc2".to_string()
            })
        );
    }
}
