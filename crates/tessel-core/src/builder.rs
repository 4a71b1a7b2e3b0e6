use hashbrown::HashMap;
use tessel_ir::{
    Address, Condition, ConstantValue, ElemExpr, Id, IndexExpr, IndexVar, Instruction, Value,
};

use crate::{AffineAddress, AxisIndex, IndexMap};

/// Index expressions that are materialized only when several accesses need them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SharedKey {
    /// Variable part of an address: `(axis, coefficient)` pairs.
    Terms(Vec<(usize, i64)>),
    /// `-index(axis)`, used by lower-bound guards.
    Negated(usize),
}

/// Builds a kernel body, declaring every integer local once in the outermost scope where
/// all its variables are defined.
///
/// Rules first register the accesses they are going to emit, so expressions shared by
/// several of them can be materialized on first use.
#[derive(Debug)]
pub struct KernelBuilder<'a> {
    indices: &'a IndexMap,
    scopes: Vec<Vec<Instruction>>,
    loops: Vec<(u8, u64)>,
    locals: HashMap<IndexExpr, Id>,
    local_depth: HashMap<Id, usize>,
    uses: HashMap<SharedKey, usize>,
    next_alu: Id,
    next_val: Id,
    next_acc: Id,
}

impl<'a> KernelBuilder<'a> {
    pub fn new(indices: &'a IndexMap) -> Self {
        Self {
            indices,
            scopes: vec![Vec::new()],
            loops: Vec::new(),
            locals: HashMap::new(),
            local_depth: HashMap::new(),
            uses: HashMap::new(),
            next_alu: 0,
            next_val: 0,
            next_acc: 0,
        }
    }

    /// Announce a memory access through `address`.
    pub fn register_access(&mut self, address: &AffineAddress) {
        let terms = self.effective_terms(address);
        if terms.len() >= 2 {
            *self.uses.entry(SharedKey::Terms(terms)).or_default() += 1;
        }
    }

    /// Announce a guard testing `index(axis) >= start`.
    pub fn register_lower_bound(&mut self, axis: usize, start: usize) {
        if start > 0 && self.indices.axis(axis).expr().is_some() {
            *self.uses.entry(SharedKey::Negated(axis)).or_default() += 1;
        }
    }

    /// Index of `axis`, materializing it when it is decomposed from a folded coordinate.
    pub fn index(&mut self, axis: usize) -> Option<IndexExpr> {
        let index = *self.indices.axis(axis);
        let expr = index.expr()?;

        Some(match index {
            AxisIndex::Component { .. } => self.materialize(expr),
            _ => expr,
        })
    }

    /// Lower `address` into a buffer offset.
    pub fn address(&mut self, address: &AffineAddress) -> Address {
        let terms = self.effective_terms(address);
        let mut exprs: Vec<IndexExpr> = terms
            .iter()
            .filter_map(|(axis, coefficient)| {
                self.index(*axis).map(|expr| expr.scaled(*coefficient))
            })
            .collect();

        if exprs.len() >= 2 && self.is_shared(&SharedKey::Terms(terms)) {
            exprs = vec![self.materialize(IndexExpr::Sum(exprs))];
        }

        Address::new(exprs, address.offset)
    }

    /// Guards restricting `index(axis)` to `start..end` within an axis of `extent` elements.
    ///
    /// Bounds already implied by the axis extent produce no condition. The lower bound uses
    /// the canonical form `-index < -(start - 1)`.
    pub fn interval_guard(
        &mut self,
        axis: usize,
        start: usize,
        end: usize,
        extent: usize,
    ) -> Vec<Condition> {
        let mut conditions = Vec::new();
        let Some(index) = self.index(axis) else {
            return conditions;
        };

        if start > 0 {
            let negated = index.clone().scaled(-1);
            let negated = match self.is_shared(&SharedKey::Negated(axis)) {
                true => self.materialize(negated),
                false => negated,
            };
            conditions.push(Condition::Lt(negated, -(start as i64 - 1)));
        }
        if end < extent {
            conditions.push(Condition::Lt(index, end as i64));
        }

        conditions
    }

    pub fn load(
        &mut self,
        buffer: Id,
        address: Address,
        guard: Option<Condition>,
        neutral: ConstantValue,
    ) -> Value {
        let out = self.next_val;
        self.next_val += 1;
        self.push(Instruction::Load {
            out,
            buffer,
            address,
            guard,
            neutral,
        });
        Value::Loaded(out)
    }

    pub fn compute(&mut self, value: ElemExpr) -> Value {
        let out = self.alu();
        self.push(Instruction::Compute { out, value });
        Value::Local(out)
    }

    pub fn declare_accumulator(&mut self, init: ConstantValue) -> Id {
        let out = self.next_acc;
        self.next_acc += 1;
        self.push(Instruction::DeclareAccumulator { out, init });
        out
    }

    pub fn accumulate(&mut self, acc: Id, value: Value) {
        self.push(Instruction::Accumulate { acc, value });
    }

    pub fn store(&mut self, buffer: Id, address: Address, value: ElemExpr) {
        self.push(Instruction::Store {
            buffer,
            address,
            value,
        });
    }

    /// Open the body of loop `position`, iterating `0..end`.
    pub fn open_loop(&mut self, position: u8, end: u64) {
        self.loops.push((position, end));
        self.scopes.push(Vec::new());
    }

    /// Close the innermost open loop.
    pub fn close_loop(&mut self) {
        let (Some((var, end)), Some(body)) = (self.loops.pop(), self.scopes.pop()) else {
            return;
        };
        let depth = self.loops.len();

        // Locals of the closed scope are out of reach from now on.
        let local_depth = &self.local_depth;
        self.locals
            .retain(|_, id| local_depth.get(id).is_some_and(|d| *d <= depth));

        self.push(Instruction::RangeLoop { var, end, body });
    }

    /// The finished body, closing any loop left open.
    pub fn finish(mut self) -> Vec<Instruction> {
        while !self.loops.is_empty() {
            self.close_loop();
        }
        self.scopes.pop().unwrap_or_default()
    }

    fn push(&mut self, instruction: Instruction) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(instruction);
        }
    }

    fn alu(&mut self) -> Id {
        let id = self.next_alu;
        self.next_alu += 1;
        id
    }

    fn is_shared(&self, key: &SharedKey) -> bool {
        self.uses.get(key).is_some_and(|count| *count >= 2)
    }

    fn effective_terms(&self, address: &AffineAddress) -> Vec<(usize, i64)> {
        address
            .terms
            .iter()
            .copied()
            .filter(|(axis, coefficient)| {
                *coefficient != 0 && self.indices.axis(*axis).expr().is_some()
            })
            .collect()
    }

    /// Declare `expr` as an integer local unless it already is one, returning the local.
    fn materialize(&mut self, expr: IndexExpr) -> IndexExpr {
        if expr.is_var() {
            return expr;
        }
        if let Some(id) = self.locals.get(&expr) {
            return IndexExpr::local(*id);
        }

        let depth = self.depth_of(&expr);
        let out = self.alu();
        log::trace!("Materializing alu{out} = {expr} at depth {depth}");

        self.scopes[depth].push(Instruction::DeclareIndex {
            out,
            value: expr.clone(),
        });
        self.locals.insert(expr, out);
        self.local_depth.insert(out, depth);

        IndexExpr::local(out)
    }

    /// Outermost open scope in which every variable of `expr` is defined.
    fn depth_of(&self, expr: &IndexExpr) -> usize {
        let innermost = self.scopes.len() - 1;
        let mut depth = 0;

        expr.visit_vars(&mut |var| {
            let var_depth = match var {
                IndexVar::Grid(_) => 0,
                IndexVar::Loop(position) => self
                    .loops
                    .iter()
                    .position(|(open, _)| *open == position)
                    .map(|index| index + 1)
                    .unwrap_or(innermost),
                IndexVar::Local(id) => self.local_depth.get(&id).copied().unwrap_or(innermost),
            };
            depth = depth.max(var_depth);
        });

        depth
    }
}
