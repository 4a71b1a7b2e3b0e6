use tessel_core::ir::{
    Address, Condition, Elem, ElemExpr, GridDim, Id, Instruction, KernelDefinition, Value,
};

use crate::{ExecutionError, variables::Variables};

/// Counters of the memory and accumulator traffic of one launch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Logical threads executed, one per grid point.
    pub threads: u64,
    /// Buffer reads. Loads whose guard doesn't hold read nothing and aren't counted.
    pub loads: u64,
    pub stores: u64,
    /// Accumulator updates.
    pub accumulates: u64,
}

/// Runs kernels on the host, one logical thread per launch grid point.
///
/// Buffer `dataN` is `buffers[N]`. Every value is held as `f64` and rounded to the element
/// type of the kernel after each operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn launch(
        &self,
        kernel: &KernelDefinition,
        buffers: &mut [Vec<f64>],
    ) -> Result<ExecutionStats, ExecutionError> {
        if let Some(binding) = kernel
            .buffers
            .iter()
            .find(|binding| binding.id as usize >= buffers.len())
        {
            return Err(ExecutionError::MissingBuffer { id: binding.id });
        }

        let grid = kernel.launch.grid;
        log::debug!(
            "Launching {} on a ({}, {}, {}) grid",
            kernel.name,
            grid.x,
            grid.y,
            grid.z
        );

        let mut thread = Thread {
            elem: kernel.elem,
            buffers,
            stats: ExecutionStats::default(),
        };

        for z in 0..grid.z {
            for y in 0..grid.y {
                for x in 0..grid.x {
                    let coordinates = kernel
                        .coordinates
                        .iter()
                        .map(|axis| match axis.dim {
                            GridDim::X => x as i64,
                            GridDim::Y => y as i64,
                            GridDim::Z => z as i64,
                        })
                        .collect();

                    let mut variables = Variables::new(coordinates);
                    thread.execute(&kernel.body, &mut variables)?;
                    thread.stats.threads += 1;
                }
            }
        }

        Ok(thread.stats)
    }
}

struct Thread<'a> {
    elem: Elem,
    buffers: &'a mut [Vec<f64>],
    stats: ExecutionStats,
}

impl Thread<'_> {
    fn execute(
        &mut self,
        body: &[Instruction],
        variables: &mut Variables,
    ) -> Result<(), ExecutionError> {
        for instruction in body {
            match instruction {
                Instruction::DeclareIndex { out, value } => {
                    let value = variables.eval_index(value)?;
                    variables.declare_index(*out, value);
                }
                Instruction::Load {
                    out,
                    buffer,
                    address,
                    guard,
                    neutral,
                } => {
                    let active = match guard {
                        Some(guard) => self.check(guard, variables)?,
                        None => true,
                    };
                    let value = match active {
                        true => self.read(*buffer, address, variables)?,
                        false => neutral.as_f64(),
                    };
                    variables.declare_value(Value::Loaded(*out), value);
                }
                Instruction::Compute { out, value } => {
                    let value = self.eval(value, variables)?;
                    variables.declare_value(Value::Local(*out), value);
                }
                Instruction::DeclareAccumulator { out, init } => {
                    let init = self.round(init.as_f64());
                    variables.declare_value(Value::Accumulator(*out), init);
                }
                Instruction::Accumulate { acc, value } => {
                    let value = variables.value(*value)?;
                    variables.declare_value(Value::Accumulator(*acc), value);
                    self.stats.accumulates += 1;
                }
                Instruction::RangeLoop { var, end, body } => {
                    let position = *var as usize;
                    if variables.loops.len() <= position {
                        variables.loops.resize(position + 1, 0);
                    }

                    for counter in 0..*end {
                        variables.loops[position] = counter as i64;
                        self.execute(body, variables)?;
                    }
                    variables.loops.truncate(position);
                }
                Instruction::Store {
                    buffer,
                    address,
                    value,
                } => {
                    let value = self.eval(value, variables)?;
                    let index = self.offset(*buffer, address, variables)?;
                    self.buffers[*buffer as usize][index] = value;
                    self.stats.stores += 1;
                }
            }
        }

        Ok(())
    }

    fn check(&self, condition: &Condition, variables: &Variables) -> Result<bool, ExecutionError> {
        match condition {
            Condition::Lt(lhs, rhs) => Ok(variables.eval_index(lhs)? < *rhs),
            Condition::All(conditions) => {
                for condition in conditions {
                    if !self.check(condition, variables)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn eval(&self, expr: &ElemExpr, variables: &Variables) -> Result<f64, ExecutionError> {
        match expr {
            ElemExpr::Value(value) => variables.value(*value),
            ElemExpr::Fold { op, operands } => {
                let mut values = operands.iter().map(|operand| self.eval(operand, variables));
                let first = match values.next() {
                    Some(first) => first?,
                    None => return Ok(0.0),
                };
                values.try_fold(first, |acc, value| Ok(self.round(op.apply(acc, value?))))
            }
        }
    }

    fn offset(
        &self,
        buffer: Id,
        address: &Address,
        variables: &Variables,
    ) -> Result<usize, ExecutionError> {
        let index = address
            .terms
            .iter()
            .try_fold(address.offset, |offset, term| {
                Ok::<_, ExecutionError>(offset + variables.eval_index(term)?)
            })?;
        let len = match self.buffers.get(buffer as usize) {
            Some(data) => data.len(),
            None => return Err(ExecutionError::MissingBuffer { id: buffer }),
        };

        match index >= 0 && (index as usize) < len {
            true => Ok(index as usize),
            false => Err(ExecutionError::OutOfBounds { buffer, index, len }),
        }
    }

    fn read(
        &mut self,
        buffer: Id,
        address: &Address,
        variables: &Variables,
    ) -> Result<f64, ExecutionError> {
        let index = self.offset(buffer, address, variables)?;
        self.stats.loads += 1;
        Ok(self.round(self.buffers[buffer as usize][index]))
    }

    fn round(&self, value: f64) -> f64 {
        match self.elem {
            Elem::F32 => value as f32 as f64,
            Elem::F64 => value,
            Elem::I32 => value.trunc(),
        }
    }
}
