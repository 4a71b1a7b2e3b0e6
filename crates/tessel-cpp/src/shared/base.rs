use std::marker::PhantomData;

use tessel_core::{
    Compiler,
    ir::{self as gpu, ElemExpr},
};

use super::{Binding, Body, ComputeKernel, Constant, Dialect, Elem, Expr, Instruction, Variable};

/// Compiles kernel definitions to C++ in the dialect `D`.
#[derive(Clone, Debug, Default)]
pub struct CppCompiler<D: Dialect> {
    _dialect: PhantomData<D>,
}

impl<D: Dialect> Compiler for CppCompiler<D> {
    type Representation = ComputeKernel<D>;

    fn compile(&mut self, kernel: gpu::KernelDefinition) -> Self::Representation {
        self.compile_ir(kernel)
    }

    fn elem_size(&self, elem: gpu::Elem) -> usize {
        Elem::<D>::from(elem).size()
    }

    fn extension(&self) -> &'static str {
        D::EXTENSION
    }

    fn lang_tag(&self) -> &'static str {
        D::LANG_TAG
    }
}

impl<D: Dialect> CppCompiler<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile_ir(&self, value: gpu::KernelDefinition) -> ComputeKernel<D> {
        let elem = Elem::from(value.elem);

        let buffers = value
            .buffers
            .into_iter()
            .map(|binding| self.compile_binding(binding))
            .collect();
        let instructions = value
            .body
            .into_iter()
            .map(|instruction| self.compile_instruction(instruction, elem))
            .collect();

        log::trace!("Compiled kernel {} to C++", value.name);

        ComputeKernel {
            kernel_name: value.name,
            buffers,
            body: Body {
                coordinates: value.coordinates,
                instructions,
            },
            launch: value.launch,
        }
    }

    fn compile_binding(&self, binding: gpu::Binding) -> Binding<D> {
        Binding {
            id: binding.id,
            elem: binding.elem.into(),
            vis: binding.visibility,
            size: binding.size,
        }
    }

    fn compile_instruction(&self, value: gpu::Instruction, elem: Elem<D>) -> Instruction<D> {
        match value {
            gpu::Instruction::DeclareIndex { out, value } => Instruction::DeclareIndex { out, value },
            gpu::Instruction::Load {
                out,
                buffer,
                address,
                guard,
                neutral,
            } => Instruction::Load {
                out: Variable::Loaded(out, elem),
                buffer,
                address,
                guard,
                neutral: Constant::new(neutral, elem),
            },
            gpu::Instruction::Compute { out, value } => Instruction::Compute {
                out: Variable::Local(out, elem),
                value: self.compile_expr(value, elem),
            },
            gpu::Instruction::DeclareAccumulator { out, init } => {
                Instruction::DeclareAccumulator {
                    out: Variable::Accumulator(out, elem),
                    init: Constant::new(init, elem),
                }
            }
            gpu::Instruction::Accumulate { acc, value } => Instruction::Accumulate {
                acc: Variable::Accumulator(acc, elem),
                value: Variable::from_value(value, elem),
            },
            gpu::Instruction::RangeLoop { var, end, body } => Instruction::RangeLoop {
                var,
                end,
                body: body
                    .into_iter()
                    .map(|instruction| self.compile_instruction(instruction, elem))
                    .collect(),
            },
            gpu::Instruction::Store {
                buffer,
                address,
                value,
            } => Instruction::Store {
                buffer,
                address,
                value: self.compile_expr(value, elem),
            },
        }
    }

    fn compile_expr(&self, value: ElemExpr, elem: Elem<D>) -> Expr<D> {
        match value {
            ElemExpr::Value(value) => Expr::Variable(Variable::from_value(value, elem)),
            ElemExpr::Fold { op, operands } => Expr::Binary {
                op,
                operands: operands
                    .into_iter()
                    .map(|operand| self.compile_expr(operand, elem))
                    .collect(),
            },
        }
    }
}
