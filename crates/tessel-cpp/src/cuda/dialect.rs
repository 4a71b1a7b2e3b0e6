use crate::shared::{
    Binding, Dialect, DialectBindings, DialectGridBuiltins, DialectIncludes, DialectTypes,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CudaDialect;

impl Dialect for CudaDialect {
    const LANG_TAG: &'static str = "cpp";
    const EXTENSION: &'static str = "cu";
}

// Includes

impl DialectIncludes<Self> for CudaDialect {
    fn compile_includes(f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("#define INFINITY (__int_as_float(0x7f800000))\n")?;
        f.write_str("#define NAN (__int_as_float(0x7fffffff))\n")
    }
}

impl DialectTypes<Self> for CudaDialect {}

// Kernel argument bindings

impl DialectBindings<Self> for CudaDialect {
    fn compile_kernel_signature(
        f: &mut std::fmt::Formatter<'_>,
        kernel_name: &str,
        buffers: &[Binding<Self>],
        threads: u32,
    ) -> std::fmt::Result {
        write!(
            f,
            "extern \"C\" __global__ void __launch_bounds__({threads}) {kernel_name}("
        )?;
        Self::compile_parameters(f, buffers)?;
        f.write_str(")")
    }
}

impl DialectGridBuiltins<Self> for CudaDialect {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tessel_core::{
        Compiler,
        ir::{
            Address, Binding, Condition, ConstantValue, Elem, GridAxis, GridDim, IndexExpr,
            Instruction, KernelDefinition, LaunchConfig, Value, Visibility,
        },
    };

    use crate::CudaCompiler;

    #[test]
    fn guarded_load_in_cuda() {
        let coordinates = vec![GridAxis::new(GridDim::Y, 2), GridAxis::new(GridDim::X, 9)];
        let kernel = KernelDefinition {
            name: "E_2_9".to_string(),
            elem: Elem::F32,
            buffers: vec![
                Binding::new(0, Elem::F32, Visibility::ReadWrite, 18),
                Binding::new(1, Elem::F32, Visibility::Read, 10),
            ],
            launch: LaunchConfig::single_thread(&coordinates),
            coordinates,
            body: vec![
                Instruction::Load {
                    out: 0,
                    buffer: 1,
                    address: Address::new(
                        vec![IndexExpr::grid(0).scaled(5), IndexExpr::grid(1)],
                        -2,
                    ),
                    guard: Condition::all(vec![
                        Condition::Lt(IndexExpr::grid(1).scaled(-1), -1),
                        Condition::Lt(IndexExpr::grid(1), 7),
                    ]),
                    neutral: ConstantValue::Float(0.0),
                },
                Instruction::Store {
                    buffer: 0,
                    address: Address::new(
                        vec![IndexExpr::grid(0).scaled(9), IndexExpr::grid(1)],
                        0,
                    ),
                    value: Value::Loaded(0).into(),
                },
            ],
        };

        let mut compiler = CudaCompiler::new();
        let source = compiler.compile(kernel).to_string();

        let expected = "#define INFINITY (__int_as_float(0x7f800000))
#define NAN (__int_as_float(0x7fffffff))
extern \"C\" __global__ void __launch_bounds__(1) E_2_9(float* data0, const float* data1) {
  int gidx0 = blockIdx.y; /* 2 */
  int gidx1 = blockIdx.x; /* 9 */
  float val0 = ((((gidx1*(-1))<(-1))*(gidx1<7)))?(*(data1+(gidx0*5)+gidx1+(-2))):0.0f;
  *(data0+(gidx0*9)+gidx1) = val0;
}";
        assert_eq!(source, expected);
        assert_eq!(compiler.extension(), "cu");
        assert_eq!(compiler.elem_size(Elem::F64), 8);
    }
}
