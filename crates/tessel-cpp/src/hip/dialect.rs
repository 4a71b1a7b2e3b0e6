use crate::shared::{
    Binding, Dialect, DialectBindings, DialectGridBuiltins, DialectIncludes, DialectTypes,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HipDialect;

impl Dialect for HipDialect {
    const LANG_TAG: &'static str = "cpp";
    const EXTENSION: &'static str = "hip";
}

// Includes

impl DialectIncludes<Self> for HipDialect {
    fn compile_includes(f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("#include <hip/hip_common.h>\n")?;
        f.write_str("#define INFINITY (__builtin_inff())\n")?;
        f.write_str("#define NAN (__builtin_nanf(\"\"))\n")
    }
}

// Types

impl DialectTypes<Self> for HipDialect {
    fn compile_type_definitions(f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("  typedef float float8 __attribute__((ext_vector_type(8)));\n")?;
        f.write_str(
            "  __device__ float8 make_float8(float x, float y, float z, float w, float a, float b, float c, float d) { return {x, y, z, w, a, b, c, d}; }\n",
        )
    }
}

// Kernel argument bindings

impl DialectBindings<Self> for HipDialect {
    fn compile_kernel_signature(
        f: &mut std::fmt::Formatter<'_>,
        kernel_name: &str,
        buffers: &[Binding<Self>],
        threads: u32,
    ) -> std::fmt::Result {
        f.write_str("  extern \"C\" __global__\n")?;
        write!(f, "  void __launch_bounds__ ({threads}, 1) {kernel_name}(")?;
        Self::compile_parameters(f, buffers)?;
        f.write_str(")")
    }
}

impl DialectGridBuiltins<Self> for HipDialect {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tessel_core::{
        Compiler,
        ir::{
            Address, BinaryOp, Binding, ConstantValue, Elem, ElemExpr, GridAxis, GridDim,
            IndexExpr, Instruction, KernelDefinition, LaunchConfig, Value, Visibility,
        },
    };

    use crate::HipCompiler;

    #[test_log::test]
    fn reduction_loop_is_indented() {
        let coordinates = vec![GridAxis::new(GridDim::X, 256)];
        let kernel = KernelDefinition {
            name: "r_256_256n1".to_string(),
            elem: Elem::F32,
            buffers: vec![Binding::new(0, Elem::F32, Visibility::ReadWrite, 256)],
            launch: LaunchConfig::single_thread(&coordinates),
            coordinates,
            body: vec![
                Instruction::DeclareAccumulator {
                    out: 0,
                    init: ConstantValue::Float(f64::NEG_INFINITY),
                },
                Instruction::RangeLoop {
                    var: 0,
                    end: 256,
                    body: vec![
                        Instruction::Compute {
                            out: 0,
                            value: ElemExpr::fold(
                                BinaryOp::Max,
                                vec![
                                    Value::Constant(ConstantValue::Float(1.0)).into(),
                                    Value::Accumulator(0).into(),
                                ],
                            ),
                        },
                        Instruction::Accumulate {
                            acc: 0,
                            value: Value::Local(0),
                        },
                    ],
                },
                Instruction::Store {
                    buffer: 0,
                    address: Address::new(vec![IndexExpr::grid(0)], 0),
                    value: Value::Accumulator(0).into(),
                },
            ],
        };

        let source = HipCompiler::new().compile(kernel).to_string();

        let expected = "#include <hip/hip_common.h>
#define INFINITY (__builtin_inff())
#define NAN (__builtin_nanf(\"\"))
  typedef float float8 __attribute__((ext_vector_type(8)));
  __device__ float8 make_float8(float x, float y, float z, float w, float a, float b, float c, float d) { return {x, y, z, w, a, b, c, d}; }
  extern \"C\" __global__
  void __launch_bounds__ (1, 1) r_256_256n1(float* data0) {
  int gidx0 = blockIdx.x; /* 256 */
  float acc0 = -INFINITY;
  for (int ridx0 = 0; ridx0 < 256; ridx0++) {
    float alu0 = max(1.0f,acc0);
    acc0 = alu0;
  }
  *(data0+gidx0) = acc0;
}";
        assert_eq!(source, expected);
    }

    #[test]
    fn inputs_are_const_pointers() {
        let coordinates = vec![GridAxis::new(GridDim::X, 4)];
        let kernel = KernelDefinition {
            name: "E_4".to_string(),
            elem: Elem::F64,
            buffers: vec![
                Binding::new(0, Elem::F64, Visibility::ReadWrite, 4),
                Binding::new(1, Elem::F64, Visibility::Read, 4),
            ],
            launch: LaunchConfig::single_thread(&coordinates),
            coordinates,
            body: vec![
                Instruction::Load {
                    out: 0,
                    buffer: 1,
                    address: Address::new(vec![IndexExpr::grid(0)], 0),
                    guard: None,
                    neutral: ConstantValue::Float(0.0),
                },
                Instruction::Store {
                    buffer: 0,
                    address: Address::new(vec![IndexExpr::grid(0)], 0),
                    value: ElemExpr::fold(
                        BinaryOp::Sub,
                        vec![
                            Value::Loaded(0).into(),
                            Value::Constant(ConstantValue::Float(-2.5)).into(),
                        ],
                    ),
                },
            ],
        };

        let source = HipCompiler::new().compile(kernel).to_string();

        assert!(source.contains("E_4(double* data0, const double* data1) {\n"));
        assert!(source.contains("  double val0 = *(data1+gidx0);\n"));
        assert!(source.ends_with("  *(data0+gidx0) = (val0-(-2.5));\n}"));
    }
}
