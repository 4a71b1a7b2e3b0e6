use pretty_assertions::assert_eq;
use tessel::prelude::*;

fn session() -> KernelCompiler<HipCompiler> {
    KernelCompiler::with_lowerer(HipCompiler::new(), Lowerer::default())
}

fn broadcast_sub() -> OperationDescriptor {
    OperationDescriptor::elementwise(
        ElementwiseOp::Sub,
        OperandDescriptor::contiguous([2, 3, 5, 7, 8]),
        vec![Source::buffer([3, 1, 7, 1]), Source::buffer([2, 1, 5, 1, 8])],
    )
}

fn max_of_ones() -> OperationDescriptor {
    OperationDescriptor::reduce(
        ReduceOp::Max,
        vec![1],
        OperandDescriptor::contiguous([256, 1]),
        Source::constant(ConstantValue::Float(1.0), [256, 256]),
    )
}

fn concat_three() -> OperationDescriptor {
    OperationDescriptor::concat(
        1,
        vec![0, 65, 130],
        OperandDescriptor::contiguous([45, 195]),
        vec![
            Source::buffer([45, 65]),
            Source::buffer([45, 65]),
            Source::buffer([45, 65]),
        ],
    )
}

#[test_log::test]
fn broadcast_full_3() {
    let mut session = session();

    let first = session.compile(&broadcast_sub()).unwrap();
    let second = session.compile(&broadcast_sub()).unwrap();

    assert_eq!(first.name, "E_2_3_5_7_8");
    assert_eq!(second.name, "E_2_3_5_7_8n1");
    assert_eq!(second.source, include_str!("fixtures/broadcast_full_3.c"));
    assert_eq!(second.launch.grid, tessel::ir::GridSize::new(280, 3, 2));
}

#[test_log::test]
fn max_dont_collapse() {
    let mut session = session();

    session.compile(&max_of_ones()).unwrap();
    let kernel = session.compile(&max_of_ones()).unwrap();

    assert_eq!(kernel.source, include_str!("fixtures/max_dont_collapse.c"));
    assert_eq!(kernel.launch.grid, tessel::ir::GridSize::new(256, 1, 1));
}

#[test]
fn max_with_dropped_reduced_axis() {
    let descriptor = OperationDescriptor::reduce(
        ReduceOp::Max,
        vec![1],
        OperandDescriptor::contiguous([256]),
        Source::constant(ConstantValue::Float(1.0), [256, 256]),
    )
    .with_name("r_256_256n1");

    let kernel = session().compile(&descriptor).unwrap();

    assert_eq!(kernel.source, include_str!("fixtures/max_dont_collapse.c"));
}

#[test_log::test]
fn multicat() {
    let kernel = session().compile(&concat_three()).unwrap();

    assert_eq!(kernel.name, "E_45_195");
    assert_eq!(kernel.source, include_str!("fixtures/multicat.c"));
    assert_eq!(kernel.launch.grid, tessel::ir::GridSize::new(195, 45, 1));
}

#[test]
fn batch_matches_the_fixtures() {
    let descriptors = vec![
        concat_three(),
        broadcast_sub(),
        max_of_ones(),
        broadcast_sub(),
        max_of_ones(),
    ];

    let kernels: Vec<CompiledKernel> = session()
        .compile_batch(&descriptors)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(kernels[0].source, include_str!("fixtures/multicat.c"));
    assert_eq!(kernels[3].source, include_str!("fixtures/broadcast_full_3.c"));
    assert_eq!(kernels[4].source, include_str!("fixtures/max_dont_collapse.c"));
}

#[test]
fn descriptors_load_from_json() {
    let json = serde_json::to_string(&concat_three()).unwrap();
    let descriptor: OperationDescriptor = serde_json::from_str(&json).unwrap();

    let kernel = session().compile(&descriptor).unwrap();

    assert_eq!(kernel.source, include_str!("fixtures/multicat.c"));
}
