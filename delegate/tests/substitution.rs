use approx::assert_abs_diff_eq;
use std::f32::consts::PI;
use tract_delegate::prelude::*;
use tract_delegate::{capture, evaluate, infer_and_resize, is_supported};

fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TRACT_LOG").try_init();
}

/// One node graph. The first tensor is the graph input, the others are
/// constants.
fn single_node(
    op: BuiltinOperator,
    options: Option<BuiltinOptions>,
    inputs: &[Tensor],
    output_dt: DatumType,
) -> Graph {
    let mut g = Graph::default();
    let x = g.add_input("x", inputs[0].datum_type(), inputs[0].shape());
    let mut ids = vec![x];
    for (ix, t) in inputs[1..].iter().enumerate() {
        ids.push(g.add_const(format!("c{ix}"), t.clone()));
    }
    let y = g.add_tensor("y", output_dt);
    g.add_node("op", op, options, &ids, &[y]).unwrap();
    g.set_output_outlets(&[y]).unwrap();
    g
}

fn run(graph: Graph, delegate: Option<&SubstitutionDelegate>, input: Tensor) -> Interpreter {
    setup_test_logger();
    let mut interpreter = Interpreter::new(graph);
    if let Some(delegate) = delegate {
        interpreter.modify_graph_with_delegate(delegate).unwrap();
    }
    *interpreter.input_mut(0).unwrap() = input;
    interpreter.allocate_tensors().unwrap();
    interpreter.invoke().unwrap();
    interpreter
}

/// Run a one node graph through the delegate, checking it took the node.
fn substituted(
    op: BuiltinOperator,
    options: Option<BuiltinOptions>,
    inputs: &[Tensor],
    output_dt: DatumType,
) -> Tensor {
    let graph = single_node(op, options, inputs, output_dt);
    let interpreter = run(graph, Some(&SubstitutionDelegate::default()), inputs[0].clone());
    assert_eq!(interpreter.execution_plan().len(), 1);
    assert_eq!(interpreter.step_name(0).unwrap(), DELEGATE_NAME);
    interpreter.output(0).unwrap().clone()
}

fn f32s(shape: &[usize], values: &[f32]) -> Tensor {
    Tensor::from_shape(shape, values).unwrap()
}

#[test]
fn abs() {
    let out = substituted(
        BuiltinOperator::Abs,
        None,
        &[tensor1(&[-2f32, 0.2, -0.7, 0.8])],
        DatumType::F32,
    );
    assert_eq!(out.as_slice::<f32>().unwrap(), &[2., 0.2, 0.7, 0.8]);
}

#[test]
fn add() {
    let out = substituted(
        BuiltinOperator::Add,
        Some(BuiltinOptions::Add { activation: FusedActivation::None }),
        &[tensor1(&[-2f32, 0.2, 0.7, 0.8]), tensor1(&[0.1f32, 0.2, 0.3, 0.5])],
        DatumType::F32,
    );
    assert_abs_diff_eq!(
        out.as_slice::<f32>().unwrap(),
        &[-1.9f32, 0.4, 1.0, 1.3][..],
        epsilon = 1e-6
    );
}

#[test]
fn mul() {
    let out = substituted(
        BuiltinOperator::Mul,
        None,
        &[tensor1(&[-2f32, 0.2, 0.7, 0.8]), tensor1(&[0.1f32, 0.2, 0.3, 0.5])],
        DatumType::F32,
    );
    assert_abs_diff_eq!(
        out.as_slice::<f32>().unwrap(),
        &[-0.2f32, 0.04, 0.21, 0.4][..],
        epsilon = 1e-6
    );
}

#[test]
fn atan2() {
    let out = substituted(
        BuiltinOperator::Atan2,
        None,
        &[tensor1(&[1f32, 0., -1., 0.]), tensor1(&[0f32, 1., 0., -1.])],
        DatumType::F32,
    );
    assert_abs_diff_eq!(
        out.as_slice::<f32>().unwrap(),
        &[PI / 2., 0., -PI / 2., PI][..],
        epsilon = 1e-6
    );
}

#[test]
fn add_n() {
    let out = substituted(
        BuiltinOperator::AddN,
        None,
        &[
            tensor1(&[1f32, 2., 3., 4.]),
            tensor1(&[10f32, 20., 30., 40.]),
            tensor1(&[100f32, 200., 300., 400.]),
        ],
        DatumType::F32,
    );
    assert_eq!(out.as_slice::<f32>().unwrap(), &[111., 222., 333., 444.]);
}

#[test]
fn arg_max() {
    let out = substituted(
        BuiltinOperator::ArgMax,
        Some(BuiltinOptions::ArgMax { output_type: DatumType::I32 }),
        &[f32s(&[1, 3], &[1., 3., 2.]), tensor1(&[1i32])],
        DatumType::I32,
    );
    assert_eq!(out.shape(), &[1]);
    assert_eq!(out.as_slice::<i32>().unwrap(), &[1]);
}

#[test]
fn arg_min() {
    let out = substituted(
        BuiltinOperator::ArgMin,
        None,
        &[f32s(&[1, 3], &[1., 3., 2.]), tensor1(&[1i32])],
        DatumType::I64,
    );
    assert_eq!(out.as_slice::<i64>().unwrap(), &[0]);
}

#[test]
fn average_pool() {
    let options = Pool2dOptions::new(Padding::Valid, [1, 1], [2, 2], FusedActivation::None);
    let out = substituted(
        BuiltinOperator::AveragePool2d,
        Some(BuiltinOptions::Pool2d(options)),
        &[f32s(&[1, 2, 2, 1], &[1., 2., 3., 4.])],
        DatumType::F32,
    );
    assert_eq!(out.shape(), &[1, 1, 1, 1]);
    assert_eq!(out.as_slice::<f32>().unwrap(), &[2.5]);
}

#[test]
fn max_pool_same() {
    let options = Pool2dOptions::new(Padding::Same, [2, 2], [2, 2], FusedActivation::Relu6);
    let out = substituted(
        BuiltinOperator::MaxPool2d,
        Some(BuiltinOptions::Pool2d(options)),
        &[f32s(&[1, 3, 3, 1], &[1., 2., 3., 4., 5., 6., 7., 8., 9.])],
        DatumType::F32,
    );
    assert_eq!(out.shape(), &[1, 2, 2, 1]);
    assert_eq!(out.as_slice::<f32>().unwrap(), &[5., 6., 6., 6.]);
}

#[test]
fn batch_matmul() {
    let out = substituted(
        BuiltinOperator::BatchMatMul,
        Some(BuiltinOptions::BatchMatMul { adj_x: false, adj_y: true }),
        &[f32s(&[1, 2], &[1., 2.]), f32s(&[3, 2], &[1., 2., 3., 4., 5., 6.])],
        DatumType::F32,
    );
    assert_eq!(out.shape(), &[1, 3]);
    assert_eq!(out.as_slice::<f32>().unwrap(), &[5., 11., 17.]);
}

#[test]
fn batch_to_space() {
    let out = substituted(
        BuiltinOperator::BatchToSpaceNd,
        None,
        &[
            f32s(&[4, 1, 1, 1], &[1., 2., 3., 4.]),
            tensor1(&[2i32, 2]),
            tensor2(&[[0i32, 0], [0, 0]]),
        ],
        DatumType::F32,
    );
    assert_eq!(out.shape(), &[1, 2, 2, 1]);
    assert_eq!(out.as_slice::<f32>().unwrap(), &[1., 2., 3., 4.]);
}

#[test]
fn matmul_without_adj_y_stays_on_host() {
    let graph = single_node(
        BuiltinOperator::BatchMatMul,
        None,
        &[f32s(&[1, 2], &[1., 2.]), f32s(&[2, 3], &[1., 3., 5., 2., 4., 6.])],
        DatumType::F32,
    );
    let interpreter = run(graph, Some(&SubstitutionDelegate::default()), f32s(&[1, 2], &[1., 2.]));
    assert_eq!(interpreter.step_name(0).unwrap(), "BatchMatMul");
    assert_eq!(interpreter.output(0).unwrap().as_slice::<f32>().unwrap(), &[5., 11., 17.]);
}

#[test]
fn integer_inputs_stay_on_host() {
    let inputs = [tensor1(&[1i32, 2, 3]), tensor1(&[10i32, 20, 30])];
    let graph = single_node(BuiltinOperator::Add, None, &inputs, DatumType::I32);
    let context = Context::new(graph.clone());
    assert!(!is_supported(&context, 0, &SubstitutionOptions::all()));
    let interpreter = run(graph, Some(&SubstitutionDelegate::default()), inputs[0].clone());
    assert_eq!(interpreter.step_name(0).unwrap(), "Add");
    assert_eq!(interpreter.output(0).unwrap().as_slice::<i32>().unwrap(), &[11, 22, 33]);
}

#[test]
fn forced_integer_evaluation_fails() {
    let inputs = [tensor1(&[1i32, 2, 3]), tensor1(&[10i32, 20, 30])];
    let graph = single_node(BuiltinOperator::Add, None, &inputs, DatumType::I32);
    let mut context = Context::new(graph);
    let region = capture(&context, &[0]).unwrap();
    infer_and_resize(&region, &mut context).unwrap();
    let err = evaluate(&region, &mut context).unwrap_err();
    assert!(matches!(SubstitutionError::find(&err), Some(SubstitutionError::UnsupportedType(_))));
    assert_eq!(context.tensor(2).unwrap().as_slice::<i32>().unwrap(), &[0, 0, 0]);
}

#[test]
fn support_is_pure() {
    let graph = single_node(BuiltinOperator::Abs, None, &[tensor1(&[1f32])], DatumType::F32);
    let context = Context::new(graph);
    let options = SubstitutionOptions::all();
    let answers: Vec<bool> = (0..3).map(|_| is_supported(&context, 0, &options)).collect();
    assert_eq!(answers, vec![true; 3]);
}

#[test]
fn prepare_is_idempotent_and_follows_input_shape() {
    let graph = single_node(BuiltinOperator::Abs, None, &[tensor1(&[1f32, -2.])], DatumType::F32);
    let mut interpreter = Interpreter::new(graph);
    interpreter.modify_graph_with_delegate(&SubstitutionDelegate::default()).unwrap();
    interpreter.allocate_tensors().unwrap();
    interpreter.allocate_tensors().unwrap();
    assert_eq!(interpreter.output(0).unwrap().shape(), &[2]);
    interpreter.resize_input_tensor(0, &[2, 3]).unwrap();
    interpreter.allocate_tensors().unwrap();
    assert_eq!(interpreter.output(0).unwrap().shape(), &[2, 3]);
    interpreter.set_input(0, &[-1f32, 2., -3., 4., -5., 6.]).unwrap();
    interpreter.invoke().unwrap();
    let output = interpreter.output(0).unwrap();
    assert_eq!(output.as_slice::<f32>().unwrap(), &[1., 2., 3., 4., 5., 6.]);
}

/// x -> Abs -> Add(y) -> Mul(y) -> Relu -> Abs
fn chain() -> Graph {
    let mut g = Graph::default();
    let x = g.add_input("x", DatumType::F32, &[4]);
    let y = g.add_const("y", tensor1(&[0.1f32, 0.2, 0.3, 0.5]));
    let t: Vec<usize> = (0..5).map(|ix| g.add_tensor(format!("t{ix}"), DatumType::F32)).collect();
    g.add_node("abs", BuiltinOperator::Abs, None, &[x], &[t[0]]).unwrap();
    g.add_node("add", BuiltinOperator::Add, None, &[t[0], y], &[t[1]]).unwrap();
    g.add_node("mul", BuiltinOperator::Mul, None, &[t[1], y], &[t[2]]).unwrap();
    g.add_node("relu", BuiltinOperator::Relu, None, &[t[2]], &[t[3]]).unwrap();
    g.add_node("abs2", BuiltinOperator::Abs, None, &[t[3]], &[t[4]]).unwrap();
    g.set_output_outlets(&[t[4]]).unwrap();
    g
}

fn step_names(interpreter: &Interpreter) -> Vec<String> {
    (0..interpreter.execution_plan().len()).map(|ix| interpreter.step_name(ix).unwrap()).collect()
}

const CHAIN_INPUT: [f32; 4] = [-2., 0.2, -0.7, 0.8];

fn chain_with(options: SubstitutionOptions) -> Interpreter {
    let delegate = SubstitutionDelegate::new(options);
    run(chain(), Some(&delegate), tensor1(&CHAIN_INPUT))
}

#[test]
fn partitions_follow_supported_runs() {
    let reference = run(chain(), None, tensor1(&CHAIN_INPUT));
    let interpreter = chain_with(SubstitutionOptions::all());
    assert_eq!(step_names(&interpreter), vec![DELEGATE_NAME, "Relu", DELEGATE_NAME]);
    let Step::Delegated(first) = &interpreter.execution_plan()[0] else {
        panic!("expected a delegated step")
    };
    assert_eq!(&*first.nodes, &[0, 1, 2]);
    assert_eq!(
        interpreter.output(0).unwrap().as_slice::<f32>().unwrap(),
        reference.output(0).unwrap().as_slice::<f32>().unwrap()
    );
}

#[test]
fn add_only_and_mul_only() {
    let add_only = chain_with(SubstitutionOptions::only(&[OperatorKind::Add]));
    assert_eq!(step_names(&add_only), vec!["Abs", DELEGATE_NAME, "Mul", "Relu", "Abs"]);
    let mul_only = chain_with(SubstitutionOptions::only(&[OperatorKind::Mul]));
    assert_eq!(step_names(&mul_only), vec!["Abs", "Add", DELEGATE_NAME, "Relu", "Abs"]);
    let expected = [0.21f32, 0.08, 0.3, 0.65];
    for interpreter in [add_only, mul_only] {
        let output = interpreter.output(0).unwrap().as_slice::<f32>().unwrap();
        assert_abs_diff_eq!(output, &expected[..], epsilon = 1e-6);
    }
}

#[test]
fn partition_limits() {
    let one = chain_with(SubstitutionOptions::all().with_max_delegated_partitions(1));
    assert_eq!(step_names(&one), vec![DELEGATE_NAME, "Relu", "Abs"]);
    let long = chain_with(SubstitutionOptions::all().with_min_nodes_per_partition(2));
    assert_eq!(step_names(&long), vec![DELEGATE_NAME, "Relu", "Abs"]);
    let none = chain_with(SubstitutionOptions::all().with_min_nodes_per_partition(4));
    assert_eq!(step_names(&none), vec!["Abs", "Add", "Mul", "Relu", "Abs"]);
}

#[test]
fn malformed_node_aborts_activation() {
    let mut g = Graph::default();
    let x = g.add_input("x", DatumType::F32, &[2]);
    let y = g.add_tensor("y", DatumType::F32);
    let options = BuiltinOptions::Mul { activation: FusedActivation::Relu };
    g.add_node("abs", BuiltinOperator::Abs, Some(options), &[x], &[y]).unwrap();
    g.set_output_outlets(&[y]).unwrap();
    let mut interpreter = Interpreter::new(g);
    let err = interpreter.modify_graph_with_delegate(&SubstitutionDelegate::default()).unwrap_err();
    assert!(matches!(SubstitutionError::find(&err), Some(SubstitutionError::MalformedGraph(_))));
    assert_eq!(step_names(&interpreter), vec!["Abs"]);
}
