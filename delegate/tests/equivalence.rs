//! Substituted evaluation must match the host builtins, element for element.
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;
use tract_delegate::prelude::*;

fn values(len: usize) -> BoxedStrategy<Vec<f32>> {
    vec(any::<i8>().prop_map(|i| i as f32 / 4.0), len..=len).boxed()
}

fn shape(rank: std::ops::Range<usize>, dim: std::ops::Range<usize>) -> BoxedStrategy<Vec<usize>> {
    vec(dim, rank).boxed()
}

fn tensor(shape: Vec<usize>) -> BoxedStrategy<Tensor> {
    let len = shape.iter().product();
    values(len).prop_map(move |v| Tensor::from_shape(&shape, &v).unwrap()).boxed()
}

fn activation() -> BoxedStrategy<FusedActivation> {
    prop_oneof![
        Just(FusedActivation::None),
        Just(FusedActivation::Relu),
        Just(FusedActivation::ReluN1To1),
        Just(FusedActivation::Relu6),
    ]
    .boxed()
}

/// A one node graph: the first tensor is the graph input, the others
/// constants.
#[derive(Debug, Clone)]
struct Problem {
    op: BuiltinOperator,
    options: Option<BuiltinOptions>,
    inputs: Vec<Tensor>,
    output_dt: DatumType,
}

impl Problem {
    fn graph(&self) -> Graph {
        let mut g = Graph::default();
        let x = g.add_input("x", self.inputs[0].datum_type(), self.inputs[0].shape());
        let mut ids = vec![x];
        for (ix, t) in self.inputs[1..].iter().enumerate() {
            ids.push(g.add_const(format!("c{ix}"), t.clone()));
        }
        let y = g.add_tensor("y", self.output_dt);
        g.add_node("op", self.op, self.options, &ids, &[y]).unwrap();
        g.set_output_outlets(&[y]).unwrap();
        g
    }

    fn run(&self, delegate: Option<&SubstitutionDelegate>) -> Interpreter {
        let mut interpreter = Interpreter::new(self.graph());
        if let Some(delegate) = delegate {
            interpreter.modify_graph_with_delegate(delegate).unwrap();
        }
        *interpreter.input_mut(0).unwrap() = self.inputs[0].clone();
        interpreter.allocate_tensors().unwrap();
        interpreter.invoke().unwrap();
        interpreter
    }

    fn check(&self) -> TestCaseResult {
        let host = self.run(None);
        let delegated = self.run(Some(&SubstitutionDelegate::default()));
        prop_assert_eq!(delegated.step_name(0).unwrap(), DELEGATE_NAME);
        prop_assert_eq!(host.output(0).unwrap(), delegated.output(0).unwrap());
        Ok(())
    }
}

/// A shape broadcasting into `full`: some leading axes dropped, some axes
/// set to 1.
fn broadcastable(full: Vec<usize>) -> BoxedStrategy<Vec<usize>> {
    let rank = full.len();
    (0..=rank, vec(any::<bool>(), rank))
        .prop_map(move |(skip, ones)| -> Vec<usize> {
            full[skip..]
                .iter()
                .zip(&ones[skip..])
                .map(|(&d, &one)| if one { 1 } else { d })
                .collect()
        })
        .boxed()
}

/// Add, Mul or Atan2 on two operands broadcasting against each other, either
/// of them possibly the higher rank one.
fn binary() -> BoxedStrategy<Problem> {
    let op = prop_oneof![
        Just(BuiltinOperator::Add),
        Just(BuiltinOperator::Mul),
        Just(BuiltinOperator::Atan2)
    ];
    (op, activation(), shape(1..4, 1..4))
        .prop_flat_map(|(op, activation, full)| {
            (Just(op), Just(activation), broadcastable(full.clone()), broadcastable(full))
        })
        .prop_flat_map(|(op, activation, a, b)| {
            (Just(op), Just(activation), tensor(a), tensor(b))
        })
        .prop_map(|(op, activation, a, b)| {
            let options = match op {
                BuiltinOperator::Add => Some(BuiltinOptions::Add { activation }),
                BuiltinOperator::Mul => Some(BuiltinOptions::Mul { activation }),
                _ => None,
            };
            Problem { op, options, inputs: vec![a, b], output_dt: DatumType::F32 }
        })
        .boxed()
}

fn abs() -> BoxedStrategy<Problem> {
    shape(0..4, 1..4)
        .prop_flat_map(tensor)
        .prop_map(|t| Problem {
            op: BuiltinOperator::Abs,
            options: None,
            inputs: vec![t],
            output_dt: DatumType::F32,
        })
        .boxed()
}

fn add_n() -> BoxedStrategy<Problem> {
    (1usize..5, shape(1..3, 1..4))
        .prop_flat_map(|(n, shape)| vec(tensor(shape), n..=n))
        .prop_map(|inputs| Problem {
            op: BuiltinOperator::AddN,
            options: None,
            inputs,
            output_dt: DatumType::F32,
        })
        .boxed()
}

fn arg_min_max() -> BoxedStrategy<Problem> {
    (any::<bool>(), prop_oneof![Just(DatumType::I32), Just(DatumType::I64)], shape(1..4, 1..4))
        .prop_flat_map(|(max, output_type, shape)| {
            let rank = shape.len() as i64;
            (Just(max), Just(output_type), tensor(shape), -rank..rank)
        })
        .prop_map(|(max, output_type, input, axis)| {
            let (op, options) = if max {
                (BuiltinOperator::ArgMax, BuiltinOptions::ArgMax { output_type })
            } else {
                (BuiltinOperator::ArgMin, BuiltinOptions::ArgMin { output_type })
            };
            Problem {
                op,
                options: Some(options),
                inputs: vec![input, tensor1(&[axis])],
                output_dt: output_type,
            }
        })
        .boxed()
}

fn pool() -> BoxedStrategy<Problem> {
    (
        any::<bool>(),
        prop_oneof![Just(Padding::Valid), Just(Padding::Same)],
        activation(),
        (1usize..4, 1usize..4),
        (1usize..3, 1usize..3),
        (1usize..3, 1usize..7, 1usize..7, 1usize..3),
    )
        .prop_flat_map(|(max, padding, activation, (fh, fw), (sh, sw), (n, h, w, c))| {
            let options = Pool2dOptions::new(padding, [sh, sw], [fh, fw], activation);
            (Just(max), Just(options), tensor(vec![n, h, w, c]))
        })
        .prop_map(|(max, options, input)| Problem {
            op: if max { BuiltinOperator::MaxPool2d } else { BuiltinOperator::AveragePool2d },
            options: Some(BuiltinOptions::Pool2d(options)),
            inputs: vec![input],
            output_dt: DatumType::F32,
        })
        .boxed()
}

fn batch_matmul() -> BoxedStrategy<Problem> {
    (shape(0..3, 1..3), 1usize..4, 1usize..4, 1usize..4)
        .prop_flat_map(|(batch, m, k, n)| {
            let a = [&batch[..], &[m, k]].concat();
            let b = [&batch[..], &[n, k]].concat();
            (tensor(a), tensor(b))
        })
        .prop_map(|(a, b)| Problem {
            op: BuiltinOperator::BatchMatMul,
            options: Some(BuiltinOptions::BatchMatMul { adj_x: false, adj_y: true }),
            inputs: vec![a, b],
            output_dt: DatumType::F32,
        })
        .boxed()
}

fn batch_to_space() -> BoxedStrategy<Problem> {
    ((1usize..3, 1usize..3), 1usize..3, (1usize..4, 1usize..4), 1usize..3)
        .prop_flat_map(|((bh, bw), n, (h, w), c)| {
            let input = tensor(vec![n * bh * bw, h, w, c]);
            // keep at least one row and one column
            let crops = (0..h * bh, 0..w * bw).prop_flat_map(move |(top, left)| {
                (Just(top), 0..h * bh - top, Just(left), 0..w * bw - left)
            });
            (Just([bh, bw]), input, crops)
        })
        .prop_map(|(block, input, (top, bottom, left, right))| {
            let crops = [[top as i32, bottom as i32], [left as i32, right as i32]];
            let block = tensor1(&[block[0] as i32, block[1] as i32]);
            Problem {
                op: BuiltinOperator::BatchToSpaceNd,
                options: None,
                inputs: vec![input, block, tensor2(&crops)],
                output_dt: DatumType::F32,
            }
        })
        .boxed()
}

proptest! {
    #[test]
    fn prop_abs(pb in abs()) {
        pb.check()?;
    }

    #[test]
    fn prop_binary(pb in binary()) {
        pb.check()?;
    }

    #[test]
    fn prop_add_n(pb in add_n()) {
        pb.check()?;
    }

    #[test]
    fn prop_arg_min_max(pb in arg_min_max()) {
        pb.check()?;
    }

    #[test]
    fn prop_pool(pb in pool()) {
        pb.check()?;
    }

    #[test]
    fn prop_batch_matmul(pb in batch_matmul()) {
        pb.check()?;
    }

    #[test]
    fn prop_batch_to_space(pb in batch_to_space()) {
        pb.check()?;
    }
}

#[test]
fn binary_broadcast_scalar_like() {
    let pb = Problem {
        op: BuiltinOperator::Mul,
        options: Some(BuiltinOptions::Mul { activation: FusedActivation::Relu }),
        inputs: vec![
            Tensor::from_shape(&[2, 2], &[-1f32, 2., 3., -4.]).unwrap(),
            tensor1(&[2f32]),
        ],
        output_dt: DatumType::F32,
    };
    pb.check().unwrap();
    let out = pb.run(Some(&SubstitutionDelegate::default()));
    assert_eq!(out.output(0).unwrap().as_slice::<f32>().unwrap(), &[0., 4., 6., 0.]);
}

#[test]
fn binary_secondary_of_higher_rank() {
    let pb = Problem {
        op: BuiltinOperator::Add,
        options: Some(BuiltinOptions::Add { activation: FusedActivation::None }),
        inputs: vec![
            tensor1(&[1f32, 2., 3.]),
            Tensor::from_shape(&[2, 3], &[10f32, 20., 30., 40., 50., 60.]).unwrap(),
        ],
        output_dt: DatumType::F32,
    };
    pb.check().unwrap();
    let out = pb.run(Some(&SubstitutionDelegate::default()));
    let out = out.output(0).unwrap();
    assert_eq!(out.shape(), &[2, 3]);
    assert_eq!(out.as_slice::<f32>().unwrap(), &[11., 22., 33., 41., 52., 63.]);
}
