use super::{check_arity, same_type_as_input, Registry};
use crate::internal::*;
use num_traits::{Float, WrappingAdd, WrappingMul};
use tract_delegate_linalg::broadcast::multi_broadcast;
use tract_delegate_linalg::element_wise;
use tract_delegate_linalg::matmul::{batch_matmul, BatchMatMulGeo};
use tract_delegate_linalg::reduce;
use tract_ndarray::LinalgScalar;

pub fn register_all(reg: &mut Registry) {
    reg.register(BuiltinOperator::Add, prepare_binary, add);
    reg.register(BuiltinOperator::Sub, prepare_binary, sub);
    reg.register(BuiltinOperator::Mul, prepare_binary, mul);
    reg.register(BuiltinOperator::Atan2, prepare_binary, atan2);
    reg.register(BuiltinOperator::AddN, prepare_add_n, add_n);
    reg.register(BuiltinOperator::BatchMatMul, prepare_batch_matmul, batch_matmul_eval);
}

fn activation(node: &Node) -> FusedActivation {
    node.options.and_then(|o| o.activation()).unwrap_or_default()
}

/// Binary operators broadcast both operands against each other.
fn prepare_binary(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 2, 1)?;
    let dt = same_type_as_input(context, node)?;
    ensure!(
        context.datum_type(node.inputs[1])? == dt,
        "{} operands have different types",
        node.op
    );
    let shape =
        multi_broadcast(&[context.shape(node.inputs[0])?, context.shape(node.inputs[1])?])?;
    context.resize_tensor(node.outputs[0], &shape)
}

fn eval_float<T: Datum + Float>(
    context: &mut Context,
    node: &Node,
    f: impl Fn(T, T) -> T,
) -> TractResult<()> {
    let range = activation(node).range::<T>();
    context.with_tensor_mut(node.outputs[0], |context, output| {
        let a = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
        let b = context.tensor(node.inputs[1])?.to_array_view::<T>()?;
        element_wise::binary(a, b, range, output.to_array_view_mut::<T>()?, f)
    })
}

fn eval_integer<T: Datum + WrappingAdd + WrappingMul>(
    context: &mut Context,
    node: &Node,
    mul: bool,
) -> TractResult<()> {
    ensure!(
        activation(node) == FusedActivation::None,
        "Fused activation on {} requires float operands",
        node.op
    );
    context.with_tensor_mut(node.outputs[0], |context, output| {
        let a = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
        let b = context.tensor(node.inputs[1])?.to_array_view::<T>()?;
        let output = output.to_array_view_mut::<T>()?;
        if mul {
            element_wise::mul_wrapping(a, b, output)
        } else {
            element_wise::add_wrapping(a, b, output)
        }
    })
}

fn add(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        eval_float::<T>(context, node, |a, b| a + b)
    }
    match context.datum_type(node.inputs[0])? {
        DatumType::I32 => eval_integer::<i32>(context, node, false),
        DatumType::I64 => eval_integer::<i64>(context, node, false),
        dt => dispatch_floatlike!(eval_t(dt)(context, node)),
    }
}

fn mul(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        eval_float::<T>(context, node, |a, b| a * b)
    }
    match context.datum_type(node.inputs[0])? {
        DatumType::I32 => eval_integer::<i32>(context, node, true),
        DatumType::I64 => eval_integer::<i64>(context, node, true),
        dt => dispatch_floatlike!(eval_t(dt)(context, node)),
    }
}

fn sub(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        eval_float::<T>(context, node, |a, b| a - b)
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}

fn atan2(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let y = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            let x = context.tensor(node.inputs[1])?.to_array_view::<T>()?;
            element_wise::atan2(y, x, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}

fn prepare_add_n(context: &mut Context, node: &Node) -> TractResult<()> {
    ensure!(
        !node.inputs.is_empty() && node.outputs.len() == 1,
        "AddN expects at least one input and exactly one output"
    );
    let dt = same_type_as_input(context, node)?;
    let shape: TVec<usize> = context.shape(node.inputs[0])?.into();
    for &input in &node.inputs[1..] {
        ensure!(context.datum_type(input)? == dt, "AddN inputs have different types");
        ensure!(
            context.shape(input)? == &*shape,
            "AddN inputs have different shapes: {:?} and {:?}",
            shape,
            context.shape(input)?
        );
    }
    context.resize_tensor(node.outputs[0], &shape)
}

fn add_n(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let inputs = node
                .inputs
                .iter()
                .map(|&i| context.tensor(i)?.to_array_view::<T>())
                .collect::<TractResult<TVec<_>>>()?;
            reduce::add_n(&inputs, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}

fn adjoints(node: &Node) -> (bool, bool) {
    match node.options {
        Some(BuiltinOptions::BatchMatMul { adj_x, adj_y }) => (adj_x, adj_y),
        _ => (false, false),
    }
}

fn prepare_batch_matmul(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 2, 1)?;
    same_type_as_input(context, node)?;
    let (adj_x, adj_y) = adjoints(node);
    let geo = BatchMatMulGeo::compute(
        context.shape(node.inputs[0])?,
        context.shape(node.inputs[1])?,
        adj_x,
        adj_y,
    )?;
    context.resize_tensor(node.outputs[0], &geo.output_shape())
}

fn batch_matmul_eval(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float + LinalgScalar>(
        context: &mut Context,
        node: &Node,
    ) -> TractResult<()> {
        let (adj_x, adj_y) = adjoints(node);
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let a = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            let b = context.tensor(node.inputs[1])?.to_array_view::<T>()?;
            batch_matmul(a, b, adj_x, adj_y, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}
