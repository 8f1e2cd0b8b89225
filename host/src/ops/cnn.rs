use super::{check_arity, same_type_as_input, Registry};
use crate::internal::*;
use num_traits::Float;
use tract_delegate_linalg::pool::{average_pool, max_pool};

pub fn register_all(reg: &mut Registry) {
    reg.register(BuiltinOperator::AveragePool2d, prepare_pool, avg_pool);
    reg.register(BuiltinOperator::MaxPool2d, prepare_pool, max_pool_eval);
}

fn pool_options(node: &Node) -> Pool2dOptions {
    match node.options {
        Some(BuiltinOptions::Pool2d(options)) => options,
        _ => Pool2dOptions::default(),
    }
}

fn prepare_pool(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 1, 1)?;
    same_type_as_input(context, node)?;
    let shape = pool_options(node).geometry().output_shape(context.shape(node.inputs[0])?)?;
    context.resize_tensor(node.outputs[0], &shape)
}

fn avg_pool(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        let options = pool_options(node);
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            average_pool(
                &options.geometry(),
                options.activation.range(),
                input,
                output.to_array_view_mut::<T>()?,
            )
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}

fn max_pool_eval(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        let options = pool_options(node);
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            max_pool(
                &options.geometry(),
                options.activation.range(),
                input,
                output.to_array_view_mut::<T>()?,
            )
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}
