use super::{prepare_same_shape, Registry};
use crate::internal::*;
use num_traits::Float;
use tract_delegate_linalg::element_wise;

pub fn register_all(reg: &mut Registry) {
    reg.register(BuiltinOperator::Abs, prepare_same_shape, abs);
    reg.register(BuiltinOperator::Relu, prepare_same_shape, relu);
}

fn abs(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            element_wise::abs(input, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}

fn relu(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum + Float>(context: &mut Context, node: &Node) -> TractResult<()> {
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            element_wise::relu(input, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_floatlike!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}
