use super::{check_arity, read_ints, Registry};
use crate::internal::*;
use num_traits::NumCast;
use tract_delegate_linalg::reduce::arg_min_max;

pub fn register_all(reg: &mut Registry) {
    reg.register(BuiltinOperator::ArgMax, prepare_arg_min_max, arg_max);
    reg.register(BuiltinOperator::ArgMin, prepare_arg_min_max, arg_min);
}

/// Read the reduction axis from the second input, resolving negative values
/// against the input rank.
pub fn reduction_axis(context: &Context, node: &Node) -> TractResult<usize> {
    let axis = read_ints(context, node.inputs[1])?;
    ensure!(axis.len() == 1, "Expected a single axis, got {:?}", axis);
    let rank = context.shape(node.inputs[0])?.len() as i64;
    let resolved = if axis[0] < 0 { axis[0] + rank } else { axis[0] };
    ensure!(0 <= resolved && resolved < rank, "Axis {} out of range for rank {}", axis[0], rank);
    Ok(resolved as usize)
}

fn prepare_arg_min_max(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 2, 1)?;
    let output_dt = context.datum_type(node.outputs[0])?;
    ensure!(
        output_dt == DatumType::I32 || output_dt == DatumType::I64,
        "{} output must be I32 or I64, got {:?}",
        node.op,
        output_dt
    );
    if let Some(BuiltinOptions::ArgMax { output_type } | BuiltinOptions::ArgMin { output_type }) =
        node.options
    {
        ensure!(
            output_type == output_dt,
            "{} declares output type {:?} but its output is {:?}",
            node.op,
            output_type,
            output_dt
        );
    }
    let axis = reduction_axis(context, node)?;
    let mut shape: TVec<usize> = context.shape(node.inputs[0])?.into();
    shape.remove(axis);
    context.resize_tensor(node.outputs[0], &shape)
}

fn eval_arg_min_max(context: &mut Context, node: &Node, max: bool) -> TractResult<()> {
    fn eval_t<T: Datum + PartialOrd, I: Datum + NumCast>(
        context: &mut Context,
        node: &Node,
        max: bool,
    ) -> TractResult<()> {
        let axis = reduction_axis(context, node)?;
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            arg_min_max(input, axis, max, output.to_array_view_mut::<I>()?)
        })
    }
    fn eval_input<T: Datum + PartialOrd>(
        context: &mut Context,
        node: &Node,
        max: bool,
    ) -> TractResult<()> {
        match context.datum_type(node.outputs[0])? {
            DatumType::I32 => eval_t::<T, i32>(context, node, max),
            DatumType::I64 => eval_t::<T, i64>(context, node, max),
            dt => bail!("Unsupported output type {:?}", dt),
        }
    }
    dispatch_numbers!(eval_input(context.datum_type(node.inputs[0])?)(context, node, max))
}

fn arg_max(context: &mut Context, node: &Node) -> TractResult<()> {
    eval_arg_min_max(context, node, true)
}

fn arg_min(context: &mut Context, node: &Node) -> TractResult<()> {
    eval_arg_min_max(context, node, false)
}
