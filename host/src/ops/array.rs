use super::{check_arity, read_ints, same_type_as_input, Registry};
use crate::internal::*;
use tract_delegate_linalg::space::batch_to_space_nd;

pub fn register_all(reg: &mut Registry) {
    reg.register(BuiltinOperator::BatchToSpaceNd, prepare_batch_to_space, batch_to_space);
}

/// Block sizes and `(before, after)` crops of a BatchToSpaceNd node, checked
/// against the input rank.
pub fn batch_to_space_params(
    context: &Context,
    node: &Node,
) -> TractResult<(TVec<usize>, TVec<(usize, usize)>)> {
    let rank = context.shape(node.inputs[0])?.len();
    ensure!(rank == 3 || rank == 4, "BatchToSpaceNd input must be rank 3 or 4, got {}", rank);
    let spatial = rank - 2;
    let block = read_ints(context, node.inputs[1])?;
    let crops = read_ints(context, node.inputs[2])?;
    ensure!(block.len() == spatial, "Expected {} block sizes, got {:?}", spatial, block);
    ensure!(crops.len() == 2 * spatial, "Expected {} crop values, got {:?}", 2 * spatial, crops);
    ensure!(block.iter().all(|&b| b >= 1), "Block sizes must be positive, got {:?}", block);
    ensure!(crops.iter().all(|&c| c >= 0), "Crops must be non-negative, got {:?}", crops);
    let block = block.iter().map(|&b| b as usize).collect();
    let crops = crops.chunks(2).map(|c| (c[0] as usize, c[1] as usize)).collect();
    Ok((block, crops))
}

/// Output shape of BatchToSpaceNd.
pub fn batch_to_space_shape(
    input: &[usize],
    block: &[usize],
    crops: &[(usize, usize)],
) -> TractResult<TVec<usize>> {
    let block_len = block
        .iter()
        .try_fold(1usize, |acc, &b| acc.checked_mul(b))
        .with_context(|| format!("Block sizes {block:?} overflow"))?;
    ensure!(
        input[0] % block_len == 0,
        "Batch {} is not a multiple of block size {}",
        input[0],
        block_len
    );
    let mut shape: TVec<usize> = input.into();
    shape[0] = input[0] / block_len;
    for (ix, (&b, &(before, after))) in block.iter().zip(crops.iter()).enumerate() {
        let full = input[ix + 1]
            .checked_mul(b)
            .with_context(|| format!("Block size {} overflows axis {}", b, ix + 1))?;
        shape[ix + 1] = before
            .checked_add(after)
            .and_then(|crop| full.checked_sub(crop))
            .with_context(|| {
                format!("Crops ({before}, {after}) exceed spatial size {full} on axis {}", ix + 1)
            })?;
    }
    Ok(shape)
}

fn prepare_batch_to_space(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 3, 1)?;
    same_type_as_input(context, node)?;
    let (block, crops) = batch_to_space_params(context, node)?;
    let shape = batch_to_space_shape(context.shape(node.inputs[0])?, &block, &crops)?;
    context.resize_tensor(node.outputs[0], &shape)
}

fn batch_to_space(context: &mut Context, node: &Node) -> TractResult<()> {
    fn eval_t<T: Datum>(context: &mut Context, node: &Node) -> TractResult<()> {
        let (block, crops) = batch_to_space_params(context, node)?;
        context.with_tensor_mut(node.outputs[0], |context, output| {
            let input = context.tensor(node.inputs[0])?.to_array_view::<T>()?;
            batch_to_space_nd(input, &block, &crops, output.to_array_view_mut::<T>()?)
        })
    }
    dispatch_datum!(eval_t(context.datum_type(node.inputs[0])?)(context, node))
}
