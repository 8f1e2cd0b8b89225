//! Output shapes of the captured descriptors.
use crate::internal::*;
use tract_delegate_linalg::broadcast::multi_broadcast;
use tract_delegate_linalg::matmul::BatchMatMulGeo;

fn input_shape<'c>(context: &'c Context, id: usize) -> TractResult<&'c [usize]> {
    context.shape(id).with_context(|| ShapeError(format!("Reading shape of tensor {id}")))
}

fn read_ints(context: &Context, id: usize) -> TractResult<TVec<i64>> {
    context
        .tensor(id)
        .and_then(|t| t.to_i64s())
        .with_context(|| ShapeError(format!("Reading integer parameters from tensor {id}")))
}

/// The reduced axis of ArgMax and ArgMin, read from the axis tensor. A
/// negative axis counts from the last one.
pub fn reduction_axis(desc: &NodeDescriptor, context: &Context) -> TractResult<usize> {
    let rank = input_shape(context, desc.primary_input())?.len() as i64;
    let axis = read_ints(context, desc.inputs[1])?;
    if axis.len() != 1 {
        bail!(ShapeError(format!("{} expects a single axis, got {:?}", desc.kind, axis)));
    }
    let resolved = if axis[0] < 0 { axis[0] + rank } else { axis[0] };
    if !(0..rank).contains(&resolved) {
        bail!(ShapeError(format!("Axis {} out of range for rank {}", axis[0], rank)));
    }
    Ok(resolved as usize)
}

/// Block sizes and `(before, after)` crops of BatchToSpaceNd, checked
/// against the input rank.
pub fn batch_to_space_params(
    desc: &NodeDescriptor,
    context: &Context,
) -> TractResult<(TVec<usize>, TVec<(usize, usize)>)> {
    let rank = input_shape(context, desc.primary_input())?.len();
    if rank != 3 && rank != 4 {
        bail!(ShapeError(format!("BatchToSpaceNd input must have rank 3 or 4, got {rank}")));
    }
    let spatial = rank - 2;
    let block = read_ints(context, desc.inputs[1])?;
    let crops = read_ints(context, desc.inputs[2])?;
    if block.len() != spatial || block.iter().any(|&b| b < 1) {
        bail!(ShapeError(format!("Invalid block shape {block:?} for {spatial} spatial axes")));
    }
    if crops.len() != 2 * spatial || crops.iter().any(|&c| c < 0) {
        bail!(ShapeError(format!("Invalid crops {crops:?} for {spatial} spatial axes")));
    }
    Ok((
        block.iter().map(|&b| b as usize).collect(),
        crops.chunks(2).map(|c| (c[0] as usize, c[1] as usize)).collect(),
    ))
}

fn batch_to_space_shape(desc: &NodeDescriptor, context: &Context) -> TractResult<TVec<usize>> {
    let (block, crops) = batch_to_space_params(desc, context)?;
    let input = input_shape(context, desc.primary_input())?;
    let block_len = block
        .iter()
        .try_fold(1usize, |acc, &b| acc.checked_mul(b))
        .ok_or_else(|| ShapeError(format!("Block sizes {block:?} overflow")))?;
    if input[0] % block_len != 0 {
        bail!(ShapeError(format!(
            "Batch size {} is not a multiple of the block size {}",
            input[0], block_len
        )));
    }
    let mut shape: TVec<usize> = input.into();
    shape[0] = input[0] / block_len;
    for (axis, (&b, &(before, after))) in block.iter().zip(crops.iter()).enumerate() {
        let full = input[axis + 1].checked_mul(b).ok_or_else(|| {
            ShapeError(format!("Block size {b} overflows axis {}", axis + 1))
        })?;
        shape[axis + 1] = before
            .checked_add(after)
            .and_then(|crop| full.checked_sub(crop))
            .ok_or_else(|| ShapeError(format!("Crops ({before}, {after}) exceed {full}")))?;
    }
    Ok(shape)
}

/// Output shape of a descriptor, from its input shapes and parameters.
pub fn output_shape(desc: &NodeDescriptor, context: &Context) -> TractResult<TVec<usize>> {
    let primary = input_shape(context, desc.primary_input())?;
    let shape: TVec<usize> = match desc.kind {
        OperatorKind::Abs => primary.into(),
        OperatorKind::Add | OperatorKind::Mul | OperatorKind::Atan2 => {
            let secondary = input_shape(context, desc.inputs[1])?;
            multi_broadcast(&[primary, secondary]).with_context(|| {
                ShapeError(format!("{} operands {:?} and {:?}", desc.kind, primary, secondary))
            })?
        }
        OperatorKind::AddN => {
            for &input in &desc.inputs[1..] {
                let shape = input_shape(context, input)?;
                if shape != primary {
                    bail!(ShapeError(format!(
                        "AddN inputs have different shapes: {primary:?} and {shape:?}"
                    )));
                }
            }
            primary.into()
        }
        OperatorKind::ArgMax | OperatorKind::ArgMin => {
            let axis = reduction_axis(desc, context)?;
            let mut shape: TVec<usize> = primary.into();
            shape.remove(axis);
            shape
        }
        OperatorKind::AveragePool2d | OperatorKind::MaxPool2d => {
            if primary.len() != 4 {
                bail!(ShapeError(format!("Pooling expects a NHWC input, got {primary:?}")));
            }
            let geometry = desc.pool_geometry()?;
            geometry
                .output_shape(primary)
                .with_context(|| ShapeError(format!("Pooling {primary:?} with {geometry:?}")))?
        }
        OperatorKind::BatchMatMul => {
            let (adj_x, adj_y) = desc.adjoints()?;
            let other = input_shape(context, desc.inputs[1])?;
            BatchMatMulGeo::compute(primary, other, adj_x, adj_y)
                .with_context(|| ShapeError(format!("BatchMatMul of {primary:?} by {other:?}")))?
                .output_shape()
        }
        OperatorKind::BatchToSpaceNd => batch_to_space_shape(desc, context)?,
    };
    Ok(shape)
}

/// Compute every output shape of the region and have the host resize the
/// output tensors accordingly. Resizing to the current shape is a no-op, so
/// calling this again without input change leaves everything untouched.
pub fn infer_and_resize(region: &SubstitutedRegion, context: &mut Context) -> TractResult<()> {
    for desc in region.iter() {
        let shape = output_shape(desc, context)?;
        trace!("{} output {} resized to {:?}", desc.kind, desc.output(), shape);
        context
            .resize_tensor(desc.output(), &shape)
            .with_context(|| ShapeError(format!("Host refused to resize {}", desc.output())))?;
    }
    Ok(())
}
