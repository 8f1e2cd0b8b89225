//! Evaluation of the captured descriptors.
use crate::internal::*;
use crate::shape::{batch_to_space_params, reduction_axis};
use tract_delegate_linalg::pool::{average_pool, max_pool};
use tract_delegate_linalg::{element_wise, matmul, reduce, space};

fn check_type(
    desc: &NodeDescriptor,
    what: &str,
    dt: DatumType,
    allowed: &[DatumType],
) -> TractResult<()> {
    if !allowed.contains(&dt) {
        bail!(UnsupportedType(format!(
            "{} {} is {:?}, supported: {:?}",
            desc.kind, what, dt, allowed
        )));
    }
    Ok(())
}

/// ArgMax and ArgMin must write the index type their options declare.
fn check_declared_output(desc: &NodeDescriptor, output: DatumType) -> TractResult<()> {
    if let Some(declared) = desc.declared_output_type()? {
        if declared != output {
            bail!(UnsupportedType(format!(
                "{} declares output type {:?} but its output is {:?}",
                desc.kind, declared, output
            )));
        }
    }
    Ok(())
}

fn run(desc: &NodeDescriptor, context: &mut Context) -> TractResult<()> {
    let range = desc.activation.range::<f32>();
    match desc.kind {
        OperatorKind::Abs => context.with_view_mut(desc.output(), |context, mut output| {
            let input = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
            element_wise::abs(input, output.to_array_view_mut::<f32>()?)
        }),
        OperatorKind::Add | OperatorKind::Mul | OperatorKind::Atan2 => {
            context.with_view_mut(desc.output(), |context, mut output| {
                let a = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
                let b = context.tensor_view(desc.inputs[1])?.to_array_view::<f32>()?;
                let c = output.to_array_view_mut::<f32>()?;
                match desc.kind {
                    OperatorKind::Add => element_wise::add(a, b, range, c),
                    OperatorKind::Mul => element_wise::mul(a, b, range, c),
                    _ => element_wise::atan2(a, b, c),
                }
            })
        }
        OperatorKind::AddN => context.with_view_mut(desc.output(), |context, mut output| {
            let inputs = desc
                .inputs
                .iter()
                .map(|&i| context.tensor_view(i)?.to_array_view::<f32>())
                .collect::<TractResult<TVec<_>>>()?;
            reduce::add_n(&inputs, output.to_array_view_mut::<f32>()?)
        }),
        OperatorKind::ArgMax | OperatorKind::ArgMin => {
            let axis = reduction_axis(desc, context)?;
            let max = desc.kind == OperatorKind::ArgMax;
            context.with_view_mut(desc.output(), |context, mut output| {
                let input = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
                match output.datum_type() {
                    DatumType::I32 => {
                        reduce::arg_min_max(input, axis, max, output.to_array_view_mut::<i32>()?)
                    }
                    _ => reduce::arg_min_max(input, axis, max, output.to_array_view_mut::<i64>()?),
                }
            })
        }
        OperatorKind::AveragePool2d | OperatorKind::MaxPool2d => {
            let geometry = desc.pool_geometry()?;
            context.with_view_mut(desc.output(), |context, mut output| {
                let input = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
                let output = output.to_array_view_mut::<f32>()?;
                if desc.kind == OperatorKind::AveragePool2d {
                    average_pool(&geometry, range, input, output)
                } else {
                    max_pool(&geometry, range, input, output)
                }
            })
        }
        OperatorKind::BatchMatMul => {
            let (adj_x, adj_y) = desc.adjoints()?;
            if adj_x || !adj_y {
                bail!(EvalError(format!(
                    "BatchMatMul only runs with adj_x=false and adj_y=true, got {adj_x} and {adj_y}"
                )))
            }
            context.with_view_mut(desc.output(), |context, mut output| {
                let a = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
                let b = context.tensor_view(desc.inputs[1])?.to_array_view::<f32>()?;
                matmul::batch_matmul(a, b, false, true, output.to_array_view_mut::<f32>()?)
            })
        }
        OperatorKind::BatchToSpaceNd => {
            let (block, crops) = batch_to_space_params(desc, context)?;
            context.with_view_mut(desc.output(), |context, mut output| {
                let input = context.tensor_view(desc.inputs[0])?.to_array_view::<f32>()?;
                space::batch_to_space_nd(input, &block, &crops, output.to_array_view_mut::<f32>()?)
            })
        }
    }
}

/// Evaluate one descriptor: check element types, then run its kernel.
pub fn evaluate_one(desc: &NodeDescriptor, context: &mut Context) -> TractResult<()> {
    check_type(desc, "input", context.datum_type(desc.primary_input())?, desc.kind.input_types())?;
    let output_dt = context.datum_type(desc.output())?;
    check_type(desc, "output", output_dt, desc.kind.output_types())?;
    if matches!(desc.kind, OperatorKind::ArgMax | OperatorKind::ArgMin) {
        check_declared_output(desc, output_dt)?;
    }
    trace!("Evaluating {} into tensor {}", desc.kind, desc.output());
    // bare kernel failures become EvalError, delegate failures keep their kind
    run(desc, context).map_err(|e| {
        if SubstitutionError::find(&e).is_some() {
            e
        } else {
            e.context(EvalError(format!("{} into tensor {}", desc.kind, desc.output())))
        }
    })
}

/// Evaluate the region descriptors in order. On failure, outputs of the
/// descriptors already evaluated keep their new values.
pub fn evaluate(region: &SubstitutedRegion, context: &mut Context) -> TractResult<()> {
    for desc in region.iter() {
        evaluate_one(desc, context)?;
    }
    Ok(())
}
