//! N-ary sum and arg-extremum reductions.
use num_traits::{Float, NumCast};
use tract_delegate_data::internal::*;
use tract_ndarray::{ArrayViewD, ArrayViewMutD, Axis, Zip};

/// Sum all inputs, which must all have the output shape. Values are
/// accumulated in input order.
pub fn add_n<T: Datum + Float>(
    inputs: &[ArrayViewD<T>],
    mut output: ArrayViewMutD<T>,
) -> TractResult<()> {
    let Some((first, others)) = inputs.split_first() else {
        bail!("AddN needs at least one input")
    };
    for input in inputs {
        ensure!(
            input.shape() == output.shape(),
            "AddN input shape {:?} does not match output shape {:?}",
            input.shape(),
            output.shape()
        );
    }
    output.assign(first);
    for input in others {
        Zip::from(&mut output).and(input).for_each(|o, i| *o = *o + *i);
    }
    Ok(())
}

/// Index of the first extremum along `axis`. The output is the input shape
/// with `axis` removed.
pub fn arg_min_max<T, I>(
    input: ArrayViewD<T>,
    axis: usize,
    max: bool,
    mut output: ArrayViewMutD<I>,
) -> TractResult<()>
where
    T: Datum + PartialOrd,
    I: Datum + NumCast,
{
    ensure!(axis < input.ndim(), "Axis {} out of range for rank {}", axis, input.ndim());
    ensure!(input.shape()[axis] > 0, "Can not reduce empty axis {}", axis);
    let mut expected = input.shape().to_vec();
    expected.remove(axis);
    ensure!(
        output.shape() == &*expected,
        "ArgMinMax output shape {:?}, expected {:?}",
        output.shape(),
        expected
    );
    let better: fn(&T, &T) -> bool = if max { |a, b| a > b } else { |a, b| a < b };
    let indices = input.map_axis(Axis(axis), |lane| {
        let mut best = 0;
        for (ix, v) in lane.iter().enumerate().skip(1) {
            if better(v, &lane[best]) {
                best = ix;
            }
        }
        best
    });
    for (o, i) in output.iter_mut().zip(indices.iter()) {
        *o = <I as NumCast>::from(*i)
            .with_context(|| format!("Index {} overflows {:?}", i, I::datum_type()))?;
    }
    Ok(())
}
