//! Element-wise unary and broadcasting binary kernels.
use crate::activation::ActivationRange;
use num_traits::{Float, WrappingAdd, WrappingMul};
use tract_delegate_data::internal::*;
use tract_ndarray::{ArrayViewD, ArrayViewMutD, Zip};

fn unary<T: Datum, F: Fn(T) -> T>(
    input: ArrayViewD<T>,
    mut output: ArrayViewMutD<T>,
    f: F,
) -> TractResult<()> {
    ensure!(
        input.shape() == output.shape(),
        "Element-wise output shape {:?} does not match input {:?}",
        output.shape(),
        input.shape()
    );
    Zip::from(&mut output).and(&input).for_each(|o, i| *o = f(*i));
    Ok(())
}

pub fn abs<T: Datum + Float>(input: ArrayViewD<T>, output: ArrayViewMutD<T>) -> TractResult<()> {
    unary(input, output, |x| x.abs())
}

pub fn relu<T: Datum + Float>(input: ArrayViewD<T>, output: ArrayViewMutD<T>) -> TractResult<()> {
    unary(input, output, |x| x.max(T::zero()))
}

fn zip_broadcast<T: Datum, F: Fn(T, T) -> T>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    mut output: ArrayViewMutD<T>,
    f: F,
) -> TractResult<()> {
    let shape = output.shape().to_vec();
    let a = a.broadcast(&*shape).with_context(|| {
        format!("Can not broadcast {:?} to output shape {:?}", a.shape(), shape)
    })?;
    let b = b.broadcast(&*shape).with_context(|| {
        format!("Can not broadcast {:?} to output shape {:?}", b.shape(), shape)
    })?;
    Zip::from(&mut output).and(&a).and(&b).for_each(|o, a, b| *o = f(*a, *b));
    Ok(())
}

/// Apply `f` to pairs of values from `a` and `b`, both broadcast to the
/// output shape, then clamp the result to `range`.
pub fn binary<T: Datum + Float, F: Fn(T, T) -> T>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    range: ActivationRange<T>,
    output: ArrayViewMutD<T>,
    f: F,
) -> TractResult<()> {
    zip_broadcast(a, b, output, |a, b| range.clamp(f(a, b)))
}

/// Integer addition, wrapping on overflow.
pub fn add_wrapping<T: Datum + WrappingAdd>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    zip_broadcast(a, b, output, |a, b| a.wrapping_add(&b))
}

pub fn mul_wrapping<T: Datum + WrappingMul>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    zip_broadcast(a, b, output, |a, b| a.wrapping_mul(&b))
}

pub fn add<T: Datum + Float>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    range: ActivationRange<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    binary(a, b, range, output, |a, b| a + b)
}

pub fn sub<T: Datum + Float>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    range: ActivationRange<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    binary(a, b, range, output, |a, b| a - b)
}

pub fn mul<T: Datum + Float>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    range: ActivationRange<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    binary(a, b, range, output, |a, b| a * b)
}

/// Four-quadrant arctangent of `y / x`. No activation.
pub fn atan2<T: Datum + Float>(
    y: ArrayViewD<T>,
    x: ArrayViewD<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    binary(y, x, ActivationRange::full(), output, |y, x| y.atan2(x))
}
