//! 2D pooling over NHWC tensors.
use crate::activation::ActivationRange;
use crate::padding::{ComputedPaddedDim, Padding};
use num_traits::{Float, NumCast};
use tract_delegate_data::internal::*;
use tract_ndarray::{s, ArrayView2, ArrayViewD, ArrayViewMutD, Axis, Ix4};

/// Window geometry of a 2D pooling operator. Spatial parameters are given
/// as `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct PoolGeometry {
    pub kernel: [usize; 2],
    pub strides: [usize; 2],
    pub padding: Padding,
}

impl PoolGeometry {
    pub fn compute(&self, input_shape: &[usize]) -> TractResult<TVec<ComputedPaddedDim>> {
        ensure!(input_shape.len() == 4, "Pooling expects a NHWC input, got {:?}", input_shape);
        self.padding.compute(&input_shape[1..3], &self.kernel, &[1, 1], &self.strides)
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> TractResult<TVec<usize>> {
        let dims = self.compute(input_shape)?;
        Ok(tvec!(input_shape[0], dims[0].output, dims[1].output, input_shape[3]))
    }

    /// Visit every output position with the input window it covers, one
    /// channel at a time. Windows are clipped to the input bounds.
    fn for_each_window<T: Datum>(
        &self,
        input: ArrayViewD<T>,
        output: ArrayViewMutD<T>,
        mut f: impl FnMut(ArrayView2<T>) -> TractResult<T>,
    ) -> TractResult<()> {
        let dims = self.compute(input.shape())?;
        let expected = self.output_shape(input.shape())?;
        ensure!(
            output.shape() == &*expected,
            "Pooling output shape {:?}, expected {:?}",
            output.shape(),
            expected
        );
        let input = input.into_dimensionality::<Ix4>()?;
        let mut output = output.into_dimensionality::<Ix4>()?;
        let (n, oh, ow, c) = output.dim();
        let (ih, iw) = (input.shape()[1] as isize, input.shape()[2] as isize);
        for b in 0..n {
            for oy in 0..oh {
                let y0 = (oy * self.strides[0]) as isize - dims[0].pad_before as isize;
                let ys = y0.max(0) as usize;
                let ye = (y0 + self.kernel[0] as isize).min(ih).max(0) as usize;
                for ox in 0..ow {
                    let x0 = (ox * self.strides[1]) as isize - dims[1].pad_before as isize;
                    let xs = x0.max(0) as usize;
                    let xe = (x0 + self.kernel[1] as isize).min(iw).max(0) as usize;
                    let window = input.slice(s![b, ys..ye.max(ys), xs..xe.max(xs), ..]);
                    for ch in 0..c {
                        output[(b, oy, ox, ch)] = f(window.index_axis(Axis(2), ch))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Average over the part of each window that overlaps the input, padding is
/// not counted.
pub fn average_pool<T: Datum + Float>(
    geo: &PoolGeometry,
    range: ActivationRange<T>,
    input: ArrayViewD<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    geo.for_each_window(input, output, |window| {
        ensure!(!window.is_empty(), "Empty pooling window");
        let count = <T as NumCast>::from(window.len()).context("Window size overflow")?;
        let total = window.iter().fold(T::zero(), |acc, x| acc + *x);
        Ok(range.clamp(total / count))
    })
}

pub fn max_pool<T: Datum + Float>(
    geo: &PoolGeometry,
    range: ActivationRange<T>,
    input: ArrayViewD<T>,
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    geo.for_each_window(input, output, |window| {
        ensure!(!window.is_empty(), "Empty pooling window");
        let max = window.iter().fold(T::min_value(), |acc, x| acc.max(*x));
        Ok(range.clamp(max))
    })
}
