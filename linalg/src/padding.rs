//! Output size and padding computation for windowed operators.
use tract_delegate_data::internal::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Padding {
    /// Pad so that output size is `ceil(input / stride)`.
    Same,
    /// No padding, windows must fit entirely in the input.
    #[default]
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct ComputedPaddedDim {
    pub input: usize,
    pub output: usize,
    pub pad_before: usize,
    pub pad_after: usize,
}

impl Padding {
    pub fn compute(
        &self,
        input_spatial_shape: &[usize],
        kernel_spatial_shape: &[usize],
        dilations: &[usize],
        strides: &[usize],
    ) -> TractResult<TVec<ComputedPaddedDim>> {
        ensure!(
            input_spatial_shape.len() == kernel_spatial_shape.len()
                && dilations.len() == kernel_spatial_shape.len()
                && strides.len() == kernel_spatial_shape.len(),
            "Inconsistent geometry rank"
        );
        (0..input_spatial_shape.len())
            .map(|d| {
                self.compute_one(
                    input_spatial_shape[d],
                    kernel_spatial_shape[d],
                    dilations[d],
                    strides[d],
                )
            })
            .collect()
    }

    pub fn compute_one(
        &self,
        input: usize,
        kernel: usize,
        dilation: usize,
        stride: usize,
    ) -> TractResult<ComputedPaddedDim> {
        ensure!(stride > 0, "Stride must be positive");
        ensure!(kernel > 0 && dilation > 0, "Kernel size and dilation must be positive");
        let kernel_field = (kernel - 1) * dilation + 1;
        let output = self.out_size(input, kernel_field, stride);
        let total = if output == 0 {
            0
        } else {
            ((output - 1) * stride + kernel_field).saturating_sub(input)
        };
        let pad_before = total / 2;
        Ok(ComputedPaddedDim::new(input, output, pad_before, total - pad_before))
    }

    fn out_size(&self, input: usize, kernel_field: usize, stride: usize) -> usize {
        match self {
            Padding::Same => input.div_ceil(stride),
            Padding::Valid => (input + stride).saturating_sub(kernel_field) / stride,
        }
    }
}
