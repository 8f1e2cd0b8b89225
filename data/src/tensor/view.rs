use crate::datum::{Datum, DatumType};
use crate::tensor::Tensor;
use ndarray::prelude::*;

/// Non-owning, read-only access to a tensor owned by someone else.
#[derive(Clone, Copy)]
pub struct TensorView<'a> {
    tensor: &'a Tensor,
}

impl<'a> TensorView<'a> {
    pub fn new(tensor: &'a Tensor) -> TensorView<'a> {
        TensorView { tensor }
    }

    pub fn datum_type(&self) -> DatumType {
        self.tensor.datum_type()
    }

    pub fn to_array_view<D: Datum>(&self) -> anyhow::Result<ArrayViewD<'a, D>> {
        self.tensor.to_array_view::<D>()
    }
}

impl std::fmt::Debug for TensorView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "View({:?})", self.tensor)
    }
}

/// Non-owning, mutable access to a tensor owned by someone else. Neither
/// the shape nor the datum type can be changed through it.
pub struct TensorViewMut<'a> {
    tensor: &'a mut Tensor,
}

impl<'a> TensorViewMut<'a> {
    pub fn new(tensor: &'a mut Tensor) -> TensorViewMut<'a> {
        TensorViewMut { tensor }
    }

    pub fn datum_type(&self) -> DatumType {
        self.tensor.datum_type()
    }

    pub fn to_array_view_mut<D: Datum>(&mut self) -> anyhow::Result<ArrayViewMutD<'_, D>> {
        self.tensor.to_array_view_mut::<D>()
    }
}

impl std::fmt::Debug for TensorViewMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ViewMut({:?})", self.tensor)
    }
}
