//! `Tensor` is the main data container of the delegate crates.
use crate::datum::{Datum, DatumType};
use crate::TVec;
use half::f16;
use itertools::Itertools;
use ndarray::prelude::*;
use std::fmt;

pub mod litteral;
pub mod view;

#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
pub enum Storage {
    Bool(Vec<bool>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Storage {
    fn zeroed(dt: DatumType, len: usize) -> Storage {
        fn zeroed_t<T: Datum>(len: usize) -> Storage {
            T::into_storage(vec![T::default(); len])
        }
        dispatch_datum!(zeroed_t(dt)(len))
    }

    fn datum_type(&self) -> DatumType {
        match self {
            Storage::Bool(_) => DatumType::Bool,
            Storage::U8(_) => DatumType::U8,
            Storage::I8(_) => DatumType::I8,
            Storage::I32(_) => DatumType::I32,
            Storage::I64(_) => DatumType::I64,
            Storage::F16(_) => DatumType::F16,
            Storage::F32(_) => DatumType::F32,
            Storage::F64(_) => DatumType::F64,
        }
    }
}

/// Tensor is a concrete tensor. Its storage is owned by whoever holds it:
/// in the host, the tensor table of a graph.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    shape: TVec<usize>,
    storage: Storage,
}

impl Default for Tensor {
    fn default() -> Tensor {
        Tensor { shape: tvec!(), storage: Storage::F32(vec![0.0]) }
    }
}

impl Tensor {
    /// Create a tensor of the given type and shape, filled with zeroes.
    pub fn zero_dt(dt: DatumType, shape: &[usize]) -> Tensor {
        let len = shape.iter().product();
        Tensor { shape: shape.into(), storage: Storage::zeroed(dt, len) }
    }

    pub fn zero<T: Datum>(shape: &[usize]) -> Tensor {
        Self::zero_dt(T::datum_type(), shape)
    }

    /// Create a tensor from a shape and a flat, row-major, slice of data.
    pub fn from_shape<T: Datum>(shape: &[usize], data: &[T]) -> anyhow::Result<Tensor> {
        let len = shape.iter().product::<usize>();
        if len != data.len() {
            anyhow::bail!(
                "Shape {:?} expects {} elements, got {}",
                shape,
                len,
                data.len()
            );
        }
        Ok(Tensor { shape: shape.into(), storage: T::into_storage(data.to_vec()) })
    }

    /// Get the datum type of the tensor.
    #[inline]
    pub fn datum_type(&self) -> DatumType {
        self.storage.datum_type()
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of values in the tensor.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Give the tensor a new shape, reallocating its storage when the number
    /// of values changes. Values are zeroed in that case, preserved otherwise.
    pub fn resize(&mut self, shape: &[usize]) {
        let len = shape.iter().product::<usize>();
        if len != self.len() {
            self.storage = Storage::zeroed(self.datum_type(), len);
        }
        self.shape = shape.into();
    }

    fn check_for_access<D: Datum>(&self) -> anyhow::Result<()> {
        if self.datum_type() != D::datum_type() {
            anyhow::bail!(
                "Tensor datum type error: tensor is {:?}, accessed as {:?}",
                self.datum_type(),
                D::datum_type(),
            );
        }
        Ok(())
    }

    /// Access the data as a slice.
    pub fn as_slice<D: Datum>(&self) -> anyhow::Result<&[D]> {
        self.check_for_access::<D>()?;
        D::storage(&self.storage).ok_or_else(|| anyhow::format_err!("Inconsistent storage"))
    }

    /// Access the data as a mutable slice.
    pub fn as_slice_mut<D: Datum>(&mut self) -> anyhow::Result<&mut [D]> {
        self.check_for_access::<D>()?;
        D::storage_mut(&mut self.storage).ok_or_else(|| anyhow::format_err!("Inconsistent storage"))
    }

    /// Transform the data as a `ndarray::Array`.
    pub fn to_array_view<D: Datum>(&self) -> anyhow::Result<ArrayViewD<'_, D>> {
        let slice = self.as_slice::<D>()?;
        Ok(ArrayViewD::from_shape(&*self.shape, slice)?)
    }

    /// Transform the data as a mutable `ndarray::Array`.
    pub fn to_array_view_mut<D: Datum>(&mut self) -> anyhow::Result<ArrayViewMutD<'_, D>> {
        self.check_for_access::<D>()?;
        let Tensor { shape, storage } = self;
        let slice = D::storage_mut(storage)
            .ok_or_else(|| anyhow::format_err!("Inconsistent storage"))?;
        Ok(ArrayViewMutD::from_shape(&**shape, slice)?)
    }

    /// Read an integer tensor as a vector of i64, whatever its integer type.
    pub fn to_i64s(&self) -> anyhow::Result<TVec<i64>> {
        Ok(match &self.storage {
            Storage::U8(v) => v.iter().map(|x| *x as i64).collect(),
            Storage::I8(v) => v.iter().map(|x| *x as i64).collect(),
            Storage::I32(v) => v.iter().map(|x| *x as i64).collect(),
            Storage::I64(v) => v.iter().copied().collect(),
            _ => anyhow::bail!("Expected an integer tensor, got {:?}", self.datum_type()),
        })
    }

    /// Dump the tensor in a human readable form.
    ///
    /// `force_full` will force the tensor to be dump in full even if it is big.
    pub fn dump(&self, force_full: bool) -> String {
        fn dump_t<D: Datum>(tensor: &Tensor, n: usize) -> String {
            tensor.as_slice::<D>().map(|s| s[0..n].iter().join(", ")).unwrap_or_default()
        }
        let trunc = self.len() > 12 && !force_full;
        let n = if trunc { 12 } else { self.len() };
        let data = dispatch_datum!(dump_t(self.datum_type())(self, n));
        format!(
            "{},{:?} {}{}",
            self.shape.iter().join(","),
            self.datum_type(),
            data,
            if trunc { "..." } else { "" }
        )
    }

    pub fn view(&self) -> view::TensorView<'_> {
        view::TensorView::new(self)
    }

    pub fn view_mut(&mut self) -> view::TensorViewMut<'_> {
        view::TensorViewMut::new(self)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.dump(false))
    }
}

impl<D: ::ndarray::Dimension, T: Datum> From<Array<T, D>> for Tensor {
    fn from(it: Array<T, D>) -> Tensor {
        let shape: TVec<usize> = it.shape().into();
        let data: Vec<T> = it.iter().copied().collect();
        Tensor { shape, storage: T::into_storage(data) }
    }
}
