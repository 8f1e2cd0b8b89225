#[macro_use]
mod macros;

/// A Smallvec instantiation with 4 embeddable values.
///
/// Used about everywhere, for node inputs and outputs, or tensor dimensions.
pub type TVec<T> = smallvec::SmallVec<[T; 4]>;

/// Result type used across the delegate crates.
pub type TractResult<T> = anyhow::Result<T>;

pub mod prelude {
    pub use crate::datum::{Datum, DatumType};
    pub use crate::tensor::litteral::*;
    pub use crate::tensor::Tensor;
    pub use crate::tvec;
    pub use crate::TVec;
    pub use crate::TractResult;
    pub use crate::{dispatch_datum, dispatch_floatlike, dispatch_numbers};
    pub use half::f16;
}

pub mod internal {
    pub use crate::prelude::*;
    pub use crate::tensor::view::{TensorView, TensorViewMut};
    pub use anyhow::{self, bail, ensure, format_err, Context as _};
    pub use ndarray as tract_ndarray;
    pub use smallvec as tract_smallvec;
}

pub use anyhow;
pub use half;
pub use ndarray;

mod datum;
mod tensor;
