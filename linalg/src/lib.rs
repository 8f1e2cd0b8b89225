//! Reference kernels.
//!
//! Every kernel reads ndarray views and writes into a caller-provided output
//! view. Kernels never allocate output storage: the shape of the output is
//! decided beforehand by whoever owns it, and kernels only check it is
//! consistent with their inputs.
#[macro_use]
extern crate derive_new;

pub mod activation;
pub mod broadcast;
pub mod element_wise;
pub mod matmul;
pub mod padding;
pub mod pool;
pub mod reduce;
pub mod space;

pub use activation::{ActivationRange, FusedActivation};
pub use padding::Padding;

use num_traits::Float;

pub(crate) fn cst<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}
