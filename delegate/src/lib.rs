//! Operator-substitution delegate.
//!
//! The delegate inspects the nodes of a host graph, takes over the ones it
//! supports, and runs them on its own kernels. Its life cycle follows the
//! host's:
//!
//! * [`is_supported`] decides, node by node, what the delegate takes,
//! * [`capture`] records the taken nodes once, when the host activates a
//!   partition,
//! * [`infer_and_resize`] shapes the outputs whenever the inputs may have
//!   changed shape,
//! * [`evaluate`] computes the outputs, once per inference.
//!
//! [`SubstitutionDelegate`] packages these for the host `Delegate` trait.
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate log;

pub mod catalog;
pub mod delegate;
pub mod descriptor;
pub mod errors;
pub mod eval;
pub mod region;
pub mod shape;
pub mod support;

pub use catalog::OperatorKind;
pub use delegate::{SubstitutionDelegate, SubstitutionKernel, SubstitutionOptions, DELEGATE_NAME};
pub use descriptor::{NodeDescriptor, StructuralParams};
pub use errors::SubstitutionError;
pub use eval::evaluate;
pub use region::{capture, SubstitutedRegion};
pub use shape::infer_and_resize;
pub use support::is_supported;

pub use tract_delegate_host;

pub mod prelude {
    pub use crate::catalog::OperatorKind;
    pub use crate::delegate::{SubstitutionDelegate, SubstitutionOptions, DELEGATE_NAME};
    pub use crate::errors::SubstitutionError;
    pub use tract_delegate_host::prelude::*;
}

pub mod internal {
    pub use crate::errors::SubstitutionError::{self, *};
    pub use crate::prelude::*;
    pub use crate::{NodeDescriptor, StructuralParams, SubstitutedRegion};
    pub use tract_delegate_host::internal::*;
}

#[cfg(test)]
pub(crate) fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TRACT_LOG").try_init();
}
