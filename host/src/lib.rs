//! A small graph executor able to hand parts of its graph over to
//! delegates.
//!
//! The executor owns every tensor of the graph. Nodes run in insertion
//! order, either through the builtin registry or, once a delegate has been
//! applied, through the kernel the delegate created for the partition they
//! belong to.
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate log;

pub mod context;
pub mod delegate;
pub mod interpreter;
pub mod model;
pub mod ops;

pub use tract_delegate_data;
pub use tract_delegate_linalg;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::delegate::{Delegate, DelegateKernel, PartitionOptions};
    pub use crate::interpreter::{Interpreter, Step};
    pub use crate::model::{BuiltinOperator, BuiltinOptions, Graph, Node, Pool2dOptions};
    pub use tract_delegate_data::prelude::*;
    pub use tract_delegate_linalg::{FusedActivation, Padding};
}

pub mod internal {
    pub use crate::prelude::*;
    pub use tract_delegate_data::internal::*;
}

#[cfg(test)]
pub(crate) fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TRACT_LOG").try_init();
}
