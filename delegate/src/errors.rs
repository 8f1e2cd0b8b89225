//! Failure kinds of the delegate.
//!
//! Every fallible function returns a `TractResult`. When the failure is
//! one of the delegate's own, a `SubstitutionError` sits in the error chain,
//! either as the error itself or as a context layer.
use tract_delegate_data::anyhow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstitutionError {
    /// A node does not match the arity or parameters of its operator.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    /// An element type outside of what the operator supports.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Output shape can not be computed, or the host refused it.
    #[error("Shape error: {0}")]
    ShapeError(String),
    /// A kernel precondition failed during evaluation.
    #[error("Evaluation error: {0}")]
    EvalError(String),
}

impl SubstitutionError {
    /// Find the outermost delegate failure in an error chain.
    pub fn find(error: &anyhow::Error) -> Option<&SubstitutionError> {
        error
            .downcast_ref::<SubstitutionError>()
            .or_else(|| error.chain().find_map(|e| e.downcast_ref::<SubstitutionError>()))
    }
}
