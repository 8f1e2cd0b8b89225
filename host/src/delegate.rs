//! Hooks through which a delegate takes over parts of a graph.
use crate::internal::*;
use std::fmt::Debug;

/// How the host may group delegated nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct PartitionOptions {
    /// Upper bound on the number of partitions handed to the delegate,
    /// unbounded if `None`.
    pub max_delegated_partitions: Option<usize>,
    /// Runs of supported nodes shorter than this stay on the host.
    pub min_nodes_per_partition: usize,
}

impl Default for PartitionOptions {
    fn default() -> PartitionOptions {
        PartitionOptions::new(None, 1)
    }
}

pub trait Delegate: Debug {
    fn name(&self) -> &'static str;

    /// Whether the delegate can run node `node`. Must not have side effects
    /// and must give the same answer for the same graph.
    fn is_node_supported(&self, context: &Context, node: usize) -> bool;

    fn options(&self) -> PartitionOptions {
        PartitionOptions::default()
    }

    /// A fresh kernel, called once per partition.
    fn create_kernel(&self) -> Box<dyn DelegateKernel>;
}

/// Runs one partition. The host calls `init` once, `prepare` after every
/// change of input shapes, and `eval` for every inference.
pub trait DelegateKernel: Debug + Send {
    fn init(&mut self, context: &Context, nodes: &[usize]) -> TractResult<()>;
    fn prepare(&self, context: &mut Context) -> TractResult<()>;
    fn eval(&self, context: &mut Context) -> TractResult<()>;
}
