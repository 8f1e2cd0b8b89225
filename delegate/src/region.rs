use crate::internal::*;
use itertools::Itertools;

/// The nodes a delegate kernel took over, as self-contained descriptors.
///
/// Descriptors are evaluated in the order of the host nodes they come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutedRegion {
    pub descriptors: Vec<NodeDescriptor>,
    /// Host node ids, for diagnostics only.
    pub host_nodes: TVec<usize>,
}

impl SubstitutedRegion {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.descriptors.iter()
    }
}

/// Record the nodes of a partition. Fails with `MalformedGraph` if one of
/// them does not match its operator arity or parameters.
pub fn capture(context: &Context, nodes: &[usize]) -> TractResult<SubstitutedRegion> {
    let mut descriptors = Vec::with_capacity(nodes.len());
    for &id in nodes {
        let node = context
            .node(id)
            .map_err(|e| MalformedGraph(format!("Capturing node {id}: {e}")))?;
        let descriptor = NodeDescriptor::capture(node)?;
        trace!("Captured node {} ({}) as {:?}", id, node.name, descriptor);
        descriptors.push(descriptor);
    }
    debug!("Captured region of {} node(s): {}", descriptors.len(), nodes.iter().join(", "));
    Ok(SubstitutedRegion { descriptors, host_nodes: nodes.into() })
}
