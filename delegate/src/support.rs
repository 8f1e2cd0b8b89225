use crate::internal::*;

/// Why a node stays on the host.
fn rejection(context: &Context, node: usize, options: &SubstitutionOptions) -> Option<String> {
    let Ok(node) = context.node(node) else {
        return Some("no such node".to_string());
    };
    let Some(kind) = OperatorKind::from_builtin(node.op) else {
        return Some(format!("{} is not in the catalog", node.op));
    };
    if !options.enables(kind) {
        return Some(format!("{kind} is not enabled"));
    }
    if !kind.input_arity().accepts(node.inputs.len()) || node.outputs.len() != kind.output_arity()
    {
        return Some(format!("{kind} arity mismatch"));
    }
    let dt = match context.datum_type(node.inputs[0]) {
        Ok(dt) => dt,
        Err(e) => return Some(format!("{e}")),
    };
    if !kind.input_types().contains(&dt) {
        return Some(format!("{kind} does not support {dt:?} input"));
    }
    if kind == OperatorKind::BatchMatMul {
        let adjoints = match node.options {
            Some(BuiltinOptions::BatchMatMul { adj_x, adj_y }) => (adj_x, adj_y),
            _ => (false, false),
        };
        if adjoints != (false, true) {
            return Some(format!("BatchMatMul only runs with adj_y, got {adjoints:?}"));
        }
    }
    None
}

/// Whether the delegate takes node `node`.
///
/// Pure: only looks at the node operator, parameters, arity and primary
/// input type, never at tensor contents.
pub fn is_supported(context: &Context, node: usize, options: &SubstitutionOptions) -> bool {
    match rejection(context, node, options) {
        None => true,
        Some(reason) => {
            trace!("Node {} stays on host: {}", node, reason);
            false
        }
    }
}
