//! Builtin implementations of the host operators.
use crate::internal::*;
use std::collections::HashMap;

pub mod array;
pub mod cnn;
pub mod element_wise;
pub mod math;
pub mod nn;

/// Shape the node outputs from its inputs, resizing them through the
/// context.
pub type PrepareFn = fn(&mut Context, &Node) -> TractResult<()>;
/// Compute the node outputs. Output shapes are those set by prepare.
pub type EvalFn = fn(&mut Context, &Node) -> TractResult<()>;

#[derive(Clone, Copy, new)]
pub struct BuiltinKernel {
    pub prepare: PrepareFn,
    pub eval: EvalFn,
}

impl std::fmt::Debug for BuiltinKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BuiltinKernel")
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    pub builtins: HashMap<BuiltinOperator, BuiltinKernel>,
}

impl Registry {
    pub fn with_all_builtins() -> Registry {
        let mut reg = Registry::default();
        array::register_all(&mut reg);
        cnn::register_all(&mut reg);
        element_wise::register_all(&mut reg);
        math::register_all(&mut reg);
        nn::register_all(&mut reg);
        reg
    }

    pub fn register(&mut self, op: BuiltinOperator, prepare: PrepareFn, eval: EvalFn) {
        self.builtins.insert(op, BuiltinKernel::new(prepare, eval));
    }

    fn kernel(&self, op: BuiltinOperator) -> TractResult<BuiltinKernel> {
        self.builtins.get(&op).copied().with_context(|| format!("No builtin for operator {op}"))
    }

    pub fn prepare(&self, context: &mut Context, node: usize) -> TractResult<()> {
        let node = context.node(node)?.clone();
        let kernel = self.kernel(node.op)?;
        (kernel.prepare)(context, &node).with_context(|| format!("Preparing {}", node.name))
    }

    pub fn eval(&self, context: &mut Context, node: usize) -> TractResult<()> {
        let node = context.node(node)?.clone();
        let kernel = self.kernel(node.op)?;
        (kernel.eval)(context, &node).with_context(|| format!("Evaluating {}", node.name))
    }
}

pub(crate) fn check_arity(node: &Node, inputs: usize, outputs: usize) -> TractResult<()> {
    ensure!(
        node.inputs.len() == inputs && node.outputs.len() == outputs,
        "{} expects {} inputs and {} outputs, got {} and {}",
        node.op,
        inputs,
        outputs,
        node.inputs.len(),
        node.outputs.len()
    );
    Ok(())
}

/// Check the output type matches the first input type, and return it.
pub(crate) fn same_type_as_input(context: &Context, node: &Node) -> TractResult<DatumType> {
    let input = context.datum_type(node.inputs[0])?;
    let output = context.datum_type(node.outputs[0])?;
    ensure!(
        input == output,
        "{} output type {:?} differs from input type {:?}",
        node.op,
        output,
        input
    );
    Ok(input)
}

/// Prepare a node whose single output has the shape of its first input.
pub(crate) fn prepare_same_shape(context: &mut Context, node: &Node) -> TractResult<()> {
    check_arity(node, 1, 1)?;
    same_type_as_input(context, node)?;
    let shape: TVec<usize> = context.shape(node.inputs[0])?.into();
    context.resize_tensor(node.outputs[0], &shape)
}

/// Read a small integer parameter tensor (axis, block shape, crops).
pub(crate) fn read_ints(context: &Context, id: usize) -> TractResult<TVec<i64>> {
    let name = context.tensor_name(id)?;
    context.tensor(id)?.to_i64s().with_context(|| format!("Reading integer parameters from {name}"))
}
