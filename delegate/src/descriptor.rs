use crate::internal::*;
use tract_delegate_linalg::pool::PoolGeometry;

/// Operator parameters, decoded from the host parameter block once and for
/// all at capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralParams {
    None,
    Pool2d { filter: [usize; 2], strides: [usize; 2], padding: Padding },
    BatchMatMul { adj_x: bool, adj_y: bool },
    /// Index type declared by the node, if it carries options.
    ArgMinMax { output_type: Option<DatumType> },
}

impl StructuralParams {
    /// Parameters of a node with no parameter block.
    pub fn default_for(kind: OperatorKind) -> StructuralParams {
        match kind {
            OperatorKind::AveragePool2d | OperatorKind::MaxPool2d => {
                let defaults = Pool2dOptions::default();
                StructuralParams::Pool2d {
                    filter: defaults.filter,
                    strides: defaults.strides,
                    padding: defaults.padding,
                }
            }
            OperatorKind::BatchMatMul => {
                StructuralParams::BatchMatMul { adj_x: false, adj_y: false }
            }
            OperatorKind::ArgMax | OperatorKind::ArgMin => {
                StructuralParams::ArgMinMax { output_type: None }
            }
            _ => StructuralParams::None,
        }
    }
}

/// Everything the delegate needs to run one node, independent from the
/// host node it was captured from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct NodeDescriptor {
    pub kind: OperatorKind,
    pub activation: FusedActivation,
    pub params: StructuralParams,
    pub inputs: TVec<usize>,
    pub outputs: TVec<usize>,
}

impl NodeDescriptor {
    /// Decode a host node. Tensor handles are copied, tensor contents are
    /// never looked at.
    pub fn capture(node: &Node) -> TractResult<NodeDescriptor> {
        let kind = OperatorKind::from_builtin(node.op).ok_or_else(|| {
            MalformedGraph(format!("{} ({}) is not a substitutable operator", node.name, node.op))
        })?;
        let arity = kind.input_arity();
        if !arity.accepts(node.inputs.len()) || node.outputs.len() != kind.output_arity() {
            bail!(MalformedGraph(format!(
                "{} ({}) expects {} input(s) and {} output(s), got {} and {}",
                node.name,
                kind,
                arity,
                kind.output_arity(),
                node.inputs.len(),
                node.outputs.len()
            )));
        }
        let (activation, params) = match (kind, node.options) {
            (_, None) => (FusedActivation::None, StructuralParams::default_for(kind)),
            (OperatorKind::Add, Some(BuiltinOptions::Add { activation }))
            | (OperatorKind::Mul, Some(BuiltinOptions::Mul { activation })) => {
                (activation, StructuralParams::None)
            }
            (
                OperatorKind::AveragePool2d | OperatorKind::MaxPool2d,
                Some(BuiltinOptions::Pool2d(pool)),
            ) => (
                pool.activation,
                StructuralParams::Pool2d {
                    filter: pool.filter,
                    strides: pool.strides,
                    padding: pool.padding,
                },
            ),
            (OperatorKind::BatchMatMul, Some(BuiltinOptions::BatchMatMul { adj_x, adj_y })) => {
                (FusedActivation::None, StructuralParams::BatchMatMul { adj_x, adj_y })
            }
            (OperatorKind::ArgMax, Some(BuiltinOptions::ArgMax { output_type }))
            | (OperatorKind::ArgMin, Some(BuiltinOptions::ArgMin { output_type })) => {
                let output_type = Some(output_type);
                (FusedActivation::None, StructuralParams::ArgMinMax { output_type })
            }
            (_, Some(options)) => bail!(MalformedGraph(format!(
                "{} ({}) carries parameters of another operator: {:?}",
                node.name, kind, options
            ))),
        };
        Ok(NodeDescriptor::new(kind, activation, params, node.inputs.clone(), node.outputs.clone()))
    }

    pub fn pool_geometry(&self) -> TractResult<PoolGeometry> {
        match self.params {
            StructuralParams::Pool2d { filter, strides, padding } => {
                Ok(PoolGeometry::new(filter, strides, padding))
            }
            _ => bail!(EvalError(format!("{} has no pooling parameters", self.kind))),
        }
    }

    /// `(adj_x, adj_y)` of a BatchMatMul.
    pub fn adjoints(&self) -> TractResult<(bool, bool)> {
        match self.params {
            StructuralParams::BatchMatMul { adj_x, adj_y } => Ok((adj_x, adj_y)),
            _ => bail!(EvalError(format!("{} has no adjoint flags", self.kind))),
        }
    }

    /// Index type an ArgMax or ArgMin node declares, if any.
    pub fn declared_output_type(&self) -> TractResult<Option<DatumType>> {
        match self.params {
            StructuralParams::ArgMinMax { output_type } => Ok(output_type),
            _ => bail!(EvalError(format!("{} has no declared output type", self.kind))),
        }
    }

    pub fn primary_input(&self) -> usize {
        self.inputs[0]
    }

    pub fn output(&self) -> usize {
        self.outputs[0]
    }
}
