//! Graph description: tensors, nodes and their builtin parameters.
use crate::internal::*;
use std::fmt;
use tract_delegate_linalg::pool::PoolGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinOperator {
    Abs,
    Add,
    AddN,
    ArgMax,
    ArgMin,
    Atan2,
    AveragePool2d,
    BatchMatMul,
    BatchToSpaceNd,
    MaxPool2d,
    Mul,
    Relu,
    Sub,
}

impl fmt::Display for BuiltinOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Parameters of 2D pooling operators. Spatial values are `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct Pool2dOptions {
    pub padding: Padding,
    pub strides: [usize; 2],
    pub filter: [usize; 2],
    pub activation: FusedActivation,
}

impl Pool2dOptions {
    pub fn geometry(&self) -> PoolGeometry {
        PoolGeometry::new(self.filter, self.strides, self.padding)
    }
}

impl Default for Pool2dOptions {
    fn default() -> Pool2dOptions {
        Pool2dOptions::new(Padding::Valid, [1, 1], [1, 1], FusedActivation::None)
    }
}

/// Per-node parameter block. A node may carry none, in which case every
/// parameter takes its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOptions {
    Add { activation: FusedActivation },
    Mul { activation: FusedActivation },
    Sub { activation: FusedActivation },
    Pool2d(Pool2dOptions),
    BatchMatMul { adj_x: bool, adj_y: bool },
    ArgMax { output_type: DatumType },
    ArgMin { output_type: DatumType },
}

impl BuiltinOptions {
    pub fn activation(&self) -> Option<FusedActivation> {
        match self {
            BuiltinOptions::Add { activation }
            | BuiltinOptions::Mul { activation }
            | BuiltinOptions::Sub { activation } => Some(*activation),
            BuiltinOptions::Pool2d(pool) => Some(pool.activation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub name: String,
    pub op: BuiltinOperator,
    pub options: Option<BuiltinOptions>,
    pub inputs: TVec<usize>,
    pub outputs: TVec<usize>,
}

#[derive(Debug, Clone)]
pub struct TensorDecl {
    pub name: String,
    pub tensor: Tensor,
    pub constant: bool,
}

/// Tensors and nodes of a model. Tensors are referred to by their index in
/// the tensor table, nodes by their index in the node list, which is also
/// their execution order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub tensors: Vec<TensorDecl>,
    pub nodes: Vec<Node>,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
}

impl Graph {
    /// Declare a tensor computed by a node. Its shape will be set when the
    /// producing node is prepared.
    pub fn add_tensor(&mut self, name: impl Into<String>, dt: DatumType) -> usize {
        self.tensors.push(TensorDecl {
            name: name.into(),
            tensor: Tensor::zero_dt(dt, &[0]),
            constant: false,
        });
        self.tensors.len() - 1
    }

    pub fn add_input(&mut self, name: impl Into<String>, dt: DatumType, shape: &[usize]) -> usize {
        let id = self.add_tensor(name, dt);
        self.tensors[id].tensor.resize(shape);
        self.inputs.push(id);
        id
    }

    pub fn add_const(&mut self, name: impl Into<String>, tensor: Tensor) -> usize {
        self.tensors.push(TensorDecl { name: name.into(), tensor, constant: true });
        self.tensors.len() - 1
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        op: BuiltinOperator,
        options: Option<BuiltinOptions>,
        inputs: &[usize],
        outputs: &[usize],
    ) -> TractResult<usize> {
        let name = name.into();
        for &t in inputs.iter().chain(outputs.iter()) {
            ensure!(t < self.tensors.len(), "Node {}: no tensor with id {}", name, t);
        }
        for &o in outputs {
            ensure!(!inputs.contains(&o), "Node {}: tensor {} is both input and output", name, o);
            ensure!(!self.tensors[o].constant, "Node {}: output tensor {} is a constant", name, o);
            if let Some(producer) = self.nodes.iter().find(|n| n.outputs.contains(&o)) {
                bail!("Node {}: tensor {} is already computed by {}", name, o, producer.name);
            }
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            name,
            op,
            options,
            inputs: inputs.into(),
            outputs: outputs.into(),
        });
        Ok(id)
    }

    pub fn set_output_outlets(&mut self, outputs: &[usize]) -> TractResult<()> {
        for &o in outputs {
            ensure!(o < self.tensors.len(), "No tensor with id {}", o);
        }
        self.outputs = outputs.to_vec();
        Ok(())
    }

    pub fn node(&self, id: usize) -> TractResult<&Node> {
        self.nodes.get(id).with_context(|| format!("No node with id {id}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_and_check() {
        let mut g = Graph::default();
        let a = g.add_input("a", DatumType::F32, &[2]);
        let b = g.add_const("b", tensor1(&[1f32, 2.]));
        let c = g.add_tensor("c", DatumType::F32);
        g.add_node("add", BuiltinOperator::Add, None, &[a, b], &[c]).unwrap();
        g.set_output_outlets(&[c]).unwrap();
        assert_eq!(g.nodes.len(), 1);
        assert_eq!(g.inputs, vec![a]);
        assert_eq!(g.tensors[a].tensor.shape(), &[2]);
    }

    #[test]
    fn reject_bad_wiring() {
        let mut g = Graph::default();
        let a = g.add_input("a", DatumType::F32, &[2]);
        let b = g.add_const("b", tensor1(&[1f32, 2.]));
        let c = g.add_tensor("c", DatumType::F32);
        assert!(g.add_node("bad", BuiltinOperator::Abs, None, &[a], &[7]).is_err());
        assert!(g.add_node("const", BuiltinOperator::Abs, None, &[a], &[b]).is_err());
        assert!(g.add_node("loop", BuiltinOperator::Abs, None, &[c], &[c]).is_err());
        g.add_node("abs", BuiltinOperator::Abs, None, &[a], &[c]).unwrap();
        assert!(g.add_node("twice", BuiltinOperator::Abs, None, &[a], &[c]).is_err());
    }

    #[test]
    fn options_activation() {
        let pool = Pool2dOptions { activation: FusedActivation::Relu6, ..Default::default() };
        assert_eq!(BuiltinOptions::Pool2d(pool).activation(), Some(FusedActivation::Relu6));
        assert_eq!(BuiltinOptions::BatchMatMul { adj_x: false, adj_y: true }.activation(), None);
    }
}
