use crate::internal::*;
use crate::model::TensorDecl;

/// What kernels, builtin or delegated, get to see of the graph: node
/// descriptions, tensors, and a way to resize tensors.
#[derive(Debug, Clone)]
pub struct Context {
    graph: Graph,
}

impl Context {
    pub fn new(graph: Graph) -> Context {
        Context { graph }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, id: usize) -> TractResult<&Node> {
        self.graph.node(id)
    }

    fn decl(&self, id: usize) -> TractResult<&TensorDecl> {
        self.graph.tensors.get(id).with_context(|| format!("No tensor with id {id}"))
    }

    pub fn tensor(&self, id: usize) -> TractResult<&Tensor> {
        Ok(&self.decl(id)?.tensor)
    }

    pub fn tensor_view(&self, id: usize) -> TractResult<TensorView<'_>> {
        Ok(self.tensor(id)?.view())
    }

    pub fn tensor_mut(&mut self, id: usize) -> TractResult<&mut Tensor> {
        let decl =
            self.graph.tensors.get_mut(id).with_context(|| format!("No tensor with id {id}"))?;
        ensure!(!decl.constant, "Tensor {} ({}) is constant", id, decl.name);
        Ok(&mut decl.tensor)
    }

    pub fn tensor_name(&self, id: usize) -> TractResult<&str> {
        Ok(&self.decl(id)?.name)
    }

    pub fn datum_type(&self, id: usize) -> TractResult<DatumType> {
        Ok(self.tensor(id)?.datum_type())
    }

    pub fn shape(&self, id: usize) -> TractResult<&[usize]> {
        Ok(self.tensor(id)?.shape())
    }

    /// Resize callback: give a tensor a new shape. Storage is reallocated
    /// only if the number of values changes. Constants can not be resized.
    pub fn resize_tensor(&mut self, id: usize, shape: &[usize]) -> TractResult<()> {
        let tensor = self.tensor_mut(id)?;
        if tensor.shape() != shape {
            trace!("Resizing tensor {} from {:?} to {:?}", id, tensor.shape(), shape);
            tensor.resize(shape);
        }
        Ok(())
    }

    /// Run `f` with mutable access to tensor `id` and shared access to the
    /// rest of the context. Inside `f`, the context sees tensor `id` as an
    /// empty placeholder.
    pub fn with_tensor_mut<R>(
        &mut self,
        id: usize,
        f: impl FnOnce(&Context, &mut Tensor) -> TractResult<R>,
    ) -> TractResult<R> {
        let placeholder = Tensor::zero_dt(self.datum_type(id)?, &[0]);
        let mut tensor = std::mem::replace(self.tensor_mut(id)?, placeholder);
        let result = f(self, &mut tensor);
        self.graph.tensors[id].tensor = tensor;
        result
    }

    /// Same as [`Context::with_tensor_mut`], through a view that can not
    /// change the tensor shape.
    pub fn with_view_mut<R>(
        &mut self,
        id: usize,
        f: impl FnOnce(&Context, TensorViewMut) -> TractResult<R>,
    ) -> TractResult<R> {
        self.with_tensor_mut(id, |context, tensor| f(context, tensor.view_mut()))
    }
}
