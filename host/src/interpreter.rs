use crate::internal::*;
use crate::ops::Registry;
use itertools::Itertools;

/// A run of nodes handed over to a delegate kernel.
#[derive(Debug)]
pub struct DelegatedPartition {
    pub delegate: &'static str,
    pub nodes: TVec<usize>,
    /// Tensors read by the partition and computed outside of it.
    pub inputs: TVec<usize>,
    /// Tensors computed by the partition and needed outside of it.
    pub outputs: TVec<usize>,
    pub kernel: Box<dyn DelegateKernel>,
}

#[derive(Debug)]
pub enum Step {
    Builtin(usize),
    Delegated(DelegatedPartition),
}

/// Runs a graph, one plan step after the other.
///
/// The plan starts with one builtin step per node. Applying a delegate
/// replaces runs of consecutive nodes it supports by a single delegated
/// step.
#[derive(Debug)]
pub struct Interpreter {
    context: Context,
    registry: Registry,
    plan: Vec<Step>,
    allocated: bool,
}

impl Interpreter {
    pub fn new(graph: Graph) -> Interpreter {
        Self::with_registry(graph, Registry::with_all_builtins())
    }

    pub fn with_registry(graph: Graph, registry: Registry) -> Interpreter {
        let plan = (0..graph.nodes.len()).map(Step::Builtin).collect();
        Interpreter { context: Context::new(graph), registry, plan, allocated: false }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn execution_plan(&self) -> &[Step] {
        &self.plan
    }

    /// Operator name of a builtin step, delegate name of a delegated one.
    pub fn step_name(&self, step: usize) -> TractResult<String> {
        match self.plan.get(step).with_context(|| format!("No step {step} in plan"))? {
            Step::Builtin(node) => Ok(self.context.node(*node)?.op.to_string()),
            Step::Delegated(partition) => Ok(partition.delegate.to_string()),
        }
    }

    fn partition_boundaries(&self, nodes: &[usize]) -> (TVec<usize>, TVec<usize>) {
        let graph = self.context.graph();
        let produced: TVec<usize> =
            nodes.iter().flat_map(|&n| graph.nodes[n].outputs.iter().copied()).collect();
        let inputs = nodes
            .iter()
            .flat_map(|&n| graph.nodes[n].inputs.iter().copied())
            .filter(|t| !produced.contains(t))
            .unique()
            .collect();
        let outputs = produced
            .iter()
            .copied()
            .filter(|t| {
                graph.outputs.contains(t)
                    || graph.nodes.iter().any(|n| !nodes.contains(&n.id) && n.inputs.contains(t))
            })
            .collect();
        (inputs, outputs)
    }

    /// Hand runs of consecutive nodes supported by `delegate` over to
    /// kernels it creates. On error the plan is left untouched.
    pub fn modify_graph_with_delegate(&mut self, delegate: &dyn Delegate) -> TractResult<()> {
        let options = delegate.options();
        let mut runs: Vec<(usize, usize)> = vec![];
        let mut start: Option<usize> = None;
        for (ix, step) in self.plan.iter().enumerate() {
            let supported = matches!(step, Step::Builtin(node)
                if delegate.is_node_supported(&self.context, *node));
            match (supported, start) {
                (true, None) => start = Some(ix),
                (false, Some(s)) => {
                    runs.push((s, ix));
                    start = None;
                }
                _ => (),
            }
        }
        if let Some(s) = start {
            runs.push((s, self.plan.len()));
        }
        runs.retain(|(s, e)| e - s >= options.min_nodes_per_partition.max(1));
        if let Some(max) = options.max_delegated_partitions {
            runs.truncate(max);
        }

        let mut partitions = vec![];
        for &(s, e) in &runs {
            let nodes: TVec<usize> = self.plan[s..e]
                .iter()
                .filter_map(|step| if let Step::Builtin(n) = step { Some(*n) } else { None })
                .collect();
            let (inputs, outputs) = self.partition_boundaries(&nodes);
            let mut kernel = delegate.create_kernel();
            kernel
                .init(&self.context, &nodes)
                .with_context(|| format!("Initializing {} on nodes {:?}", delegate.name(), nodes))?;
            debug!("{} takes nodes {:?}", delegate.name(), nodes);
            partitions.push(DelegatedPartition {
                delegate: delegate.name(),
                nodes,
                inputs,
                outputs,
                kernel,
            });
        }
        info!(
            "{} applied: {} partition(s) covering {} node(s)",
            delegate.name(),
            partitions.len(),
            partitions.iter().map(|p| p.nodes.len()).sum::<usize>()
        );

        let old = std::mem::take(&mut self.plan);
        let mut partitions = runs.into_iter().zip(partitions).peekable();
        // end of the run last handed over; steps before it are covered
        let mut covered_until = 0;
        for (ix, step) in old.into_iter().enumerate() {
            if partitions.peek().is_some_and(|((s, _), _)| *s == ix) {
                if let Some(((_, e), partition)) = partitions.next() {
                    covered_until = e;
                    self.plan.push(Step::Delegated(partition));
                }
            } else if ix >= covered_until {
                self.plan.push(step);
            }
        }
        self.allocated = false;
        Ok(())
    }

    /// Prepare every step, shaping intermediate and output tensors.
    pub fn allocate_tensors(&mut self) -> TractResult<()> {
        for step in &self.plan {
            match step {
                Step::Builtin(node) => self.registry.prepare(&mut self.context, *node)?,
                Step::Delegated(p) => p
                    .kernel
                    .prepare(&mut self.context)
                    .with_context(|| format!("Preparing {} partition {:?}", p.delegate, p.nodes))?,
            }
        }
        self.allocated = true;
        Ok(())
    }

    fn input_id(&self, input: usize) -> TractResult<usize> {
        self.context
            .graph()
            .inputs
            .get(input)
            .copied()
            .with_context(|| format!("No input #{input}"))
    }

    /// Change the shape of model input `input`. Tensors must be allocated
    /// again before the next invocation.
    pub fn resize_input_tensor(&mut self, input: usize, shape: &[usize]) -> TractResult<()> {
        let id = self.input_id(input)?;
        self.context.resize_tensor(id, shape)?;
        self.allocated = false;
        Ok(())
    }

    pub fn input_mut(&mut self, input: usize) -> TractResult<&mut Tensor> {
        let id = self.input_id(input)?;
        self.context.tensor_mut(id)
    }

    /// Copy `data` into model input `input`. Its length must match the
    /// current input shape.
    pub fn set_input<T: Datum>(&mut self, input: usize, data: &[T]) -> TractResult<()> {
        let tensor = self.input_mut(input)?;
        ensure!(
            tensor.len() == data.len(),
            "Input #{} has shape {:?}, got {} values",
            input,
            tensor.shape(),
            data.len()
        );
        tensor.as_slice_mut::<T>()?.copy_from_slice(data);
        Ok(())
    }

    pub fn output(&self, output: usize) -> TractResult<&Tensor> {
        let id = self
            .context
            .graph()
            .outputs
            .get(output)
            .copied()
            .with_context(|| format!("No output #{output}"))?;
        self.context.tensor(id)
    }

    pub fn invoke(&mut self) -> TractResult<()> {
        ensure!(self.allocated, "Tensors must be allocated before invoke");
        for step in &self.plan {
            match step {
                Step::Builtin(node) => self.registry.eval(&mut self.context, *node)?,
                Step::Delegated(p) => p
                    .kernel
                    .eval(&mut self.context)
                    .with_context(|| format!("Running {} partition {:?}", p.delegate, p.nodes))?,
            }
        }
        Ok(())
    }
}
