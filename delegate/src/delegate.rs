use crate::eval::evaluate;
use crate::internal::*;
use crate::region::capture;
use crate::shape::infer_and_resize;
use crate::support::is_supported;

/// Name under which the delegate shows up in execution plans.
pub const DELEGATE_NAME: &str = "SubstitutionDelegate";

/// Which operators the delegate takes, and how the host may partition them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOptions {
    pub kinds: Vec<OperatorKind>,
    pub max_delegated_partitions: Option<usize>,
    pub min_nodes_per_partition: usize,
}

impl Default for SubstitutionOptions {
    fn default() -> SubstitutionOptions {
        SubstitutionOptions::all()
    }
}

impl SubstitutionOptions {
    pub fn all() -> SubstitutionOptions {
        SubstitutionOptions::only(&OperatorKind::ALL)
    }

    pub fn only(kinds: &[OperatorKind]) -> SubstitutionOptions {
        SubstitutionOptions {
            kinds: kinds.to_vec(),
            max_delegated_partitions: None,
            min_nodes_per_partition: 1,
        }
    }

    /// Operator selection from `TRACT_DELEGATE_OPS`, a comma separated list
    /// of operator names. Every operator is enabled if the variable is unset.
    pub fn from_env() -> TractResult<SubstitutionOptions> {
        match std::env::var("TRACT_DELEGATE_OPS") {
            Ok(list) => SubstitutionOptions::parse(&list),
            Err(_) => Ok(SubstitutionOptions::all()),
        }
    }

    /// Parse a comma separated list of operator names, like `add,mul`.
    pub fn parse(list: &str) -> TractResult<SubstitutionOptions> {
        let kinds = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<OperatorKind>())
            .collect::<TractResult<Vec<_>>>()?;
        Ok(SubstitutionOptions::only(&kinds))
    }

    pub fn with_max_delegated_partitions(self, max: usize) -> SubstitutionOptions {
        SubstitutionOptions { max_delegated_partitions: Some(max), ..self }
    }

    pub fn with_min_nodes_per_partition(self, min: usize) -> SubstitutionOptions {
        SubstitutionOptions { min_nodes_per_partition: min, ..self }
    }

    pub fn enables(&self, kind: OperatorKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// The delegate: stateless apart from its options. Every partition gets its
/// own [`SubstitutionKernel`].
#[derive(Debug, Clone, Default, new)]
pub struct SubstitutionDelegate {
    pub options: SubstitutionOptions,
}

impl Delegate for SubstitutionDelegate {
    fn name(&self) -> &'static str {
        DELEGATE_NAME
    }

    fn is_node_supported(&self, context: &Context, node: usize) -> bool {
        is_supported(context, node, &self.options)
    }

    fn options(&self) -> PartitionOptions {
        PartitionOptions::new(
            self.options.max_delegated_partitions,
            self.options.min_nodes_per_partition,
        )
    }

    fn create_kernel(&self) -> Box<dyn DelegateKernel> {
        Box::<SubstitutionKernel>::default()
    }
}

/// Kernel of one partition. Holds the region captured at init, and nothing
/// else: the tensors stay with the host.
#[derive(Debug, Default)]
pub struct SubstitutionKernel {
    region: Option<SubstitutedRegion>,
}

impl SubstitutionKernel {
    pub fn region(&self) -> Option<&SubstitutedRegion> {
        self.region.as_ref()
    }

    fn captured(&self) -> TractResult<&SubstitutedRegion> {
        self.region.as_ref().with_context(|| EvalError("Kernel used before init".to_string()))
    }
}

impl DelegateKernel for SubstitutionKernel {
    fn init(&mut self, context: &Context, nodes: &[usize]) -> TractResult<()> {
        self.region = Some(capture(context, nodes)?);
        Ok(())
    }

    fn prepare(&self, context: &mut Context) -> TractResult<()> {
        infer_and_resize(self.captured()?, context)
    }

    fn eval(&self, context: &mut Context) -> TractResult<()> {
        evaluate(self.captured()?, context)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_options() {
        let options = SubstitutionOptions::parse("add, mul").unwrap();
        assert_eq!(options.kinds, vec![OperatorKind::Add, OperatorKind::Mul]);
        assert!(options.enables(OperatorKind::Mul));
        assert!(!options.enables(OperatorKind::Abs));
        assert!(SubstitutionOptions::parse("").unwrap().kinds.is_empty());
        assert!(SubstitutionOptions::parse("add,conv").is_err());
    }

    #[test]
    fn partition_options() {
        let delegate = SubstitutionDelegate::new(
            SubstitutionOptions::all()
                .with_max_delegated_partitions(2)
                .with_min_nodes_per_partition(3),
        );
        assert_eq!(delegate.name(), "SubstitutionDelegate");
        assert_eq!(Delegate::options(&delegate), PartitionOptions::new(Some(2), 3));
        let default = SubstitutionDelegate::default();
        assert_eq!(Delegate::options(&default), PartitionOptions::default());
    }

    #[test]
    fn kernel_before_init() {
        let kernel = SubstitutionKernel::default();
        let mut context = Context::new(Graph::default());
        assert!(kernel.region().is_none());
        let err = kernel.eval(&mut context).unwrap_err();
        assert!(matches!(SubstitutionError::find(&err), Some(EvalError(_))));
    }

    #[test]
    fn failed_init_leaves_kernel_empty() {
        let mut kernel = SubstitutionKernel::default();
        let context = Context::new(Graph::default());
        assert!(kernel.init(&context, &[0]).is_err());
        assert!(kernel.region().is_none());
    }
}
