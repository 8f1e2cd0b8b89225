//! The closed set of operators the delegate knows how to run.
use crate::internal::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    Abs,
    Add,
    Mul,
    Atan2,
    AddN,
    ArgMax,
    ArgMin,
    AveragePool2d,
    MaxPool2d,
    BatchMatMul,
    BatchToSpaceNd,
}

/// Number of inputs an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == *k,
            Arity::AtLeast(k) => n >= *k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exactly(k) => write!(f, "{k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

const F32_ONLY: &[DatumType] = &[DatumType::F32];
const INDICES: &[DatumType] = &[DatumType::I32, DatumType::I64];

impl OperatorKind {
    pub const ALL: [OperatorKind; 11] = [
        OperatorKind::Abs,
        OperatorKind::Add,
        OperatorKind::Mul,
        OperatorKind::Atan2,
        OperatorKind::AddN,
        OperatorKind::ArgMax,
        OperatorKind::ArgMin,
        OperatorKind::AveragePool2d,
        OperatorKind::MaxPool2d,
        OperatorKind::BatchMatMul,
        OperatorKind::BatchToSpaceNd,
    ];

    pub fn from_builtin(op: BuiltinOperator) -> Option<OperatorKind> {
        use BuiltinOperator as B;
        use OperatorKind as K;
        Some(match op {
            B::Abs => K::Abs,
            B::Add => K::Add,
            B::Mul => K::Mul,
            B::Atan2 => K::Atan2,
            B::AddN => K::AddN,
            B::ArgMax => K::ArgMax,
            B::ArgMin => K::ArgMin,
            B::AveragePool2d => K::AveragePool2d,
            B::MaxPool2d => K::MaxPool2d,
            B::BatchMatMul => K::BatchMatMul,
            B::BatchToSpaceNd => K::BatchToSpaceNd,
            B::Relu | B::Sub => return None,
        })
    }

    /// The host operator this kind stands for.
    pub fn builtin(&self) -> BuiltinOperator {
        use BuiltinOperator as B;
        use OperatorKind as K;
        match self {
            K::Abs => B::Abs,
            K::Add => B::Add,
            K::Mul => B::Mul,
            K::Atan2 => B::Atan2,
            K::AddN => B::AddN,
            K::ArgMax => B::ArgMax,
            K::ArgMin => B::ArgMin,
            K::AveragePool2d => B::AveragePool2d,
            K::MaxPool2d => B::MaxPool2d,
            K::BatchMatMul => B::BatchMatMul,
            K::BatchToSpaceNd => B::BatchToSpaceNd,
        }
    }

    /// Inputs, in order. ArgMax and ArgMin take the axis as second input,
    /// BatchToSpaceNd the block shape and the crops.
    pub fn input_arity(&self) -> Arity {
        use OperatorKind::*;
        match self {
            Abs | AveragePool2d | MaxPool2d => Arity::Exactly(1),
            Add | Mul | Atan2 | ArgMax | ArgMin | BatchMatMul => Arity::Exactly(2),
            BatchToSpaceNd => Arity::Exactly(3),
            AddN => Arity::AtLeast(1),
        }
    }

    pub fn output_arity(&self) -> usize {
        1
    }

    /// Element types accepted on the primary input.
    pub fn input_types(&self) -> &'static [DatumType] {
        F32_ONLY
    }

    pub fn output_types(&self) -> &'static [DatumType] {
        match self {
            OperatorKind::ArgMax | OperatorKind::ArgMin => INDICES,
            _ => F32_ONLY,
        }
    }

    /// Whether the operator carries a fused activation.
    pub fn has_activation(&self) -> bool {
        use OperatorKind::*;
        matches!(self, Add | Mul | AveragePool2d | MaxPool2d)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::str::FromStr for OperatorKind {
    type Err = anyhow::Error;

    /// Case and underscores are ignored: `add_n`, `AddN` and `ADDN` all
    /// parse as `AddN`.
    fn from_str(s: &str) -> TractResult<OperatorKind> {
        let wanted = s.trim().replace('_', "").to_ascii_lowercase();
        OperatorKind::ALL
            .iter()
            .copied()
            .find(|k| k.to_string().to_ascii_lowercase() == wanted)
            .with_context(|| format!("Unknown operator kind {s:?}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_mapping_is_consistent() {
        for kind in OperatorKind::ALL {
            assert_eq!(OperatorKind::from_builtin(kind.builtin()), Some(kind));
        }
        assert_eq!(OperatorKind::from_builtin(BuiltinOperator::Sub), None);
        assert_eq!(OperatorKind::from_builtin(BuiltinOperator::Relu), None);
    }

    #[test]
    fn parse() {
        assert_eq!("add_n".parse::<OperatorKind>().unwrap(), OperatorKind::AddN);
        assert_eq!(" BatchMatMul".parse::<OperatorKind>().unwrap(), OperatorKind::BatchMatMul);
        let pool = "average_pool_2d".parse::<OperatorKind>().unwrap();
        assert_eq!(pool, OperatorKind::AveragePool2d);
        assert!("conv".parse::<OperatorKind>().is_err());
    }

    #[test]
    fn arities() {
        assert!(OperatorKind::AddN.input_arity().accepts(5));
        assert!(!OperatorKind::AddN.input_arity().accepts(0));
        assert!(OperatorKind::BatchToSpaceNd.input_arity().accepts(3));
        assert!(!OperatorKind::Add.input_arity().accepts(1));
        assert_eq!(OperatorKind::ArgMax.output_types(), &[DatumType::I32, DatumType::I64]);
    }
}
