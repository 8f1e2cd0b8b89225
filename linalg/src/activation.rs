//! Fused activation clamps.
use num_traits::Float;

/// Activation fused at the tail of an arithmetic or pooling kernel.
///
/// Only the clamping family is supported: these reduce to a `[min, max]`
/// range applied to every output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FusedActivation {
    #[default]
    None,
    Relu,
    ReluN1To1,
    Relu6,
}

impl FusedActivation {
    pub fn range<T: Float>(&self) -> ActivationRange<T> {
        match self {
            FusedActivation::None => ActivationRange::full(),
            FusedActivation::Relu => ActivationRange::new(T::zero(), T::max_value()),
            FusedActivation::ReluN1To1 => ActivationRange::new(-T::one(), T::one()),
            FusedActivation::Relu6 => ActivationRange::new(T::zero(), crate::cst(6.0)),
        }
    }
}

/// Output range of a fused activation.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct ActivationRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: Float> ActivationRange<T> {
    pub fn full() -> ActivationRange<T> {
        ActivationRange::new(T::min_value(), T::max_value())
    }

    #[inline]
    pub fn clamp(&self, x: T) -> T {
        // min/max ignore NaN, so make sure it goes through untouched
        if x.is_nan() {
            x
        } else {
            x.max(self.min).min(self.max)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relu6() {
        let r = FusedActivation::Relu6.range::<f32>();
        assert_eq!(r.clamp(-1.0), 0.0);
        assert_eq!(r.clamp(3.0), 3.0);
        assert_eq!(r.clamp(7.5), 6.0);
    }

    #[test]
    fn none_is_identity() {
        let r = FusedActivation::None.range::<f32>();
        for x in [-1e30f32, -1.0, 0.0, 42.0, f32::MAX] {
            assert_eq!(r.clamp(x), x);
        }
        assert!(r.clamp(f32::NAN).is_nan());
    }
}
