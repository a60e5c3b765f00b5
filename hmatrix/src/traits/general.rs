//! Traits that are useful across modules
use rlst::RlstScalar;
use rlst::{c32, c64};

/// A trait that provides the maximum machine precision corresponding to a type
pub trait Epsilon
where
    Self: RlstScalar,
{
    /// Returns epsilon, a small positive value.
    fn epsilon() -> Self::Real;
}

macro_rules! impl_epsilon {
    ($scalar:ty, $real:ty) => {
        impl Epsilon for $scalar {
            fn epsilon() -> Self::Real {
                <$real>::EPSILON
            }
        }
    };
}

impl_epsilon!(f32, f32);
impl_epsilon!(f64, f64);
impl_epsilon!(c32, f32);
impl_epsilon!(c64, f64);

/// Conversion of a double precision constant into a floating point type.
///
/// Falls back to zero if the value can't be represented, which can't happen for `f32` and `f64`.
pub fn real<T: num::Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::zero)
}

/// Conversion of a floating point value into double precision, used for diagnostics.
pub fn to_f64<T: num::Float>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
