//! General traits
use num::traits::{FromPrimitive, Num, NumAssignOps};

/// Scalar type over which translation operators are defined.
///
/// Coefficient vectors, displacement components and rscales may be real,
/// complex, or handles into an external symbolic-expression layer, as long as
/// the type supports ring arithmetic with division, additive and
/// multiplicative identities, and conversion from small integers (used for
/// factorial and binomial weights).
pub trait TranslationScalar:
    Clone + Num + NumAssignOps + FromPrimitive + Send + Sync + 'static
{
}

impl<T> TranslationScalar for T where
    T: Clone + Num + NumAssignOps + FromPrimitive + Send + Sync + 'static
{
}
