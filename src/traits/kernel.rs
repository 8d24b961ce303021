//! Kernel collaborator traits
//!
//! Closed-form potential and derivative formulas for the physical kernels
//! (Laplace, Helmholtz, Yukawa, ...) live outside this crate. The translation
//! engines consume them through the narrow interfaces below.
use num::traits::{Float, FromPrimitive};
use num_complex::Complex;

use crate::traits::general::TranslationScalar;

/// Source of mixed partial derivatives of a fundamental solution, used by the
/// Cartesian Taylor M2L engines to assemble translation-class-dependent data.
pub trait TaylorKernel<T: TranslationScalar> {
    /// The mixed partial derivative identified by the multi-index `mi` of the
    /// fundamental solution, evaluated at the displacement `dvec` and scaled
    /// consistently with `rscale`.
    ///
    /// Only derivatives for *stored* identifiers of the combined
    /// source-plus-target wrangler are requested; the remaining ones are
    /// reconstructed through the kernel family's recurrence.
    fn derivative(&self, dvec: &[T], mi: &[usize], rscale: T) -> T;
}

/// Special-function evaluations required by the 2D cylindrical
/// (Fourier-Bessel) translation engines.
pub trait CylindricalKernel<R>
where
    R: Float + FromPrimitive + Send + Sync + 'static,
{
    /// Scaling applied to Bessel/Hankel arguments; `k` for a Helmholtz
    /// kernel, `i*lambda` for a Yukawa kernel.
    fn arg_scale(&self) -> Complex<R>;

    /// Hankel function of the first kind of integer order.
    fn hankel1(&self, order: i64, arg: Complex<R>) -> Complex<R>;

    /// Bessel function of the first kind of integer order.
    fn bessel_j(&self, order: i64, arg: Complex<R>) -> Complex<R>;
}
