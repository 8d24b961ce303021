//! Translation strategies for 2D cylindrical (Fourier-Bessel) expansions.
//!
//! Coefficients are indexed by integers in `[-order, order]` and translation
//! rests on the Graf addition theorem for Bessel functions: M2L weights are
//! Hankel functions of the first kind of the combined order `m + j`, so the
//! translation matrix is a Hankel matrix over the storage indices and the
//! per-class data is a single vector of length `2 * (p_s + p_t) + 1`.
use num::pow::pow;
use num::traits::{Float, FromPrimitive, NumAssign, One};
use num_complex::Complex;

use crate::expansion::types::{Expansion, Role};
use crate::traits::field::SourceToTargetTranslation;
use crate::traits::kernel::CylindricalKernel;
use crate::traits::types::TranslationError;

fn validate(tgt: &Expansion, src: &Expansion) -> Result<(), TranslationError> {
    if tgt.family != src.family || tgt.dim != src.dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "cannot translate {:?} (dim {}) into {:?} (dim {})",
            src.family, src.dim, tgt.family, tgt.dim
        )));
    }
    if !tgt.family.is_cylindrical() {
        return Err(TranslationError::InvalidExpansion(format!(
            "{:?} expansions are not cylindrical",
            tgt.family
        )));
    }
    if src.role != Role::Multipole || tgt.role != Role::Local {
        return Err(TranslationError::InvalidExpansion(
            "M2L translates a multipole expansion into a local expansion".to_string(),
        ));
    }
    Ok(())
}

fn polar<R: Float>(tgt_dim: usize, dvec: &[Complex<R>]) -> Result<(R, R), TranslationError> {
    if dvec.len() != tgt_dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "displacement vector has length {}, expected {}",
            dvec.len(),
            tgt_dim
        )));
    }
    // Centers live in the real plane; imaginary parts of the displacement
    // are ignored.
    let (x, y) = (dvec[0].re, dvec[1].re);
    Ok((x.hypot(y), y.atan2(x)))
}

fn unit_phase<R: Float + FromPrimitive>(k: i64, theta: R) -> Complex<R> {
    let k = R::from_i64(k).expect("integer order out of scalar range");
    Complex::from_polar(R::one(), k * theta)
}

fn rscale_power<R: Float + FromPrimitive>(rscale: Complex<R>, k: i64) -> Complex<R> {
    pow(rscale, k.unsigned_abs() as usize)
}

/// Hankel weights `H^{(1)}_{m + j}(scale * |dvec|) * exp(i (m + j) theta)`,
/// indexed by the sum of the source and target storage indices.
fn hankel_data<R, K>(
    kernel: &K,
    tgt: &Expansion,
    src: &Expansion,
    dvec: &[Complex<R>],
) -> Result<Vec<Complex<R>>, TranslationError>
where
    R: Float + FromPrimitive + NumAssign + Send + Sync + 'static,
    K: CylindricalKernel<R>,
{
    let (norm, theta) = polar(tgt.dim, dvec)?;
    let arg = kernel.arg_scale() * norm;
    let top = (src.order + tgt.order) as i64;
    Ok((-top..=top)
        .map(|k| kernel.hankel1(k, arg) * unit_phase(k, theta))
        .collect())
}

fn scaled_multipole<R: Float + FromPrimitive>(
    src: &Expansion,
    src_coeffs: &[Complex<R>],
    src_rscale: Complex<R>,
) -> Result<Vec<Complex<R>>, TranslationError> {
    let n = 2 * src.order + 1;
    if src_coeffs.len() != n {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected {} source coefficients, got {}",
            n,
            src_coeffs.len()
        )));
    }
    Ok(src
        .cylindrical_identifiers()
        .zip(src_coeffs)
        .map(|(m, coeff)| coeff * rscale_power(src_rscale, m))
        .collect())
}

/// Hankel matvec over the storage indices: `out[idx_j] = sum_m
/// data[idx_j + idx_m] * x[idx_m]`.
fn hankel_matvec<R: Float>(
    tgt: &Expansion,
    src: &Expansion,
    data: &[Complex<R>],
    x: &[Complex<R>],
) -> Result<Vec<Complex<R>>, TranslationError> {
    let ndata = 2 * (src.order + tgt.order) + 1;
    if data.len() != ndata {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected translation data of length {}, got {}",
            ndata,
            data.len()
        )));
    }
    Ok((0..2 * tgt.order + 1)
        .map(|idx_j| {
            x.iter()
                .enumerate()
                .map(|(idx_m, xm)| data[idx_j + idx_m] * xm)
                .sum()
        })
        .collect())
}

fn rescale_local<R: Float + FromPrimitive>(
    tgt: &Expansion,
    m2l_result: Vec<Complex<R>>,
    tgt_rscale: Complex<R>,
) -> Result<Vec<Complex<R>>, TranslationError> {
    let n = 2 * tgt.order + 1;
    if m2l_result.len() != n {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected {} local coefficients, got {}",
            n,
            m2l_result.len()
        )));
    }
    Ok(tgt
        .cylindrical_identifiers()
        .zip(m2l_result)
        .map(|(j, v)| {
            let v = v * rscale_power(tgt_rscale, j);
            if j.rem_euclid(2) == 1 {
                -v
            } else {
                v
            }
        })
        .collect())
}

fn effective_rscales<R: Float + FromPrimitive>(
    tgt: &Expansion,
    src_rscale: Complex<R>,
    tgt_rscale: Complex<R>,
) -> (Complex<R>, Complex<R>) {
    if tgt.use_rscale {
        (src_rscale, tgt_rscale)
    } else {
        (Complex::one(), Complex::one())
    }
}

/// Direct M2L for 2D cylindrical expansions.
///
/// Per-class data is optional; when absent the Hankel weights are evaluated
/// on the fly.
pub struct FourierBesselM2l<K> {
    kernel: K,
}

impl<K> FourierBesselM2l<K> {
    /// Construct a direct strategy around a special-function source.
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }
}

impl<R, K> SourceToTargetTranslation<Complex<R>> for FourierBesselM2l<K>
where
    R: Float + FromPrimitive + NumAssign + Send + Sync + 'static,
    K: CylindricalKernel<R>,
{
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[Complex<R>],
        src_rscale: Complex<R>,
        dvec: &[Complex<R>],
        tgt_rscale: Complex<R>,
        data: Option<&[Complex<R>]>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        let owned;
        let data = match data {
            Some(data) => data,
            None => {
                owned = hankel_data(&self.kernel, tgt, src, dvec)?;
                &owned
            }
        };
        let x = scaled_multipole(src, src_coeffs, src_rscale)?;
        let out = hankel_matvec(tgt, src, data, &x)?;
        rescale_local(tgt, out, tgt_rscale)
    }

    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        _src_rscale: Complex<R>,
        dvec: &[Complex<R>],
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        hankel_data(&self.kernel, tgt, src, dvec)
    }

    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * (src.order + tgt.order) + 1)
    }

    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[Complex<R>],
        src_rscale: Complex<R>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        let src_rscale = effective_rscales(tgt, src_rscale, Complex::one()).0;
        scaled_multipole(src, src_coeffs, src_rscale)
    }

    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * src.order + 1)
    }

    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<Complex<R>>,
        src_rscale: Complex<R>,
        tgt_rscale: Complex<R>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        let tgt_rscale = effective_rscales(tgt, src_rscale, tgt_rscale).1;
        rescale_local(tgt, m2l_result, tgt_rscale)
    }

    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * tgt.order + 1)
    }
}

/// M2L for 2D cylindrical expansions with mandatory per-class data.
pub struct FourierBesselM2lPrecomputed<K> {
    kernel: K,
}

impl<K> FourierBesselM2lPrecomputed<K> {
    /// Construct a precomputed-data strategy around a special-function
    /// source.
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }
}

impl<R, K> SourceToTargetTranslation<Complex<R>> for FourierBesselM2lPrecomputed<K>
where
    R: Float + FromPrimitive + NumAssign + Send + Sync + 'static,
    K: CylindricalKernel<R>,
{
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[Complex<R>],
        src_rscale: Complex<R>,
        _dvec: &[Complex<R>],
        tgt_rscale: Complex<R>,
        data: Option<&[Complex<R>]>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        let Some(data) = data else {
            return Err(TranslationError::Unsupported(
                "this strategy requires precomputed translation-classes-dependent data".to_string(),
            ));
        };
        validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        let x = scaled_multipole(src, src_coeffs, src_rscale)?;
        let out = hankel_matvec(tgt, src, data, &x)?;
        rescale_local(tgt, out, tgt_rscale)
    }

    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        _src_rscale: Complex<R>,
        dvec: &[Complex<R>],
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        hankel_data(&self.kernel, tgt, src, dvec)
    }

    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * (src.order + tgt.order) + 1)
    }

    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[Complex<R>],
        src_rscale: Complex<R>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        let src_rscale = effective_rscales(tgt, src_rscale, Complex::one()).0;
        scaled_multipole(src, src_coeffs, src_rscale)
    }

    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * src.order + 1)
    }

    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<Complex<R>>,
        src_rscale: Complex<R>,
        tgt_rscale: Complex<R>,
    ) -> Result<Vec<Complex<R>>, TranslationError> {
        validate(tgt, src)?;
        let tgt_rscale = effective_rscales(tgt, src_rscale, tgt_rscale).1;
        rescale_local(tgt, m2l_result, tgt_rscale)
    }

    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        validate(tgt, src)?;
        Ok(2 * tgt.order + 1)
    }
}

/// FFT-accelerated M2L for 2D cylindrical expansions.
///
/// Unavailable: driving the Hankel matvec through an FFT amplifies the
/// dynamic range of the Hankel weights and loses all accuracy at moderate
/// orders, a known instability of the Fourier-Bessel form (Greengard and
/// Rokhlin, 1988). The constructor refuses to build the strategy so drivers
/// degrade to the precomputed one explicitly.
pub struct FourierBesselM2lFft {
    _private: (),
}

impl FourierBesselM2lFft {
    /// Always fails; see the type-level documentation.
    pub fn new() -> Result<Self, TranslationError> {
        Err(TranslationError::Unsupported(
            "Fourier-Bessel translation with FFT is not fully supported yet".to_string(),
        ))
    }
}

/// Re-center a 2D cylindrical multipole expansion by `dvec`.
///
/// The weights are Bessel functions of the first kind of the order
/// difference `m - j`; unlike M2L no Hankel functions appear, so the shift
/// is well conditioned at any separation, including `dvec = 0`.
pub fn m2m_translate<R, K>(
    kernel: &K,
    tgt: &Expansion,
    src: &Expansion,
    src_coeffs: &[Complex<R>],
    src_rscale: Complex<R>,
    dvec: &[Complex<R>],
    tgt_rscale: Complex<R>,
) -> Result<Vec<Complex<R>>, TranslationError>
where
    R: Float + FromPrimitive + NumAssign + Send + Sync + 'static,
    K: CylindricalKernel<R>,
{
    if tgt.family != src.family || tgt.dim != src.dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "cannot translate {:?} (dim {}) into {:?} (dim {})",
            src.family, src.dim, tgt.family, tgt.dim
        )));
    }
    if !tgt.family.is_cylindrical() {
        return Err(TranslationError::InvalidExpansion(format!(
            "{:?} expansions are not cylindrical",
            tgt.family
        )));
    }
    if src.role != Role::Multipole || tgt.role != Role::Multipole {
        return Err(TranslationError::InvalidExpansion(
            "M2M translates multipole expansions into multipole expansions".to_string(),
        ));
    }
    let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
    let x = scaled_multipole(src, src_coeffs, src_rscale)?;
    let (norm, theta) = polar(tgt.dim, dvec)?;
    let arg = kernel.arg_scale() * norm;

    Ok(tgt
        .cylindrical_identifiers()
        .map(|j| {
            let total: Complex<R> = src
                .cylindrical_identifiers()
                .zip(&x)
                .map(|(m, xm)| xm * kernel.bessel_j(m - j, arg) * unit_phase(m - j, theta))
                .sum();
            total / rscale_power(tgt_rscale, j)
        })
        .collect())
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use num_complex::Complex;

    use super::{m2m_translate, FourierBesselM2l, FourierBesselM2lFft, FourierBesselM2lPrecomputed};
    use crate::expansion::types::{Expansion, KernelFamily};
    use crate::traits::field::SourceToTargetTranslation;
    use crate::traits::kernel::CylindricalKernel;
    use crate::traits::types::TranslationError;

    /// Smooth synthetic special functions, enough to compare strategies
    /// against each other; `bessel_j` honors the exact values at zero
    /// argument so the zero-shift identity holds.
    struct MockKernel;

    impl CylindricalKernel<f64> for MockKernel {
        fn arg_scale(&self) -> Complex<f64> {
            Complex::new(1.2, 0.0)
        }

        fn hankel1(&self, order: i64, arg: Complex<f64>) -> Complex<f64> {
            let o = order as f64;
            Complex::new(0.3 * o, -0.1) + arg / (1.0 + o * o)
        }

        fn bessel_j(&self, order: i64, arg: Complex<f64>) -> Complex<f64> {
            if arg.norm_sqr() == 0.0 {
                if order == 0 {
                    Complex::new(1.0, 0.0)
                } else {
                    Complex::new(0.0, 0.0)
                }
            } else {
                arg * 0.7 / (1.0 + (order * order) as f64)
            }
        }
    }

    fn coeffs(n: usize) -> Vec<Complex<f64>> {
        (0..n)
            .map(|i| Complex::new(((i * 5 + 2) % 7) as f64 - 3.0, ((i * 3 + 1) % 5) as f64))
            .collect()
    }

    fn assert_close(a: &[Complex<f64>], b: &[Complex<f64>]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-12, max_relative = 1e-12);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-12, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_phase_lengths() {
        let tgt = Expansion::local(KernelFamily::Helmholtz2d, 2, 3).unwrap();
        let src = Expansion::multipole(KernelFamily::Helmholtz2d, 2, 3).unwrap();
        let engine = FourierBesselM2l::new(MockKernel);

        assert_eq!(
            engine
                .translation_classes_dependent_ndata(&tgt, &src)
                .unwrap(),
            13
        );
        assert_eq!(engine.preprocess_multipole_ndata(&tgt, &src).unwrap(), 7);
        assert_eq!(engine.postprocess_local_ndata(&tgt, &src).unwrap(), 7);
    }

    #[test]
    fn test_direct_and_precomputed_agree() {
        for family in [KernelFamily::Helmholtz2d, KernelFamily::Yukawa2d] {
            let tgt = Expansion::local(family, 2, 3).unwrap();
            let src = Expansion::multipole(family, 2, 2).unwrap();
            let c = coeffs(5);
            let dvec = [Complex::new(2.0, 0.0), Complex::new(-1.5, 0.0)];
            let (src_rscale, tgt_rscale) = (Complex::new(0.5, 0.0), Complex::new(2.0, 0.0));

            let direct = FourierBesselM2l::new(MockKernel);
            let precomputed = FourierBesselM2lPrecomputed::new(MockKernel);

            let reference = direct
                .translate(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale, None)
                .unwrap();
            assert_eq!(reference.len(), 7);

            let data = precomputed
                .translation_classes_dependent_data(&tgt, &src, src_rscale, &dvec)
                .unwrap();
            let with_data = precomputed
                .translate(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale, Some(&data))
                .unwrap();
            assert_close(&with_data, &reference);

            assert!(precomputed
                .translate(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale, None)
                .is_err());
        }
    }

    #[test]
    fn test_phase_composition_matches_translate() {
        let tgt = Expansion::local(KernelFamily::Yukawa2d, 2, 2).unwrap();
        let src = Expansion::multipole(KernelFamily::Yukawa2d, 2, 2).unwrap();
        let c = coeffs(5);
        let dvec = [Complex::new(1.0, 0.0), Complex::new(2.0, 0.0)];
        let (src_rscale, tgt_rscale) = (Complex::new(0.5, 0.0), Complex::new(1.5, 0.0));
        let engine = FourierBesselM2l::new(MockKernel);

        let data = engine
            .translation_classes_dependent_data(&tgt, &src, src_rscale, &dvec)
            .unwrap();
        let x = engine
            .preprocess_multipole(&tgt, &src, &c, src_rscale)
            .unwrap();
        let core: Vec<Complex<f64>> = (0..5)
            .map(|idx_j| (0..5).map(|idx_m| data[idx_j + idx_m] * x[idx_m]).sum())
            .collect();
        let composed = engine
            .postprocess_local(&tgt, &src, core, src_rscale, tgt_rscale)
            .unwrap();

        let one_shot = engine
            .translate(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale, Some(&data))
            .unwrap();
        assert_close(&composed, &one_shot);
    }

    #[test]
    fn test_single_precision_scalars() {
        // The strategies are generic over the real precision, not pinned to
        // f64.
        struct MockKernel32;

        impl CylindricalKernel<f32> for MockKernel32 {
            fn arg_scale(&self) -> Complex<f32> {
                Complex::new(1.0, 0.0)
            }

            fn hankel1(&self, order: i64, arg: Complex<f32>) -> Complex<f32> {
                Complex::new(order as f32, 0.5) + arg
            }

            fn bessel_j(&self, order: i64, arg: Complex<f32>) -> Complex<f32> {
                Complex::new(order as f32, 0.0) - arg
            }
        }

        let tgt = Expansion::local(KernelFamily::Helmholtz2d, 2, 2).unwrap();
        let src = Expansion::multipole(KernelFamily::Helmholtz2d, 2, 2).unwrap();
        let c: Vec<Complex<f32>> = (0..5).map(|i| Complex::new(i as f32, 1.0)).collect();
        let dvec = [Complex::new(1.0f32, 0.0), Complex::new(0.5, 0.0)];
        let one = Complex::new(1.0f32, 0.0);

        let engine = FourierBesselM2l::new(MockKernel32);
        let result = engine
            .translate(&tgt, &src, &c, one, &dvec, one, None)
            .unwrap();
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_fft_strategy_gated() {
        match FourierBesselM2lFft::new() {
            Err(TranslationError::Unsupported(_)) => {}
            _ => panic!("Fourier-Bessel FFT strategy should be unavailable"),
        }
    }

    #[test]
    fn test_cartesian_pair_rejected() {
        let tgt = Expansion::local(KernelFamily::Taylor, 2, 2).unwrap();
        let src = Expansion::multipole(KernelFamily::Taylor, 2, 2).unwrap();
        let engine = FourierBesselM2l::new(MockKernel);
        let c = coeffs(5);
        let dvec = [Complex::new(1.0, 0.0), Complex::new(1.0, 0.0)];
        let one = Complex::new(1.0, 0.0);
        assert!(engine
            .translate(&tgt, &src, &c, one, &dvec, one, None)
            .is_err());
    }

    #[test]
    fn test_m2m_zero_shift_is_identity() {
        let e = Expansion::multipole(KernelFamily::Helmholtz2d, 2, 3).unwrap();
        let c = coeffs(7);
        let zero = [Complex::new(0.0, 0.0), Complex::new(0.0, 0.0)];
        let one = Complex::new(1.0, 0.0);
        let shifted = m2m_translate(&MockKernel, &e, &e, &c, one, &zero, one).unwrap();
        assert_close(&shifted, &c);
    }

    #[test]
    fn test_m2m_rejects_local_target() {
        let src = Expansion::multipole(KernelFamily::Helmholtz2d, 2, 2).unwrap();
        let tgt = Expansion::local(KernelFamily::Helmholtz2d, 2, 2).unwrap();
        let c = coeffs(5);
        let dvec = [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)];
        let one = Complex::new(1.0, 0.0);
        assert!(m2m_translate(&MockKernel, &tgt, &src, &c, one, &dvec, one).is_err());
    }
}
