//! M2L translation strategies for Cartesian Taylor expansions.
//!
//! All three strategies evaluate the same bilinear form: each stored local
//! coefficient is a sum of stored multipole coefficients weighted by kernel
//! derivatives identified by the componentwise sum of the two multi-indices.
//! They differ in how the mirrored Toeplitz matvec over the padded circulant
//! index space is carried out, directly, with precomputed per-class data, or
//! as a pointwise product in Fourier space.
use std::marker::PhantomData;
use std::sync::Arc;

use num::pow::pow;

use crate::expansion::multi_index::degree;
use crate::expansion::types::{Expansion, Role};
use crate::expansion::wrangler::ExpansionTermsWrangler;
use crate::field_translation::source_to_target::circulant::{
    matvec_toeplitz_upper_triangular, CirculantSpace,
};
use crate::traits::dft::Dft;
use crate::traits::field::SourceToTargetTranslation;
use crate::traits::general::TranslationScalar;
use crate::traits::kernel::TaylorKernel;
use crate::traits::types::TranslationError;

fn validate(
    tgt: &Expansion,
    src: &Expansion,
) -> Result<(ExpansionTermsWrangler, ExpansionTermsWrangler, Arc<CirculantSpace>), TranslationError>
{
    if tgt.family != src.family || tgt.dim != src.dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "cannot translate {:?} (dim {}) into {:?} (dim {})",
            src.family, src.dim, tgt.family, tgt.dim
        )));
    }
    if src.role != Role::Multipole || tgt.role != Role::Local {
        return Err(TranslationError::InvalidExpansion(
            "M2L translates a multipole expansion into a local expansion".to_string(),
        ));
    }
    let tgt_wrangler = ExpansionTermsWrangler::new(tgt)?;
    let src_wrangler = ExpansionTermsWrangler::new(src)?;
    let space = CirculantSpace::new(&tgt_wrangler, &src_wrangler);
    Ok((tgt_wrangler, src_wrangler, space))
}

fn effective_rscales<T: TranslationScalar>(tgt: &Expansion, src_rscale: T, tgt_rscale: T) -> (T, T) {
    if tgt.use_rscale {
        (src_rscale, tgt_rscale)
    } else {
        (T::one(), T::one())
    }
}

/// Kernel derivatives for every needed Toeplitz entry, scattered into their
/// padded slots. Derivatives are evaluated only for the stored identifiers of
/// the combined source-plus-target wrangler; the rest come out of the kernel
/// family's recurrence.
fn raw_translation_data<T, K>(
    kernel: &K,
    tgt_wrangler: &ExpansionTermsWrangler,
    src_wrangler: &ExpansionTermsWrangler,
    space: &CirculantSpace,
    src_rscale: T,
    dvec: &[T],
) -> Result<Vec<T>, TranslationError>
where
    T: TranslationScalar,
    K: TaylorKernel<T>,
{
    if dvec.len() != src_wrangler.dim() {
        return Err(TranslationError::InvalidExpansion(format!(
            "displacement vector has length {}, expected {}",
            dvec.len(),
            src_wrangler.dim()
        )));
    }
    let combined = src_wrangler.with_order(
        tgt_wrangler.order() + src_wrangler.order(),
        Some(&space.max_mi),
    );
    // The combined identifier set covers every needed Toeplitz entry.
    debug_assert!(space
        .needed
        .iter()
        .all(|mi| combined.full_position(mi).is_some()));
    let stored_vals: Vec<T> = combined
        .stored_identifiers()
        .iter()
        .map(|mi| kernel.derivative(dvec, mi, src_rscale.clone()))
        .collect();
    let full_vals = combined.expand_to_full(&stored_vals, src_rscale);

    let mut raw = vec![T::zero(); space.size()];
    for (mi, v) in combined.full_identifiers().iter().zip(full_vals) {
        if let Some(slot) = space.slot(mi) {
            raw[slot] = v;
        }
    }
    Ok(raw)
}

/// Scatter stored multipole coefficients into their padded slots.
fn pad_multipole<T: TranslationScalar>(
    src_wrangler: &ExpansionTermsWrangler,
    space: &CirculantSpace,
    src_coeffs: &[T],
) -> Result<Vec<T>, TranslationError> {
    if src_coeffs.len() != src_wrangler.stored_identifiers().len() {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected {} stored source coefficients, got {}",
            src_wrangler.stored_identifiers().len(),
            src_coeffs.len()
        )));
    }
    let mut padded = vec![T::zero(); space.size()];
    for (mi, coeff) in src_wrangler.stored_identifiers().iter().zip(src_coeffs) {
        if let Some(slot) = space.slot(mi) {
            padded[slot] = coeff.clone();
        }
    }
    Ok(padded)
}

/// Gather the target's stored coefficients out of the padded result and
/// recondition them from the source's rscale to the target's.
fn extract_local<T: TranslationScalar>(
    tgt_wrangler: &ExpansionTermsWrangler,
    space: &CirculantSpace,
    padded_result: &[T],
    src_rscale: T,
    tgt_rscale: T,
) -> Result<Vec<T>, TranslationError> {
    if padded_result.len() != space.size() {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected padded result of length {}, got {}",
            space.size(),
            padded_result.len()
        )));
    }
    let ratio = tgt_rscale / src_rscale;
    Ok(tgt_wrangler
        .stored_identifiers()
        .iter()
        .map(|mi| {
            let slot = space
                .slot(mi)
                .expect("stored target identifier always lies in the padded space");
            padded_result[slot].clone() * pow(ratio.clone(), degree(mi))
        })
        .collect())
}

/// Direct M2L for Cartesian Taylor expansions.
///
/// Performs the mirrored Toeplitz matvec entry by entry. Per-class data is
/// optional; when absent it is assembled on the fly from the kernel.
pub struct TaylorM2l<T, K> {
    kernel: K,
    scalar: PhantomData<T>,
}

impl<T, K> TaylorM2l<T, K> {
    /// Construct a direct strategy around a derivative source.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            scalar: PhantomData,
        }
    }
}

impl<T, K> SourceToTargetTranslation<T> for TaylorM2l<T, K>
where
    T: TranslationScalar,
    K: TaylorKernel<T>,
{
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        src_rscale: T,
        dvec: &[T],
        tgt_rscale: T,
        data: Option<&[T]>,
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, src_wrangler, space) = validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        let owned;
        let data = match data {
            Some(data) => {
                if data.len() != space.size() {
                    return Err(TranslationError::InvalidExpansion(format!(
                        "expected translation data of length {}, got {}",
                        space.size(),
                        data.len()
                    )));
                }
                data
            }
            None => {
                owned = raw_translation_data(
                    &self.kernel,
                    &tgt_wrangler,
                    &src_wrangler,
                    &space,
                    src_rscale.clone(),
                    dvec,
                )?;
                &owned
            }
        };
        let padded = pad_multipole(&src_wrangler, &space, src_coeffs)?;
        let result = matvec_toeplitz_upper_triangular(&padded, data);
        extract_local(&tgt_wrangler, &space, &result, src_rscale, tgt_rscale)
    }

    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_rscale: T,
        dvec: &[T],
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, src_wrangler, space) = validate(tgt, src)?;
        let src_rscale = effective_rscales(tgt, src_rscale, T::one()).0;
        raw_translation_data(
            &self.kernel,
            &tgt_wrangler,
            &src_wrangler,
            &space,
            src_rscale,
            dvec,
        )
    }

    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        _src_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (_, src_wrangler, space) = validate(tgt, src)?;
        pad_multipole(&src_wrangler, &space, src_coeffs)
    }

    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<T>,
        src_rscale: T,
        tgt_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, _, space) = validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        extract_local(&tgt_wrangler, &space, &m2l_result, src_rscale, tgt_rscale)
    }

    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }
}

/// M2L for Cartesian Taylor expansions with mandatory per-class data.
///
/// Identical matvec to [`TaylorM2l`], but `translate` fails fast when the
/// per-class data is absent instead of recomputing it, so that accidental
/// cache misses in a driver surface as errors rather than silent slowdowns.
pub struct TaylorM2lPrecomputed<T, K> {
    kernel: K,
    scalar: PhantomData<T>,
}

impl<T, K> TaylorM2lPrecomputed<T, K> {
    /// Construct a precomputed-data strategy around a derivative source.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            scalar: PhantomData,
        }
    }
}

impl<T, K> SourceToTargetTranslation<T> for TaylorM2lPrecomputed<T, K>
where
    T: TranslationScalar,
    K: TaylorKernel<T>,
{
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        src_rscale: T,
        _dvec: &[T],
        tgt_rscale: T,
        data: Option<&[T]>,
    ) -> Result<Vec<T>, TranslationError> {
        let Some(data) = data else {
            return Err(TranslationError::Unsupported(
                "this strategy requires precomputed translation-classes-dependent data".to_string(),
            ));
        };
        let (tgt_wrangler, src_wrangler, space) = validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        if data.len() != space.size() {
            return Err(TranslationError::InvalidExpansion(format!(
                "expected translation data of length {}, got {}",
                space.size(),
                data.len()
            )));
        }
        let padded = pad_multipole(&src_wrangler, &space, src_coeffs)?;
        let result = matvec_toeplitz_upper_triangular(&padded, data);
        extract_local(&tgt_wrangler, &space, &result, src_rscale, tgt_rscale)
    }

    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_rscale: T,
        dvec: &[T],
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, src_wrangler, space) = validate(tgt, src)?;
        let src_rscale = effective_rscales(tgt, src_rscale, T::one()).0;
        raw_translation_data(
            &self.kernel,
            &tgt_wrangler,
            &src_wrangler,
            &space,
            src_rscale,
            dvec,
        )
    }

    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        _src_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (_, src_wrangler, space) = validate(tgt, src)?;
        pad_multipole(&src_wrangler, &space, src_coeffs)
    }

    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<T>,
        src_rscale: T,
        tgt_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, _, space) = validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        extract_local(&tgt_wrangler, &space, &m2l_result, src_rscale, tgt_rscale)
    }

    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }
}

/// FFT-accelerated M2L for Cartesian Taylor expansions.
///
/// The padded matvec is a segment of a cyclic convolution, so it is carried
/// out as a pointwise product of forward transforms. Per-class data holds the
/// transform of the reversed derivative vector; preprocessed multipoles hold
/// the transform of the padded coefficients; postprocessing inverts the
/// transform, un-reverses, and extracts the stored local coefficients.
pub struct TaylorM2lFft<T, K> {
    kernel: K,
    scalar: PhantomData<T>,
}

impl<T, K> TaylorM2lFft<T, K> {
    /// Construct an FFT strategy around a derivative source.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            scalar: PhantomData,
        }
    }
}

impl<T, K> SourceToTargetTranslation<T> for TaylorM2lFft<T, K>
where
    T: TranslationScalar + Dft,
    K: TaylorKernel<T>,
{
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        src_rscale: T,
        _dvec: &[T],
        tgt_rscale: T,
        data: Option<&[T]>,
    ) -> Result<Vec<T>, TranslationError> {
        let Some(data) = data else {
            return Err(TranslationError::Unsupported(
                "this strategy requires precomputed translation-classes-dependent data".to_string(),
            ));
        };
        let preprocessed = self.preprocess_multipole(tgt, src, src_coeffs, src_rscale.clone())?;
        if data.len() != preprocessed.len() {
            return Err(TranslationError::InvalidExpansion(format!(
                "expected translation data of length {}, got {}",
                preprocessed.len(),
                data.len()
            )));
        }
        let product: Vec<T> = data
            .iter()
            .zip(&preprocessed)
            .map(|(d, x)| d.clone() * x.clone())
            .collect();
        self.postprocess_local(tgt, src, product, src_rscale, tgt_rscale)
    }

    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_rscale: T,
        dvec: &[T],
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, src_wrangler, space) = validate(tgt, src)?;
        let src_rscale = effective_rscales(tgt, src_rscale, T::one()).0;
        let raw = raw_translation_data(
            &self.kernel,
            &tgt_wrangler,
            &src_wrangler,
            &space,
            src_rscale,
            dvec,
        )?;
        let reversed: Vec<T> = raw.into_iter().rev().collect();
        let mut out = vec![T::zero(); reversed.len()];
        T::forward_dft(&reversed, &mut out)?;
        Ok(out)
    }

    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        _src_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (_, src_wrangler, space) = validate(tgt, src)?;
        let padded = pad_multipole(&src_wrangler, &space, src_coeffs)?;
        let mut out = vec![T::zero(); padded.len()];
        T::forward_dft(&padded, &mut out)?;
        Ok(out)
    }

    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }

    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<T>,
        src_rscale: T,
        tgt_rscale: T,
    ) -> Result<Vec<T>, TranslationError> {
        let (tgt_wrangler, _, space) = validate(tgt, src)?;
        let (src_rscale, tgt_rscale) = effective_rscales(tgt, src_rscale, tgt_rscale);
        if m2l_result.len() != space.size() {
            return Err(TranslationError::InvalidExpansion(format!(
                "expected padded result of length {}, got {}",
                space.size(),
                m2l_result.len()
            )));
        }
        let mut inverted = vec![T::zero(); m2l_result.len()];
        T::backward_dft(&m2l_result, &mut inverted)?;
        let unreversed: Vec<T> = inverted.into_iter().rev().collect();
        extract_local(&tgt_wrangler, &space, &unreversed, src_rscale, tgt_rscale)
    }

    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError> {
        let (_, _, space) = validate(tgt, src)?;
        Ok(space.size())
    }
}
