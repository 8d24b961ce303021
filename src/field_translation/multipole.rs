//! Multipole to multipole (M2M) translation for Cartesian Taylor expansions.
//!
//! Re-centers a multipole expansion by the displacement `dvec` between the
//! old and new centers. The direct multinomial sum costs `O(p^{2d})`; the
//! production path instead walks the source's hyperplane decomposition axis
//! by axis and applies the shift one dimension at a time, a cumulative
//! binomial-weighted prefix sum per axis, for `O(d p^{d+1})` work.
use std::collections::HashMap;

use num::pow::pow;

use crate::expansion::multi_index::{degree, dominated_by, factorial, MultiIndex};
use crate::expansion::types::{Expansion, Role};
use crate::expansion::wrangler::ExpansionTermsWrangler;
use crate::traits::general::TranslationScalar;
use crate::traits::types::TranslationError;

fn validate<T>(
    tgt: &Expansion,
    src: &Expansion,
    src_coeffs: &[T],
    dvec: &[T],
) -> Result<(ExpansionTermsWrangler, ExpansionTermsWrangler), TranslationError> {
    if tgt.family != src.family || tgt.dim != src.dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "cannot translate {:?} (dim {}) into {:?} (dim {})",
            src.family, src.dim, tgt.family, tgt.dim
        )));
    }
    if tgt.role != Role::Multipole || src.role != Role::Multipole {
        return Err(TranslationError::InvalidExpansion(
            "M2M translates multipole expansions into multipole expansions".to_string(),
        ));
    }
    let tgt_wrangler = ExpansionTermsWrangler::new(tgt)?;
    let src_wrangler = ExpansionTermsWrangler::new(src)?;
    if src_coeffs.len() != src_wrangler.stored_identifiers().len() {
        return Err(TranslationError::InvalidExpansion(format!(
            "expected {} stored source coefficients, got {}",
            src_wrangler.stored_identifiers().len(),
            src_coeffs.len()
        )));
    }
    if dvec.len() != tgt.dim {
        return Err(TranslationError::InvalidExpansion(format!(
            "displacement vector has length {}, expected {}",
            dvec.len(),
            tgt.dim
        )));
    }
    Ok((tgt_wrangler, src_wrangler))
}

/// Shift weight `(dvec_d / tgt_rscale)^e / e!` of a single-axis step.
fn shift_weight<T: TranslationScalar>(dvec_d: &T, tgt_rscale: &T, e: usize) -> T {
    pow(dvec_d.clone() / tgt_rscale.clone(), e)
        / T::from_u64(factorial(e)).expect("factorial out of scalar range")
}

/// Translate stored multipole coefficients of `src`, centered at `c1`, into
/// stored multipole coefficients of `tgt`, centered at `c1 + dvec`.
///
/// Source identifiers without a counterpart in the target index space
/// (possible only when the source order exceeds the target order) are
/// dropped, matching the direct sum restricted to the target's identifiers.
pub fn translate<T: TranslationScalar>(
    tgt: &Expansion,
    src: &Expansion,
    src_coeffs: &[T],
    src_rscale: T,
    dvec: &[T],
    tgt_rscale: T,
) -> Result<Vec<T>, TranslationError> {
    let (tgt_wrangler, src_wrangler) = validate(tgt, src, src_coeffs, dvec)?;
    let (src_rscale, tgt_rscale) = if tgt.use_rscale {
        (src_rscale, tgt_rscale)
    } else {
        (T::one(), T::one())
    };

    let full = tgt_wrangler.full_identifiers();
    let full_index: HashMap<&MultiIndex, usize> =
        full.iter().enumerate().map(|(i, mi)| (mi, i)).collect();
    let src_index: HashMap<&MultiIndex, usize> = src_wrangler
        .stored_identifiers()
        .iter()
        .enumerate()
        .map(|(i, mi)| (mi, i))
        .collect();

    let rscale_ratio = src_rscale / tgt_rscale.clone();
    let mut result = vec![T::zero(); full.len()];

    for (axis, members) in src_wrangler.hyperplane_groups() {
        // Scatter this group's stored source coefficients into the
        // target-indexed buffer, adjusting rscale.
        let mut buffer = vec![T::zero(); full.len()];
        let mut occupied = false;
        for mi in members {
            let Some(&src_pos) = src_index.get(mi) else {
                continue;
            };
            let Some(&tgt_pos) = full_index.get(mi) else {
                continue;
            };
            buffer[tgt_pos] = src_coeffs[src_pos].clone() * pow(rscale_ratio.clone(), degree(mi));
            occupied = true;
        }
        if !occupied {
            continue;
        }

        // Apply the shift one dimension at a time, cycling all other axes
        // before this group's axis.
        let sweep_order = (0..tgt.dim).filter(|d| d != axis).chain(std::iter::once(*axis));
        for d in sweep_order {
            let mut swept = vec![T::zero(); full.len()];
            for (i, tgt_mi) in full.iter().enumerate() {
                let mut input_mi = tgt_mi.clone();
                for k in 0..=tgt_mi[d] {
                    input_mi[d] = k;
                    let contrib = &buffer[full_index[&input_mi]];
                    if contrib.is_zero() {
                        continue;
                    }
                    swept[i] +=
                        contrib.clone() * shift_weight(&dvec[d], &tgt_rscale, tgt_mi[d] - k);
                }
            }
            buffer = swept;
        }

        for (acc, contrib) in result.iter_mut().zip(buffer) {
            *acc += contrib;
        }
    }

    Ok(tgt_wrangler.project_to_stored(&result, tgt_rscale))
}

/// Brute-force M2M by the direct multinomial double sum, retained as a
/// correctness oracle for the axis-sweep path.
pub fn translate_reference<T: TranslationScalar>(
    tgt: &Expansion,
    src: &Expansion,
    src_coeffs: &[T],
    src_rscale: T,
    dvec: &[T],
    tgt_rscale: T,
) -> Result<Vec<T>, TranslationError> {
    let (tgt_wrangler, src_wrangler) = validate(tgt, src, src_coeffs, dvec)?;
    let (src_rscale, tgt_rscale) = if tgt.use_rscale {
        (src_rscale, tgt_rscale)
    } else {
        (T::one(), T::one())
    };

    let rscale_ratio = src_rscale / tgt_rscale.clone();
    let full = tgt_wrangler.full_identifiers();
    let mut result = vec![T::zero(); full.len()];

    for (i, tgt_mi) in full.iter().enumerate() {
        for (src_mi, coeff) in src_wrangler.stored_identifiers().iter().zip(src_coeffs) {
            if !dominated_by(src_mi, tgt_mi) {
                continue;
            }
            let mut contrib = coeff.clone() * pow(rscale_ratio.clone(), degree(src_mi));
            for d in 0..tgt.dim {
                contrib = contrib * shift_weight(&dvec[d], &tgt_rscale, tgt_mi[d] - src_mi[d]);
            }
            result[i] += contrib;
        }
    }

    Ok(tgt_wrangler.project_to_stored(&result, tgt_rscale))
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::{translate, translate_reference};
    use crate::expansion::types::{Expansion, KernelFamily, Role};

    fn coeffs(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 4.0).collect()
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(x, y, epsilon = 1e-12, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_axis_sweep_matches_reference() {
        for (family, dim, p_s, p_t) in [
            (KernelFamily::Taylor, 1, 3, 3),
            (KernelFamily::Taylor, 2, 2, 2),
            (KernelFamily::Taylor, 2, 2, 4),
            (KernelFamily::Taylor, 3, 2, 3),
            (KernelFamily::LaplaceConforming, 2, 3, 3),
            (KernelFamily::LaplaceConforming, 3, 2, 2),
        ] {
            let src = Expansion::multipole(family, dim, p_s).unwrap();
            let tgt = Expansion::multipole(family, dim, p_t).unwrap();
            let src_wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
            let c = coeffs(src_wrangler.stored_identifiers().len());
            let dvec: Vec<f64> = (0..dim).map(|d| 0.25 + 0.5 * d as f64).collect();

            let fast = translate(&tgt, &src, &c, 1.5, &dvec, 0.75).unwrap();
            let slow = translate_reference(&tgt, &src, &c, 1.5, &dvec, 0.75).unwrap();
            assert_close(&fast, &slow);
        }
    }

    #[test]
    fn test_axis_sweep_matches_reference_random() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0);
        let src = Expansion::multipole(KernelFamily::LaplaceConforming, 3, 3).unwrap();
        let tgt = Expansion::multipole(KernelFamily::LaplaceConforming, 3, 4).unwrap();
        let wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
        for _ in 0..5 {
            let c: Vec<f64> = (0..wrangler.stored_identifiers().len())
                .map(|_| rng.gen_range(-1.0..1.0))
                .collect();
            let dvec: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let src_rscale = rng.gen_range(0.5..2.0);
            let tgt_rscale = rng.gen_range(0.5..2.0);

            let fast = translate(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale).unwrap();
            let slow = translate_reference(&tgt, &src, &c, src_rscale, &dvec, tgt_rscale).unwrap();
            assert_close(&fast, &slow);
        }
    }

    #[test]
    fn test_round_trip() {
        // Translating to a shifted center and back reproduces the original
        // stored coefficients.
        for family in [KernelFamily::Taylor, KernelFamily::LaplaceConforming] {
            let src = Expansion::multipole(family, 2, 3).unwrap();
            let wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
            let c = coeffs(wrangler.stored_identifiers().len());
            let dvec = [0.3f64, -0.7];
            let back = [-0.3f64, 0.7];

            let shifted = translate(&src, &src, &c, 1.0, &dvec, 1.0).unwrap();
            let returned = translate(&src, &src, &shifted, 1.0, &back, 1.0).unwrap();
            assert_close(&returned, &c);
        }
    }

    #[test]
    fn test_round_trip_with_rscale() {
        let src = Expansion::multipole(KernelFamily::Taylor, 2, 2).unwrap();
        let wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
        let c = coeffs(wrangler.stored_identifiers().len());
        let dvec = [0.4f64, 0.1];
        let back = [-0.4f64, -0.1];

        let shifted = translate(&src, &src, &c, 0.5, &dvec, 2.0).unwrap();
        let returned = translate(&src, &src, &shifted, 2.0, &back, 0.5).unwrap();
        assert_close(&returned, &c);
    }

    #[test]
    fn test_zero_displacement_is_identity() {
        let src = Expansion::multipole(KernelFamily::Taylor, 3, 2).unwrap();
        let wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
        let c = coeffs(wrangler.stored_identifiers().len());
        let shifted = translate(&src, &src, &c, 1.0, &[0.0, 0.0, 0.0], 1.0).unwrap();
        assert_close(&shifted, &c);
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let src = Expansion::multipole(KernelFamily::Taylor, 2, 2).unwrap();
        let tgt_family = Expansion::multipole(KernelFamily::LaplaceConforming, 2, 2).unwrap();
        let tgt_role = Expansion::local(KernelFamily::Taylor, 2, 2).unwrap();
        let c = coeffs(6);

        assert!(translate(&tgt_family, &src, &c, 1.0, &[0.1, 0.2], 1.0).is_err());
        assert!(translate(&tgt_role, &src, &c, 1.0, &[0.1, 0.2], 1.0).is_err());
        assert!(translate(&src, &src, &c, 1.0, &[0.1], 1.0).is_err());
        // Wrong coefficient count for the stored set.
        let short = coeffs(3);
        assert!(translate(&src, &src, &short, 1.0, &[0.1, 0.2], 1.0).is_err());
    }

    #[test]
    fn test_use_rscale_disabled_ignores_rscales() {
        let src = Expansion::new(KernelFamily::Taylor, 2, 2, Role::Multipole, false).unwrap();
        let wrangler = crate::ExpansionTermsWrangler::new(&src).unwrap();
        let c = coeffs(wrangler.stored_identifiers().len());
        let dvec = [0.3f64, 0.2];

        let a = translate(&src, &src, &c, 5.0, &dvec, 0.1).unwrap();
        let b = translate(&src, &src, &c, 1.0, &dvec, 1.0).unwrap();
        assert_close(&a, &b);
    }
}
