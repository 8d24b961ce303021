//! Field translation traits
use crate::expansion::types::Expansion;
use crate::traits::general::TranslationScalar;
use crate::traits::types::TranslationError;

/// Interface for multipole to local (M2L) field translation strategies.
///
/// A strategy splits the translation into three phases:
///
/// 1. `translation_classes_dependent_data` - computed once per displacement
///    class, i.e. once per distinct displacement vector between source and
///    target centers, and shared by every box pair in that class;
/// 2. `preprocess_multipole` - computed once per source box;
/// 3. `postprocess_local` - computed once per target box.
///
/// `translate` composes all three for a single box pair and always returns
/// the target's stored coefficients. The `*_ndata` counters report the exact
/// length of the vector produced by the corresponding phase; callers must
/// query them before allocating storage.
pub trait SourceToTargetTranslation<T: TranslationScalar> {
    /// Translate stored multipole coefficients of `src` into stored local
    /// coefficients of `tgt`, for centers separated by `dvec`.
    ///
    /// Strategies with a precomputation phase require `data` (as produced by
    /// [`Self::translation_classes_dependent_data`]) and fail fast without
    /// it; the direct strategy computes it on the fly when absent.
    #[allow(clippy::too_many_arguments)]
    fn translate(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        src_rscale: T,
        dvec: &[T],
        tgt_rscale: T,
        data: Option<&[T]>,
    ) -> Result<Vec<T>, TranslationError>;

    /// Data depending only on `(dvec, src_rscale, expansion pair)`, reusable
    /// across every box pair sharing that displacement class.
    fn translation_classes_dependent_data(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_rscale: T,
        dvec: &[T],
    ) -> Result<Vec<T>, TranslationError>;

    /// Length of the vector returned by
    /// [`Self::translation_classes_dependent_data`].
    fn translation_classes_dependent_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError>;

    /// Per-source-box preprocessing of stored multipole coefficients into the
    /// strategy's working index space.
    fn preprocess_multipole(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        src_coeffs: &[T],
        src_rscale: T,
    ) -> Result<Vec<T>, TranslationError>;

    /// Length of the vector returned by [`Self::preprocess_multipole`].
    fn preprocess_multipole_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError>;

    /// Per-target-box postprocessing, extracting and rescaling the stored
    /// local coefficients from the strategy's working index space.
    fn postprocess_local(
        &self,
        tgt: &Expansion,
        src: &Expansion,
        m2l_result: Vec<T>,
        src_rscale: T,
        tgt_rscale: T,
    ) -> Result<Vec<T>, TranslationError>;

    /// Length of the vector consumed by [`Self::postprocess_local`].
    fn postprocess_local_ndata(
        &self,
        tgt: &Expansion,
        src: &Expansion,
    ) -> Result<usize, TranslationError>;
}
