//! # FMM Translation Operators
//!
//! Translation operators between truncated series expansions, the algebraic core of
//! fast multipole methods \[1\]: re-centering multipole expansions (M2M) and converting
//! multipole expansions into local expansions (M2L).
//!
//! Notable features of this library are:
//! * Cartesian Taylor expansions in any dimension, with optional PDE-conforming
//!   coefficient compression for Laplace-type kernels.
//! * 2D Fourier-Bessel expansions for Helmholtz- and Yukawa-type kernels.
//! * Interchangeable M2L strategies behind a single trait: direct evaluation,
//!   precomputed per-displacement-class data, and FFT acceleration over a circulant
//!   embedding of the translation matrix.
//!
//! Closed-form kernel evaluations are supplied by the caller through narrow
//! collaborator traits, so the operators work over real, complex, or symbolic scalar
//! types alike.
//!
//! ## References
//! \[1\] Greengard, L., & Rokhlin, V. (1987). A fast algorithm for particle simulations. Journal of Computational Physics, 73(2), 325-348.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod dft;
pub mod expansion;
pub mod field_translation;
pub mod traits;

// Public API
#[doc(inline)]
pub use expansion::types::{Expansion, KernelFamily, Role};
#[doc(inline)]
pub use expansion::wrangler::ExpansionTermsWrangler;
#[doc(inline)]
pub use field_translation::source_to_target::fourier_bessel::{
    FourierBesselM2l, FourierBesselM2lFft, FourierBesselM2lPrecomputed,
};
#[doc(inline)]
pub use field_translation::source_to_target::taylor::{
    TaylorM2l, TaylorM2lFft, TaylorM2lPrecomputed,
};
#[doc(inline)]
pub use traits::field::SourceToTargetTranslation;
#[doc(inline)]
pub use traits::types::TranslationError;
