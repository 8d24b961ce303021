//! Multipole to local (M2L) field translation.
pub mod circulant;
pub mod fourier_bessel;
pub mod taylor;
