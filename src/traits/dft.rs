//! DFT traits
use crate::dft::FftError;

/// Interface for one-dimensional discrete Fourier transforms over the
/// cyclic index space of a circulant embedding.
///
/// Implemented for `Complex<f32>` and `Complex<f64>` via `rustfft`. A
/// symbolic scalar layer may provide its own implementation to run the FFT
/// translation variants symbolically.
pub trait Dft: Sized {
    /// Forward transform. `input` and `output` must have equal, nonzero
    /// length.
    fn forward_dft(input: &[Self], output: &mut [Self]) -> Result<(), FftError>;

    /// Inverse transform, normalised so that a forward/inverse round trip is
    /// the identity. `input` and `output` must have equal, nonzero length.
    fn backward_dft(input: &[Self], output: &mut [Self]) -> Result<(), FftError>;
}
