//! DFT implementations backed by `rustfft`.
//!
//! Plans are created through process-wide planners, one per precision, so
//! repeated transforms over the same circulant size reuse the cached plan.
use std::fmt;
use std::sync::Mutex;

use lazy_static::lazy_static;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::traits::dft::Dft;

/// Type to handle DFT related errors
#[derive(Debug)]
pub enum FftError {
    /// Mismatched or zero buffer lengths.
    InvalidLength(String),
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::InvalidLength(e) => write!(f, "Invalid length: {}", e),
        }
    }
}

impl std::error::Error for FftError {}

lazy_static! {
    static ref PLANNER_F32: Mutex<FftPlanner<f32>> = Mutex::new(FftPlanner::new());
    static ref PLANNER_F64: Mutex<FftPlanner<f64>> = Mutex::new(FftPlanner::new());
}

fn checked_len<T>(input: &[T], output: &[T]) -> Result<usize, FftError> {
    if input.is_empty() || input.len() != output.len() {
        return Err(FftError::InvalidLength(format!(
            "input length {} and output length {} must be equal and nonzero",
            input.len(),
            output.len()
        )));
    }
    Ok(input.len())
}

macro_rules! impl_dft {
    ($re:ty, $planner:ident) => {
        impl Dft for Complex<$re> {
            fn forward_dft(input: &[Self], output: &mut [Self]) -> Result<(), FftError> {
                let n = checked_len(input, output)?;
                // Plan under the lock, transform outside it.
                let plan = $planner.lock().unwrap().plan_fft_forward(n);
                output.copy_from_slice(input);
                plan.process(output);
                Ok(())
            }

            fn backward_dft(input: &[Self], output: &mut [Self]) -> Result<(), FftError> {
                let n = checked_len(input, output)?;
                let plan = $planner.lock().unwrap().plan_fft_inverse(n);
                output.copy_from_slice(input);
                plan.process(output);
                // rustfft leaves inverse transforms unnormalised.
                let scale = 1.0 / n as $re;
                for v in output.iter_mut() {
                    *v = v.scale(scale);
                }
                Ok(())
            }
        }
    };
}

impl_dft!(f32, PLANNER_F32);
impl_dft!(f64, PLANNER_F64);

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use num_complex::Complex;

    use crate::traits::dft::Dft;

    #[test]
    fn test_round_trip() {
        let signal: Vec<Complex<f64>> = (0..12)
            .map(|i| Complex::new((i as f64).sin(), (i as f64 * 0.3).cos()))
            .collect();
        let mut spectrum = vec![Complex::new(0.0, 0.0); signal.len()];
        let mut recovered = vec![Complex::new(0.0, 0.0); signal.len()];

        Complex::forward_dft(&signal, &mut spectrum).unwrap();
        Complex::backward_dft(&spectrum, &mut recovered).unwrap();

        for (a, b) in signal.iter().zip(&recovered) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_delta_has_flat_spectrum() {
        let mut signal = vec![Complex::new(0.0f32, 0.0); 8];
        signal[0] = Complex::new(1.0, 0.0);
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); 8];
        Complex::forward_dft(&signal, &mut spectrum).unwrap();
        for v in &spectrum {
            assert_relative_eq!(v.re, 1.0, epsilon = 1e-6);
            assert_relative_eq!(v.im, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let signal = vec![Complex::new(1.0f64, 0.0); 4];
        let mut short = vec![Complex::new(0.0f64, 0.0); 3];
        assert!(Complex::forward_dft(&signal, &mut short).is_err());
        let mut empty: Vec<Complex<f64>> = Vec::new();
        assert!(Complex::backward_dft(&[], &mut empty).is_err());
    }
}
