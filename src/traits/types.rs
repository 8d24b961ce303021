//! Utility types for trait definitions.
use std::fmt;

/// Type to handle translation related errors
#[derive(Debug)]
pub enum TranslationError {
    /// Translating between incompatible expansions, or constructing an
    /// expansion with an unsupported kernel-family/dimension combination.
    /// Signals a caller bug, never retried.
    InvalidExpansion(String),

    /// A strategy lacking support for the requested configuration.
    Unsupported(String),

    /// Failure inside a discrete Fourier transform.
    Fft(crate::dft::FftError),
}

impl From<crate::dft::FftError> for TranslationError {
    fn from(e: crate::dft::FftError) -> Self {
        TranslationError::Fft(e)
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::InvalidExpansion(e) => write!(f, "Invalid expansion: {}", e),
            TranslationError::Unsupported(e) => write!(f, "Unsupported: {}", e),
            TranslationError::Fft(e) => write!(f, "DFT failed: {}", e),
        }
    }
}

impl std::error::Error for TranslationError {}
