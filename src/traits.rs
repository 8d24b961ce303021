//! Trait definitions
pub mod dft;
pub mod field;
pub mod general;
pub mod kernel;
pub mod types;
