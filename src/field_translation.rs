//! Translation operators between expansions.
pub mod multipole;
pub mod source_to_target;
