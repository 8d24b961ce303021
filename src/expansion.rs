//! Expansion descriptors, coefficient index sets and compression bookkeeping.
pub mod cache;
pub mod multi_index;
pub mod types;
pub mod wrangler;
