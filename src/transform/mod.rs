//! In-place IR rewrites run ahead of lowering.
//!
//! The only pass is the canonicalizer, which reshapes the handful of IR
//! forms the LC-3 lowering does not want to see into the forms it does.

mod canonicalize;

pub use canonicalize::Canonicalize;
