//! Thin linear-algebra layer the basis (`crate::basis`) builds on: a sparse
//! LU factorization of the current basis matrix, delegated to `faer` rather
//! than re-deriving general sparse Gaussian elimination.

pub mod lu;
pub mod solver;
