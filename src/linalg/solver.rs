//! The `Solver` trait the basis's LU factorization is built against:
//! symbolic analysis, numeric factorization, and in-place solve, returning
//! this crate's single error currency ([`SimplexError`]) instead of a
//! catch-all `Problem`: the basis needs to match on *which* numeric failure
//! occurred (singular vs. out-of-memory) to decide whether an artificial
//! substitution can recover it.

use faer::sparse::SparseColMatRef;
use faer::{MatMut, MatRef};

use crate::error::SimplexResult;
use crate::{E, I};

/// Symbolic analysis + numeric factorization + triangular solve, for a
/// square sparse matrix that gets refactorized from scratch every call
/// (the basis's column set changes at every refactorization point, so
/// there is no reusable symbolic phase across solves as there might be in
/// a Newton-type iteration).
pub trait Solver {
    fn new() -> Self
    where
        Self: Sized;

    /// Computes a fill-reducing ordering and a numeric factorization of
    /// `mat` in one step.
    fn factorize(&mut self, mat: SparseColMatRef<I, E>) -> SimplexResult<()>;

    /// Solves `mat * x = b` in place, `b` supplying the right-hand side and
    /// receiving the solution.
    fn solve_in_place(&self, sol: &mut MatMut<E>) -> SimplexResult<()>;

    /// Solves `mat * x = b`, returning a freshly allocated solution.
    fn solve(&self, b: MatRef<E>) -> SimplexResult<faer::Mat<E>>;
}
