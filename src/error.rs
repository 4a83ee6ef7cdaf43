//! Structured error taxonomy for the simplex core.
//!
//! Status results (`OPTIMAL`, `INFEASIBLE`, `UNBOUNDED`, the `*_LIMIT`
//! family) are expected outcomes and are returned as [`crate::Status`]
//! values, never as [`SimplexError`]. `SimplexError` is reserved for
//! numeric failures, resource failures, and contract violations — the
//! things that mean the solve could not produce a trustworthy answer.

use derive_more::{Display, Error};
use problemo::Problem;
use problemo::common::IntoCommonProblem;

/// The core's only error currency. Every fallible core operation returns
/// `Result<_, SimplexError>`; the driver converts any that escape into a
/// [`Problem`] at its own boundary via [`problemo`]'s `.via(...)` combinator.
#[derive(Debug, Display, Error, Clone, PartialEq)]
pub enum SimplexError {
    /// Refactorization found the basis numerically singular. `attempt`
    /// counts how many artificial-substitution retries have already failed.
    #[display("singular basis (attempt {attempt})")]
    SingularBasis { attempt: u8 },

    /// Successive refactorizations could not bring the FTRAN/BTRAN drift
    /// within tolerance.
    #[display("drift unresolvable: residual {residual:e}")]
    DriftUnresolvable { residual: f64 },

    /// A heap allocation failed (`try_reserve` style allocation failure).
    #[display("allocation failure")]
    OutOfMemory,

    /// A broken internal invariant was observed (e.g. basis_header /
    /// variable_status correspondence, matrix CSC format, NaN/Inf that
    /// survived input validation). Always a caller or implementation bug.
    #[display("invariant violation: {detail}")]
    InvariantViolation { detail: String },
}

impl SimplexError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        SimplexError::InvariantViolation {
            detail: detail.into(),
        }
    }
}

pub type SimplexResult<T> = Result<T, SimplexError>;

impl SimplexError {
    /// Converts into the catch-all [`Problem`] type used at the boundary
    /// with callers that don't want to match on the specific variant, e.g.
    /// [`crate::Simplex::solve`]'s top-level `Result`.
    pub fn into_problem(self) -> Problem {
        self.to_string().gloss()
    }
}
