//! Solver output (C11): the terminal status code and the
//! owned snapshot of primal/dual/basis state returned to the caller.
//!
//! [`Solution`] and its fields derive `serde::Serialize`/`Deserialize` so a
//! caller can persist the basis description for a warm start (basis_header
//! and variable_status are sufficient to warm-start) without the core
//! itself touching a filesystem — that remains the API layer's job.

use serde::{Deserialize, Serialize};

use crate::{E, I};

/// Terminal status of a solve.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    InProgress,
    Optimal,
    Infeasible,
    Unbounded,
    /// A factorization or drift check failed in a way refactorization
    /// could not resolve.
    Numeric,
    TimeLimit,
    IterationLimit,
    Interrupted,
}

/// Running totals for one solve, surfaced from [`crate::context::Counters`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub iterations: usize,
    pub refactor_count: usize,
    pub phase1_iterations: usize,
    pub phase2_iterations: usize,
    pub phase1_time: std::time::Duration,
    pub phase2_time: std::time::Duration,
}

impl From<crate::context::Counters> for Counters {
    fn from(c: crate::context::Counters) -> Self {
        Self {
            iterations: c.iterations,
            refactor_count: c.refactor_count,
            phase1_iterations: c.phase1_iterations,
            phase2_iterations: c.phase2_iterations,
            phase1_time: c.phase1_time,
            phase2_time: c.phase2_time,
        }
    }
}

/// Owned snapshot of the final solver state: structural variable
/// values, reduced costs, row duals, basis membership, and variable status
/// codes, plus the running totals from the solve that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Values of all `n_total` variables (structural followed by logical).
    pub x: Vec<E>,
    /// Reduced costs of all `n_total` variables.
    pub d: Vec<E>,
    /// Row dual (simplex multiplier) values, one per constraint. At
    /// `Status::Infeasible` these are the Phase I duals, which double as the
    /// farkas certificate (dual ray).
    pub y: Vec<E>,
    /// Objective value at termination.
    pub obj: E,
    /// `basis_header[r]` is the variable basic in row `r`.
    pub basis_header: Vec<I>,
    /// `variable_status[j]`: `>= 0` basic row, or one of
    /// [`crate::context::AT_LOWER`], [`crate::context::AT_UPPER`],
    /// [`crate::context::SUPERBASIC`], [`crate::context::FIXED`].
    pub variable_status: Vec<i64>,
    /// Populated only at `Status::Unbounded`: a direction along which `obj`
    /// improves without limit.
    pub unbounded_ray: Option<Vec<E>>,
    pub counters: Counters,
}

impl Solution {
    /// Structural (non-slack) portion of [`Self::x`].
    pub fn structural_values(&self, n_vars: usize) -> &[E] {
        &self.x[..n_vars]
    }
}
