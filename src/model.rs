//! The problem the core consumes: a fully constructed, read-only LP in
//! standard form. Model construction, attribute
//! queries, and file I/O live in the surrounding API layer; this module
//! only holds the resulting immutable view and validates its shape.

use crate::error::{SimplexError, SimplexResult};
use crate::matrix::ConstraintMatrix;
use crate::{E, I, is_infinite};

/// Constraint sense for one row of `A`, before it is folded into a slack
/// column by the crash heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

/// A linear program in standard form:
///
/// ```text
/// min  c^T x
/// s.t. A x {<=, =, >=} b
///      l <= x <= u
/// ```
///
/// Constructed and owned by the caller; read-only for the duration of a
/// solve.
#[allow(non_snake_case)]
pub struct Model {
    /// Constraint matrix (sparse, column-major, with a lazily built row view).
    A: ConstraintMatrix,
    /// Right-hand side of each constraint.
    b: Vec<E>,
    /// Constraint senses, one per row of `A`.
    senses: Vec<Sense>,
    /// Objective function coefficients.
    c: Vec<E>,
    /// Lower bounds on the variables.
    l: Vec<E>,
    /// Upper bounds on the variables.
    u: Vec<E>,
}

impl Model {
    /// Builds a model from its component arrays, validating the CSC format
    /// and bound ordering.
    #[allow(non_snake_case)]
    pub fn new(
        c: Vec<E>,
        A: ConstraintMatrix,
        b: Vec<E>,
        senses: Vec<Sense>,
        l: Vec<E>,
        u: Vec<E>,
    ) -> SimplexResult<Self> {
        let n = c.len();
        let m = b.len();

        if A.ncols() != n || A.nrows() != m {
            return Err(SimplexError::invariant(format!(
                "matrix dims ({}, {}) do not match (n={n}, m={m})",
                A.nrows(),
                A.ncols()
            )));
        }
        if senses.len() != m {
            return Err(SimplexError::invariant("senses length must equal m"));
        }
        if l.len() != n || u.len() != n {
            return Err(SimplexError::invariant("bound vectors must have length n"));
        }
        for j in 0..n {
            if l[j] > u[j] + 1e-12 {
                return Err(SimplexError::invariant(format!(
                    "variable {j} has l > u ({} > {})",
                    l[j], u[j]
                )));
            }
            if l[j].is_nan() || u[j].is_nan() || c[j].is_nan() {
                return Err(SimplexError::invariant(format!(
                    "variable {j} has NaN in c/l/u"
                )));
            }
        }
        for i in 0..m {
            if b[i].is_nan() {
                return Err(SimplexError::invariant(format!("b[{i}] is NaN")));
            }
        }
        A.validate()?;

        Ok(Self {
            A,
            b,
            senses,
            c,
            l,
            u,
        })
    }

    pub fn n_vars(&self) -> usize {
        self.c.len()
    }

    pub fn n_cons(&self) -> usize {
        self.b.len()
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.n_vars(), self.n_cons())
    }

    pub fn matrix(&self) -> &ConstraintMatrix {
        &self.A
    }

    pub fn c(&self) -> &[E] {
        &self.c
    }

    pub fn b(&self) -> &[E] {
        &self.b
    }

    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    pub fn l(&self) -> &[E] {
        &self.l
    }

    pub fn u(&self) -> &[E] {
        &self.u
    }

    /// The total variable count once one slack (or artificial, during Phase
    /// I crash) is appended per row: `n_vars() + n_cons()`. The crash
    /// heuristic always reserves this much room in the working
    /// bound/cost arrays.
    pub fn n_total(&self) -> usize {
        self.n_vars() + self.n_cons()
    }

    /// Index of the slack/artificial column associated with row `i`.
    pub fn slack_index(&self, i: I) -> I {
        self.n_vars() + i
    }

    /// `+1` for `<=` and `=` rows (slack absorbs the inequality on the
    /// non-negative side), `-1` for `>=` rows.
    pub fn slack_coefficient(&self, sense: Sense) -> E {
        match sense {
            Sense::Le | Sense::Eq => 1.0,
            Sense::Ge => -1.0,
        }
    }

    /// Bounds of the logical slack variable for a given row sense: `[0, +inf)`
    /// for inequalities, `[0, 0]` (fixed) for equalities so the slack can
    /// never absorb any violation.
    pub fn slack_bounds(&self, sense: Sense) -> (E, E) {
        match sense {
            Sense::Le | Sense::Ge => (0.0, crate::INFINITY),
            Sense::Eq => (0.0, 0.0),
        }
    }
}

#[inline]
pub fn bounded_width(l: E, u: E) -> E {
    if is_infinite(l) || is_infinite(u) {
        crate::INFINITY
    } else {
        u - l
    }
}
