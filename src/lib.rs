//! Revised primal simplex core with a product-form-of-inverse (PFI) basis.
//!
//! This crate implements the tightly coupled subsystems of a revised-simplex
//! LP solver: a sparse constraint matrix (CSC, with a lazily built CSR view),
//! a basis represented as an LU factorization plus an append-only chain of
//! elementary eta matrices, FTRAN/BTRAN kernels, a Harris two-pass ratio
//! test, a multi-level partial pricing engine, a pivot executor, and the
//! two-phase driver that ties them together.
//!
//! Model construction, file I/O, parameter tables, and MIP/barrier methods
//! are out of scope: this crate consumes an already-built [`model::Model`]
//! and returns a [`Status`] plus a [`solution::Solution`].

pub type E = f64;
pub type I = usize;

pub mod basis;
pub mod callback;
pub mod context;
pub mod driver;
pub mod error;
pub mod linalg;
pub mod matrix;
pub mod model;
pub mod pivot;
pub mod pricing;
pub mod ratio_test;
pub mod solution;
pub mod terminators;
pub mod transform;

pub use driver::Simplex;
pub use error::SimplexError;
pub use model::{Model, Sense};
pub use solution::{Solution, Status};

/// Sentinel used in place of IEEE infinities so bound arithmetic stays
/// uniform; anything of magnitude `>= 0.5 * INFINITY` is treated as unbounded.
pub const INFINITY: E = 1e100;

#[inline]
pub fn is_infinite(value: E) -> bool {
    value.abs() >= 0.5 * INFINITY
}

/// Phase of the two-phase simplex driver, surfaced to [`callback::Callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Phase1,
    Phase2,
    Refine,
}

/// Tolerances and limits recognized by the core.
///
/// This is a small fixed-shape struct, not a dynamically queryable
/// name/value registry: the registry layer (parameter tables, attribute
/// queries) belongs to the surrounding API, not the core.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimplexOptions {
    pub feasibility_tol: E,
    pub optimality_tol: E,
    pub pivot_tol: E,
    pub refactor_freq: usize,
    pub drift_tol: E,
    pub iter_limit: usize,
    pub time_limit: std::time::Duration,
    pub infinity: E,
    pub pricing: pricing::PricingKind,
    pub perturb: bool,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            feasibility_tol: 1e-6,
            optimality_tol: 1e-6,
            pivot_tol: 1e-10,
            refactor_freq: 100,
            drift_tol: 1e-8,
            iter_limit: usize::MAX,
            time_limit: std::time::Duration::MAX,
            infinity: INFINITY,
            pricing: pricing::PricingKind::SteepestEdge,
            perturb: true,
        }
    }
}

impl SimplexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pricing(mut self, pricing: pricing::PricingKind) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_iter_limit(mut self, iter_limit: usize) -> Self {
        self.iter_limit = iter_limit;
        self
    }

    pub fn with_time_limit(mut self, time_limit: std::time::Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_perturb(mut self, perturb: bool) -> Self {
        self.perturb = perturb;
        self
    }
}

/// Bundles the hooks a caller supplies for one solve: a [`callback::Callback`]
/// invoked once per iteration boundary, and a [`terminators::Terminator`]
/// polled at the same boundary.
pub struct SolverHooks {
    pub callback: Box<dyn callback::Callback>,
    pub terminator: Box<dyn terminators::Terminator>,
}

impl SolverHooks {
    pub fn new(
        callback: Box<dyn callback::Callback>,
        terminator: Box<dyn terminators::Terminator>,
    ) -> Self {
        Self {
            callback,
            terminator,
        }
    }

    pub fn silent() -> Self {
        Self::new(
            Box::new(callback::NoOpCallback::new(&SimplexOptions::new())),
            Box::new(terminators::IterationLimitTerminator::new(
                &SimplexOptions::new(),
            )),
        )
    }
}
