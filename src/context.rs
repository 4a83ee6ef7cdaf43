//! Solver context (C8): the per-solve working state shared by
//! every other component — working (possibly perturbed) bounds and costs,
//! the current primal/dual/reduced-cost vectors, the basis header and
//! variable-status arrays, tolerances, and counters.
//!
//! Created at the start of a solve and torn down at its end; nothing here
//! is shared across concurrent solves.

use crate::model::Model;
use crate::{E, I, Phase, SimplexOptions, is_infinite};

/// `variable_status[j]`: `>= 0` is the basic row, the rest are the
/// fixed sentinel values below.
pub const AT_LOWER: i64 = -1;
pub const AT_UPPER: i64 = -2;
pub const SUPERBASIC: i64 = -3;
pub const FIXED: i64 = -4;

/// Running totals surfaced to the caller as [`crate::solution::Counters`]
/// at the end of a solve.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub iterations: usize,
    pub refactor_count: usize,
    pub phase1_iterations: usize,
    pub phase2_iterations: usize,
    pub phase1_time: std::time::Duration,
    pub phase2_time: std::time::Duration,
}

/// All solver-local working state for one solve.
pub struct Context {
    pub n: usize,
    pub m: usize,
    pub n_total: usize,

    /// Working copies of the model's objective/bounds; perturbed in place
    /// when `options.perturb` is set, restored before reporting OPTIMAL.
    pub c: Vec<E>,
    pub l: Vec<E>,
    pub u: Vec<E>,
    /// Unperturbed snapshot of `l`/`u`, kept so perturbation can be undone
    /// exactly.
    l_original: Vec<E>,
    u_original: Vec<E>,
    perturbed: bool,

    pub x: Vec<E>,
    pub y: Vec<E>,
    pub d: Vec<E>,

    pub basis_header: Vec<I>,
    pub status: Vec<i64>,

    pub obj: E,
    pub phase: Phase,
    pub options: SimplexOptions,
    pub counters: Counters,
    pub start: std::time::Instant,
    prng_state: u64,

    /// Unboundedness certificate: a direction `r` with `A r = 0`, `r` respecting the sign
    /// of every bounded variable, along which the objective improves without
    /// limit. Populated only when the ratio test reports `UNBOUNDED`.
    pub unbounded_ray: Option<Vec<E>>,
}

impl Context {
    /// Builds working arrays from `model`: structural variables keep their
    /// bounds/cost, one logical (slack/artificial) variable is appended per
    /// row with cost 0 and the bounds `Model::slack_bounds` prescribes.
    /// Every variable starts nonbasic at whichever finite bound it has (or
    /// superbasic, value 0, if both are infinite).
    pub fn new(model: &Model, options: SimplexOptions) -> Self {
        let n = model.n_vars();
        let m = model.n_cons();
        let n_total = model.n_total();

        let mut l = vec![0.0; n_total];
        let mut u = vec![0.0; n_total];
        l[..n].copy_from_slice(model.l());
        u[..n].copy_from_slice(model.u());
        for i in 0..m {
            let (lo, hi) = model.slack_bounds(model.senses()[i]);
            l[n + i] = lo;
            u[n + i] = hi;
        }

        let mut c = vec![0.0; n_total];
        c[..n].copy_from_slice(model.c());

        let mut status = vec![AT_LOWER; n_total];
        let mut x = vec![0.0; n_total];
        for j in 0..n_total {
            status[j] = initial_status(l[j], u[j]);
            x[j] = match status[j] {
                AT_UPPER => u[j],
                FIXED => l[j],
                _ => {
                    if is_infinite(l[j]) {
                        0.0
                    } else {
                        l[j]
                    }
                }
            };
        }

        Self {
            n,
            m,
            n_total,
            l_original: l.clone(),
            u_original: u.clone(),
            c,
            l,
            u,
            perturbed: false,
            x,
            y: vec![0.0; m],
            d: vec![0.0; n_total],
            basis_header: vec![0; m],
            status,
            obj: 0.0,
            phase: Phase::Init,
            options,
            counters: Counters::default(),
            start: std::time::Instant::now(),
            prng_state: splitmix64_seed(),
            unbounded_ray: None,
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    fn next_random(&mut self) -> E {
        self.prng_state = splitmix64(self.prng_state);
        // Top 53 bits as a uniform f64 in [0, 1).
        ((self.prng_state >> 11) as f64) / ((1u64 << 53) as f64)
    }

    /// Perturbation: nudge every finite, non-fixed bound by a
    /// random offset in `(0, tau_f * 1e-6)` to break ties that would
    /// otherwise cycle. Idempotent; a second call is a no-op. A nonbasic
    /// variable sitting at the bound being moved is resynced to it, so
    /// "at lower/upper" stays true of its actual value.
    pub fn perturb(&mut self) {
        if self.perturbed {
            return;
        }
        let span = self.options.feasibility_tol * 1e-6;
        for j in 0..self.n_total {
            if self.status[j] == FIXED {
                continue;
            }
            if !is_infinite(self.l[j]) {
                self.l[j] -= self.next_random() * span;
                if self.status[j] == AT_LOWER {
                    self.x[j] = self.l[j];
                }
            }
            if !is_infinite(self.u[j]) {
                self.u[j] += self.next_random() * span;
                if self.status[j] == AT_UPPER {
                    self.x[j] = self.u[j];
                }
            }
        }
        self.perturbed = true;
    }

    /// Restores the unperturbed bounds, resyncing nonbasic variables back
    /// onto their restored bound. Returns
    /// whether any currently basic value now violates its restored bound by
    /// more than `feasibility_tol`.
    pub fn unperturb(&mut self) -> bool {
        if !self.perturbed {
            return false;
        }
        self.l.copy_from_slice(&self.l_original);
        self.u.copy_from_slice(&self.u_original);
        self.perturbed = false;

        for j in 0..self.n_total {
            match self.status[j] {
                AT_LOWER => self.x[j] = self.l[j],
                AT_UPPER => self.x[j] = self.u[j],
                FIXED => self.x[j] = self.l[j],
                _ => {}
            }
        }

        let tol = self.options.feasibility_tol;
        self.basis_header.iter().any(|&v| {
            self.x[v] < self.l[v] - tol || self.x[v] > self.u[v] + tol
        })
    }

    pub fn is_perturbed(&self) -> bool {
        self.perturbed
    }
}

fn initial_status(l: E, u: E) -> i64 {
    if (u - l).abs() <= 0.0 && !is_infinite(l) {
        FIXED
    } else if !is_infinite(l) {
        AT_LOWER
    } else if !is_infinite(u) {
        AT_UPPER
    } else {
        SUPERBASIC
    }
}

fn splitmix64_seed() -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::time::SystemTime::now().hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    hasher.finish() | 1
}

/// SplitMix64: a fast, non-cryptographic mixer.
/// Reproducible given a fixed seed, which is all that's required.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ConstraintMatrix;
    use crate::model::Sense;

    fn tiny_model() -> Model {
        let a = ConstraintMatrix::from_csc(1, 1, vec![0, 1], vec![0], vec![1.0]).unwrap();
        Model::new(
            vec![1.0],
            a,
            vec![5.0],
            vec![Sense::Le],
            vec![0.0],
            vec![crate::INFINITY],
        )
        .unwrap()
    }

    #[test]
    fn initial_status_matches_bound_shape() {
        let ctx = Context::new(&tiny_model(), SimplexOptions::new());
        assert_eq!(ctx.status[0], AT_LOWER); // x in [0, inf)
        assert_eq!(ctx.status[1], AT_LOWER); // slack in [0, inf)
        assert_eq!(ctx.x[0], 0.0);
    }

    #[test]
    fn perturb_then_unperturb_restores_exact_bounds() {
        let mut ctx = Context::new(&tiny_model(), SimplexOptions::new());
        let l_before = ctx.l.clone();
        let u_before = ctx.u.clone();
        ctx.perturb();
        assert!(ctx.is_perturbed());
        ctx.unperturb();
        assert_eq!(ctx.l, l_before);
        assert_eq!(ctx.u, u_before);
    }

    #[test]
    fn fixed_variable_status_when_bounds_equal() {
        assert_eq!(initial_status(3.0, 3.0), FIXED);
    }
}
