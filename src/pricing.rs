//! Pricing engine (C6): multi-level partial pricing over a closed set of
//! scoring strategies.
//!
//! The three strategies share almost no code, so they are a tagged sum
//! dispatched at compile time via `enum_dispatch` rather than a `dyn Trait`
//! object or an inheritance hierarchy.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::{E, I};

/// Selectable pricing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingKind {
    SteepestEdge,
    Devex,
    Dantzig,
}

/// Per-variable scoring and weight maintenance. `score` must be maximized
/// by the entering-variable search; `on_pivot` updates internal state after
/// a pivot (or a no-op bound flip, `pivot_row = None`).
#[enum_dispatch]
trait ScoringStrategy {
    fn score(&self, var: I, reduced_cost: E) -> E;
    fn on_pivot(&mut self, entering: I, pivot_row: I, alpha: &[E]);
    fn weight(&self, var: I) -> E;
}

/// `d_j^2 / gamma_j`, `gamma_j` approximating the squared steepest-edge
/// norm. The exact update rule needs `tau_jk = A_k^T (B^-1)^T e_r`
/// for every nonbasic `k`, which is an FTRAN per candidate; as an escape
/// hatch from that cost, only the entering variable's own weight is
/// updated exactly (`gamma_j / alpha_r^2`), and the rest are left as-is —
/// correct in the cheap/degenerate limit, conservative (never under-scores)
/// elsewhere since weights only grow via the `max(1, ...)` floor.
struct SteepestEdge {
    gamma: Vec<E>,
}

impl SteepestEdge {
    fn new(n_total: usize) -> Self {
        Self {
            gamma: vec![1.0; n_total],
        }
    }
}

impl ScoringStrategy for SteepestEdge {
    fn score(&self, var: I, reduced_cost: E) -> E {
        reduced_cost * reduced_cost / self.gamma[var]
    }

    fn on_pivot(&mut self, entering: I, pivot_row: I, alpha: &[E]) {
        let alpha_r = alpha[pivot_row];
        if alpha_r.abs() > 0.0 {
            self.gamma[entering] = (self.gamma[entering] / (alpha_r * alpha_r)).max(1.0);
        }
    }

    fn weight(&self, var: I) -> E {
        self.gamma[var]
    }
}

/// Devex reference-weight scheme: a cheaper relative of steepest edge.
/// `gamma_j` is only ever raised by the entering variable's contribution
/// scaled by `(alpha_j / alpha_r)^2`; a full scan across nonbasic `j` is
/// skipped for the same cost reason as steepest edge, so in practice the
/// weights this implementation carries track the *entering* variable's own
/// history precisely and approximate everyone else's by the floor of 1.0.
struct Devex {
    gamma: Vec<E>,
}

impl Devex {
    fn new(n_total: usize) -> Self {
        Self {
            gamma: vec![1.0; n_total],
        }
    }
}

impl ScoringStrategy for Devex {
    fn score(&self, var: I, reduced_cost: E) -> E {
        reduced_cost * reduced_cost / self.gamma[var]
    }

    fn on_pivot(&mut self, entering: I, pivot_row: I, alpha: &[E]) {
        let alpha_r = alpha[pivot_row];
        if alpha_r.abs() > 0.0 {
            self.gamma[entering] = (1.0 / (alpha_r * alpha_r)).max(1.0);
        }
    }

    fn weight(&self, var: I) -> E {
        self.gamma[var]
    }
}

/// Dantzig's rule: most-negative reduced cost, no weighting at all.
struct Dantzig;

impl ScoringStrategy for Dantzig {
    fn score(&self, _var: I, reduced_cost: E) -> E {
        reduced_cost * reduced_cost
    }

    fn on_pivot(&mut self, _entering: I, _pivot_row: I, _alpha: &[E]) {}

    fn weight(&self, _var: I) -> E {
        1.0
    }
}

#[enum_dispatch(ScoringStrategy)]
enum Strategy {
    SteepestEdge(SteepestEdge),
    Devex(Devex),
    Dantzig(Dantzig),
}

struct Level {
    members: Vec<I>,
    valid: bool,
}

/// Floor below which a coarser level is not worth building: `n_total`
/// variables get collapsed straight to one level once `sqrt` shrinkage
/// would fall below this.
const LEVEL_FLOOR: usize = 100;
/// Typically 3-5 levels deep.
const MAX_LEVELS: usize = 5;

/// Multi-level partial pricing engine: a hierarchy of progressively
/// coarser candidate lists, plus a pluggable scoring [`Strategy`].
pub struct PricingEngine {
    n_total: usize,
    strategy: Strategy,
    levels: Vec<Level>,
    optimality_tol: E,
    /// Rotation cursor used when resampling a stale coarse level.
    rotation: usize,
}

/// Attractiveness test: does improving `var` from its current bound
/// reduce the objective? `status`: `-1` at lower, `-2` at upper, `-3`
/// superbasic, as in [`crate::context`].
fn is_attractive(status: i64, reduced_cost: E, tau_o: E) -> Option<E> {
    match status {
        -1 => (reduced_cost < -tau_o).then_some(1.0),
        -2 => (reduced_cost > tau_o).then_some(-1.0),
        -3 => {
            if reduced_cost < -tau_o {
                Some(1.0)
            } else if reduced_cost > tau_o {
                Some(-1.0)
            } else {
                None
            }
        }
        _ => None,
    }
}

impl PricingEngine {
    pub fn new(n_total: usize, kind: PricingKind, optimality_tol: E) -> Self {
        let strategy = match kind {
            PricingKind::SteepestEdge => Strategy::SteepestEdge(SteepestEdge::new(n_total)),
            PricingKind::Devex => Strategy::Devex(Devex::new(n_total)),
            PricingKind::Dantzig => Strategy::Dantzig(Dantzig),
        };

        let mut sizes = vec![n_total];
        while sizes.len() < MAX_LEVELS {
            let prev = *sizes.last().unwrap();
            if prev <= LEVEL_FLOOR {
                break;
            }
            let next = ((prev as f64).sqrt() as usize).max(LEVEL_FLOOR);
            if next >= prev {
                break;
            }
            sizes.push(next);
        }

        let levels = sizes
            .iter()
            .enumerate()
            .map(|(depth, &size)| Level {
                members: if depth == 0 {
                    (0..n_total).collect()
                } else {
                    Vec::with_capacity(size)
                },
                valid: depth == 0,
            })
            .collect();

        Self {
            n_total,
            strategy,
            levels,
            optimality_tol,
            rotation: 0,
        }
    }

    /// Multi-level partial pricing protocol: start at the
    /// deepest valid level, expand outward (coarser, index 0) until an
    /// attractive variable is found or level 0 is exhausted.
    pub fn select_entering(&mut self, status: &[i64], reduced_costs: &[E]) -> Option<(I, E)> {
        let deepest_valid = self
            .levels
            .iter()
            .rposition(|l| l.valid)
            .unwrap_or(self.levels.len() - 1);

        for depth in (0..=deepest_valid).rev() {
            if !self.levels[depth].valid {
                self.rebuild_level(depth);
            }
            if let Some(found) = self.scan_level(depth, status, reduced_costs) {
                return Some(found);
            }
            self.levels[depth].valid = false;
        }
        None
    }

    fn scan_level(&self, depth: usize, status: &[i64], reduced_costs: &[E]) -> Option<(I, E)> {
        let mut best: Option<(I, E, E)> = None; // (var, score, direction)
        for &var in &self.levels[depth].members {
            let Some(direction) = is_attractive(status[var], reduced_costs[var], self.optimality_tol)
            else {
                continue;
            };
            let score = self.strategy.score(var, reduced_costs[var]);
            best = match best {
                None => Some((var, score, direction)),
                Some((_, bs, _)) if score > bs => Some((var, score, direction)),
                some => some,
            };
        }
        best.map(|(var, _, direction)| (var, direction))
    }

    /// Rebuilds a stale coarse level by rotating through all variables,
    /// taking a stride-sampled subset of the target size.
    fn rebuild_level(&mut self, depth: usize) {
        let target = self.levels[depth].members.capacity().max(LEVEL_FLOOR);
        let stride = (self.n_total / target.max(1)).max(1);
        let mut members = Vec::with_capacity(target);
        let mut idx = self.rotation % self.n_total.max(1);
        for _ in 0..target {
            if idx >= self.n_total {
                break;
            }
            members.push(idx);
            idx = (idx + stride) % self.n_total.max(1);
        }
        self.rotation = (self.rotation + 1) % self.n_total.max(1);
        self.levels[depth].members = members;
        self.levels[depth].valid = true;
    }

    /// Refinement after a pivot: the entering and departing
    /// variables re-enter the finest level; all coarser levels go stale.
    pub fn on_pivot(&mut self, entering: I, departing: I, pivot_row: I, alpha: &[E]) {
        self.strategy.on_pivot(entering, pivot_row, alpha);

        if let Some(finest) = self.levels.last_mut() {
            if !finest.members.contains(&entering) {
                finest.members.push(entering);
            }
            if !finest.members.contains(&departing) {
                finest.members.push(departing);
            }
            finest.valid = true;
        }
        for level in self.levels.iter_mut().rev().skip(1) {
            level.valid = false;
        }
    }

    /// Weight invariant check: `gamma_j >= 1` for all `j`.
    pub fn weight(&self, var: I) -> E {
        self.strategy.weight(var)
    }
}
