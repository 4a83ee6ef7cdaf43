//! Two-phase simplex driver (C7): crashes a starting basis, perturbs
//! bounds to break ties, runs a composite-objective Phase I to feasibility,
//! runs Phase II to optimality, then refines and un-perturbs before
//! reporting the final [`Solution`].
//!
//! Mirrors the shape of a `Solver::solve(&mut self, state, properties) ->
//! Result<Status, Problem>` entry point familiar from this crate's wider
//! numerical-optimization lineage, generalized to the revised-simplex state
//! machine instead of an interior-point one.

use crate::basis::Basis;
use crate::context::{Context, AT_LOWER, AT_UPPER, SUPERBASIC};
use crate::error::{SimplexError, SimplexResult};
use crate::model::Model;
use crate::pivot;
use crate::pricing::PricingEngine;
use crate::ratio_test::{harris_ratio_test, RatioTestOutcome};
use crate::solution::{Solution, Status};
use crate::transform;
use crate::{is_infinite, Phase, SimplexOptions, SolverHooks, E, I, INFINITY};

/// Entry point: a model plus the options to solve it with.
pub struct Simplex<'a> {
    model: &'a Model,
    options: SimplexOptions,
}

enum RefactorOutcome {
    Ready,
    /// Singular basis survived every retry: the caller
    /// reports this as a normal terminal status, not a propagated error.
    Numeric,
}

impl<'a> Simplex<'a> {
    pub fn new(model: &'a Model, options: SimplexOptions) -> Self {
        Self { model, options }
    }

    /// Runs the full INIT -> CRASH -> [PERTURB] -> PHASE_I -> PHASE_II ->
    /// REFINE -> [UNPERTURB] -> DONE state machine.
    pub fn solve(&self, hooks: &mut SolverHooks) -> SimplexResult<(Status, Solution)> {
        hooks.terminator.initialize();

        let mut ctx = Context::new(self.model, self.options.clone());
        let mut basis = Basis::new(self.model.n_cons());
        let mut pricing =
            PricingEngine::new(ctx.n_total, self.options.pricing, self.options.optimality_tol);

        ctx.basis_header = self.crash();
        let header = ctx.basis_header.clone();
        for (row, var) in header.into_iter().enumerate() {
            ctx.status[var] = row as i64;
        }

        if let RefactorOutcome::Numeric = self.refactor(&mut ctx, &mut basis)? {
            return Ok((Status::Numeric, self.finalize(&mut ctx)));
        }

        if self.options.perturb {
            ctx.perturb();
        }

        ctx.phase = Phase::Phase1;
        let phase1_start = ctx.elapsed();
        let phase1_result = self.iterate(&mut ctx, &mut basis, &mut pricing, hooks, Phase::Phase1)?;
        ctx.counters.phase1_time = ctx.elapsed() - phase1_start;

        let status = match phase1_result {
            Status::Optimal => {
                ctx.phase = Phase::Phase2;
                let phase2_start = ctx.elapsed();
                let result = self.iterate(&mut ctx, &mut basis, &mut pricing, hooks, Phase::Phase2)?;
                ctx.counters.phase2_time = ctx.elapsed() - phase2_start;
                result
            }
            other => other,
        };

        if status != Status::Optimal {
            return Ok((status, self.finalize(&mut ctx)));
        }

        ctx.phase = Phase::Refine;
        if let RefactorOutcome::Numeric = self.refactor(&mut ctx, &mut basis)? {
            return Ok((Status::Numeric, self.finalize(&mut ctx)));
        }
        self.compute_phase2_duals(&mut ctx, &basis)?;

        let primal_infeas = self.primal_infeasibility(&ctx);
        let dual_infeas = self.dual_infeasibility(&ctx);
        if primal_infeas > ctx.options.feasibility_tol * 10.0
            || dual_infeas > ctx.options.optimality_tol * 10.0
        {
            return Ok((Status::Numeric, self.finalize(&mut ctx)));
        }

        if ctx.unperturb() && self.primal_infeasibility(&ctx) > ctx.options.feasibility_tol * 10.0 {
            return Ok((Status::Numeric, self.finalize(&mut ctx)));
        }

        Ok((Status::Optimal, self.finalize(&mut ctx)))
    }

    /// Crash heuristic: every row's own logical variable
    /// starts basic. For `<=`/`>=` rows this is the natural slack; for `=`
    /// rows [`Model::slack_bounds`] already fixes it at `[0, 0]`, so it
    /// plays the role of an artificial whose bound violation Phase I's
    /// composite objective (the sum of infeasibility violations) drives
    /// to zero — no separate artificial-variable pool is needed.
    fn crash(&self) -> Vec<I> {
        (0..self.model.n_cons())
            .map(|i| self.model.slack_index(i))
            .collect()
    }

    /// Recomputes the LU of `B` (retrying up to twice on a singular basis,
    /// up to twice), then `x_B`.
    fn refactor(&self, ctx: &mut Context, basis: &mut Basis) -> SimplexResult<RefactorOutcome> {
        let header = ctx.basis_header.clone();
        for attempt in 0..=2u8 {
            match basis.refactor(&header, |var| transform::variable_column(self.model, var), attempt) {
                Ok(()) => {
                    ctx.counters.refactor_count += 1;
                    self.recompute_basics(ctx, basis)?;
                    return Ok(RefactorOutcome::Ready);
                }
                Err(SimplexError::SingularBasis { .. }) if attempt < 2 => continue,
                Err(SimplexError::SingularBasis { .. }) => return Ok(RefactorOutcome::Numeric),
                Err(e) => return Err(e),
            }
        }
        unreachable!("loop above always returns by attempt 2")
    }

    /// `x_B = B^-1 (b - A_N x_N)` over every currently nonbasic variable
    /// (also used after every refactor).
    fn recompute_basics(&self, ctx: &mut Context, basis: &Basis) -> SimplexResult<()> {
        let mut rhs = self.model.b().to_vec();
        for j in 0..ctx.n_total {
            if ctx.status[j] >= 0 {
                continue;
            }
            let xj = ctx.x[j];
            if xj == 0.0 {
                continue;
            }
            for (row, value) in transform::variable_column(self.model, j) {
                rhs[row] -= value * xj;
            }
        }
        let xb = basis.ftran(&rhs)?;
        for (row, &var) in ctx.basis_header.iter().enumerate() {
            ctx.x[var] = xb[row];
        }
        Ok(())
    }

    /// Phase II duals/reduced costs: `y` from `B^T y = c_B`, `d = c - A^T y`.
    fn compute_phase2_duals(&self, ctx: &mut Context, basis: &Basis) -> SimplexResult<()> {
        let c_basic: Vec<E> = ctx.basis_header.iter().map(|&v| ctx.c[v]).collect();
        ctx.y = transform::btran_costs(basis, &c_basic)?;
        for j in 0..ctx.n_total {
            ctx.d[j] = transform::reduced_cost(self.model, &ctx.c, &ctx.y, j);
        }
        Ok(())
    }

    /// Phase I composite objective is the sum of basic bound violations
    /// its gradient with respect to a basic variable is
    /// `-1` below its lower bound, `+1` above its upper bound, `0` feasible.
    /// Solving `B^T y = c_B^{phase1}` and `d_j = 0 - y^T a_j` gives the
    /// reduced costs that drive infeasibility to zero, reusing the same
    /// pricing/ratio-test/pivot machinery as Phase II.
    fn compute_phase1_duals(&self, ctx: &mut Context, basis: &Basis) -> SimplexResult<Vec<E>> {
        let tol = ctx.options.feasibility_tol;
        let c_basic: Vec<E> = ctx
            .basis_header
            .iter()
            .map(|&v| {
                let x = ctx.x[v];
                if x < ctx.l[v] - tol {
                    -1.0
                } else if x > ctx.u[v] + tol {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let y = transform::btran_costs(basis, &c_basic)?;
        let zero_c = vec![0.0; self.model.n_vars()];
        let d: Vec<E> = (0..ctx.n_total)
            .map(|j| transform::reduced_cost(self.model, &zero_c, &y, j))
            .collect();
        ctx.y = y;
        ctx.d.copy_from_slice(&d);
        Ok(d)
    }

    fn phase1_objective(&self, ctx: &Context) -> E {
        ctx.basis_header
            .iter()
            .map(|&v| (ctx.l[v] - ctx.x[v]).max(0.0) + (ctx.x[v] - ctx.u[v]).max(0.0))
            .sum()
    }

    /// A basic row currently violating its bound does not block further
    /// movement *toward* feasibility:
    /// its violated side is relaxed to infinity, its other side stays a
    /// real, enforced bound so the step cannot overshoot past feasibility.
    fn phase1_effective_bounds(&self, ctx: &Context) -> (Vec<E>, Vec<E>) {
        let tol = ctx.options.feasibility_tol;
        let mut lower = Vec::with_capacity(ctx.m);
        let mut upper = Vec::with_capacity(ctx.m);
        for &v in &ctx.basis_header {
            let x = ctx.x[v];
            lower.push(if x < ctx.l[v] - tol { -INFINITY } else { ctx.l[v] });
            upper.push(if x > ctx.u[v] + tol { INFINITY } else { ctx.u[v] });
        }
        (lower, upper)
    }

    fn primal_infeasibility(&self, ctx: &Context) -> E {
        ctx.basis_header
            .iter()
            .map(|&v| (ctx.l[v] - ctx.x[v]).max(0.0) + (ctx.x[v] - ctx.u[v]).max(0.0))
            .fold(0.0, E::max)
    }

    fn dual_infeasibility(&self, ctx: &Context) -> E {
        (0..ctx.n_total)
            .map(|j| match ctx.status[j] {
                AT_LOWER => (-ctx.d[j]).max(0.0),
                AT_UPPER => ctx.d[j].max(0.0),
                SUPERBASIC => ctx.d[j].abs(),
                _ => 0.0,
            })
            .fold(0.0, E::max)
    }

    /// Inner iteration loop, shared by both phases: the
    /// only per-phase difference is which reduced-cost vector drives
    /// pricing and what "no attractive variable" means.
    fn iterate(
        &self,
        ctx: &mut Context,
        basis: &mut Basis,
        pricing: &mut PricingEngine,
        hooks: &mut SolverHooks,
        phase: Phase,
    ) -> SimplexResult<Status> {
        let tau_f = ctx.options.feasibility_tol;
        let tau_pivot = ctx.options.pivot_tol;

        loop {
            if let Some(status) = hooks.terminator.terminate(ctx) {
                return Ok(status);
            }
            // Enforced directly off `ctx.options` rather than relying solely
            // on whatever terminators the caller happened to wire up into
            // `hooks` — `SolverHooks::silent()` builds its terminator from
            // default (unbounded) options, not `self.options`, so these
            // limits must hold even when the supplied terminator doesn't
            // know about them.
            if ctx.counters.iterations >= ctx.options.iter_limit {
                return Ok(Status::IterationLimit);
            }
            if ctx.elapsed() >= ctx.options.time_limit {
                return Ok(Status::TimeLimit);
            }
            hooks.callback.call(ctx);

            let d = match phase {
                Phase::Phase2 => {
                    self.compute_phase2_duals(ctx, basis)?;
                    ctx.d.clone()
                }
                Phase::Phase1 => self.compute_phase1_duals(ctx, basis)?,
                _ => unreachable!("iterate only ever runs Phase1/Phase2"),
            };

            let Some((entering_var, s)) = pricing.select_entering(&ctx.status, &d) else {
                return Ok(match phase {
                    Phase::Phase1 => {
                        if self.phase1_objective(ctx) <= tau_f {
                            Status::Optimal
                        } else {
                            Status::Infeasible
                        }
                    }
                    Phase::Phase2 => Status::Optimal,
                    _ => unreachable!(),
                });
            };

            let alpha = transform::ftran_column(basis, self.model, ctx.m, entering_var)?;

            let (lower_basic, upper_basic) = match phase {
                Phase::Phase1 => self.phase1_effective_bounds(ctx),
                _ => (
                    ctx.basis_header.iter().map(|&v| ctx.l[v]).collect(),
                    ctx.basis_header.iter().map(|&v| ctx.u[v]).collect(),
                ),
            };
            let x_basic: Vec<E> = ctx.basis_header.iter().map(|&v| ctx.x[v]).collect();

            let outcome = harris_ratio_test(
                &alpha,
                s,
                &x_basic,
                &lower_basic,
                &upper_basic,
                ctx.l[entering_var],
                ctx.u[entering_var],
                tau_f,
                tau_pivot,
            );

            let ratio = match outcome {
                RatioTestOutcome::Unbounded => {
                    return if phase == Phase::Phase2 {
                        ctx.unbounded_ray = Some(Self::unbounded_ray(ctx, &alpha, entering_var, s));
                        Ok(Status::Unbounded)
                    } else {
                        Err(SimplexError::invariant(
                            "phase 1 composite objective is bounded below by zero and should never report unbounded",
                        ))
                    };
                }
                RatioTestOutcome::Pivot(r) => r,
            };

            let drift = Self::drift_residual(self.model, &ctx.basis_header, &alpha, entering_var);

            pivot::apply_pivot(ctx, basis, pricing, entering_var, &alpha, s, &ratio)?;

            ctx.counters.iterations += 1;
            match phase {
                Phase::Phase1 => ctx.counters.phase1_iterations += 1,
                Phase::Phase2 => ctx.counters.phase2_iterations += 1,
                _ => {}
            }

            if basis.eta_count() >= ctx.options.refactor_freq || drift > ctx.options.drift_tol {
                if let RefactorOutcome::Numeric = self.refactor(ctx, basis)? {
                    return Ok(Status::Numeric);
                }
            }
        }
    }

    /// `||B alpha - a_entering||_inf`, reconstructed from the same column
    /// data the basis was built from rather than an explicit dense `B`.
    fn drift_residual(model: &Model, basis_header: &[I], alpha: &[E], entering: I) -> E {
        let m = alpha.len();
        let mut recon = vec![0.0; m];
        for (row_coef, &var) in alpha.iter().zip(basis_header.iter()) {
            if *row_coef == 0.0 {
                continue;
            }
            for (row, value) in transform::variable_column(model, var) {
                recon[row] += value * row_coef;
            }
        }
        let mut dense_entering = vec![0.0; m];
        for (row, value) in transform::variable_column(model, entering) {
            dense_entering[row] += value;
        }
        recon
            .iter()
            .zip(dense_entering.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, E::max)
    }

    /// Unboundedness certificate:
    /// `entering` moves by `s` per unit of the unconstrained step, and each
    /// basic row absorbs `-s * alpha_i` of it (the same relation the pivot
    /// executor would apply for a finite theta) — a direction every equality
    /// row stays satisfied along, with the entering variable's own sign
    /// respected and the objective improving without bound.
    fn unbounded_ray(ctx: &Context, alpha: &[E], entering: I, s: E) -> Vec<E> {
        let mut ray = vec![0.0; ctx.n_total];
        ray[entering] = s;
        for (row, &alpha_i) in alpha.iter().enumerate() {
            let basic_var = ctx.basis_header[row];
            ray[basic_var] -= s * alpha_i;
        }
        ray
    }

    fn finalize(&self, ctx: &mut Context) -> Solution {
        ctx.obj = ctx.c.iter().zip(ctx.x.iter()).map(|(c, x)| c * x).sum();
        Solution {
            x: ctx.x.clone(),
            d: ctx.d.clone(),
            y: ctx.y.clone(),
            obj: ctx.obj,
            basis_header: ctx.basis_header.clone(),
            variable_status: ctx.status.clone(),
            counters: ctx.counters.clone().into(),
            unbounded_ray: ctx.unbounded_ray.clone(),
        }
    }
}
