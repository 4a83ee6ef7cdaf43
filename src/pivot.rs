//! Pivot executor (C5): given an entering variable, its FTRAN'd
//! column, and the ratio test's verdict, updates primal values and the
//! objective, appends an eta to the basis, flips variable status, and
//! nudges the pricing engine's caches.
//!
//! **Sign convention.** The ratio test writes its candidate ratios with an
//! explicit step direction `s` folded in, but a value-update formula written
//! as `x_B,i <- x_B,i - theta * alpha_i` drops it, leaving ambiguous whether
//! `alpha` already encodes the entering direction. This implementation
//! resolves it by keeping `s` explicit everywhere — `alpha` is always the
//! raw `FTRAN(A_j)` column, `s` is applied at the point of use — which keeps
//! the objective monotonicity invariant true independent of which bound the
//! entering variable starts from. See `DESIGN.md` for the write-up.

use crate::basis::Basis;
use crate::context::{self, Context};
use crate::error::SimplexResult;
use crate::pricing::PricingEngine;
use crate::ratio_test::RatioTestResult;
use crate::{E, I};

pub struct PivotOutcome {
    /// `None` for a bound flip (no basis change).
    pub leaving_var: Option<I>,
    pub entering: I,
}

/// Applies one iteration's pivot (or bound flip) to `ctx` and `basis`.
/// `s` is the entering variable's step direction, `alpha`
/// its FTRAN'd column, and `ratio` the [`crate::ratio_test::harris_ratio_test`]
/// verdict that selected this row/step.
pub fn apply_pivot(
    ctx: &mut Context,
    basis: &mut Basis,
    pricing: &mut PricingEngine,
    entering: I,
    alpha: &[E],
    s: E,
    ratio: &RatioTestResult,
) -> SimplexResult<PivotOutcome> {
    let theta = ratio.theta;

    // Step 1: value updates, applied to every basic row regardless of
    // whether this turns out to be a flip or a full pivot (a flip has
    // theta bounded by the entering variable's own bound distance, so
    // every basic row still moves by the right amount).
    for (row, &alpha_i) in alpha.iter().enumerate() {
        let basic_var = ctx.basis_header[row];
        ctx.x[basic_var] -= s * theta * alpha_i;
    }
    ctx.x[entering] += s * theta;
    ctx.obj += theta * s * ctx.d[entering];

    if ratio.flip {
        ctx.status[entering] = if s > 0.0 {
            context::AT_UPPER
        } else {
            context::AT_LOWER
        };
        return Ok(PivotOutcome {
            leaving_var: None,
            entering,
        });
    }

    let leaving_row = ratio
        .leaving_row
        .expect("non-flip ratio test result must name a leaving row");
    let pivot_elem = ratio.pivot_element;
    let departing = ctx.basis_header[leaving_row];

    let entries: Vec<(I, E)> = alpha
        .iter()
        .enumerate()
        .filter(|&(row, &a)| row != leaving_row && a != 0.0)
        .map(|(row, &a)| (row, a / pivot_elem))
        .collect();
    basis.append_eta(leaving_row, pivot_elem, entries);

    // The departing variable settles exactly on whichever bound it hit,
    // clearing any accumulated floating point drift from the value-update
    // loop above.
    let signed = s * pivot_elem;
    ctx.status[departing] = if (ctx.l[departing] - ctx.u[departing]).abs() <= 0.0 {
        context::FIXED
    } else if signed > 0.0 {
        context::AT_LOWER
    } else {
        context::AT_UPPER
    };
    ctx.x[departing] = if ctx.status[departing] == context::AT_UPPER {
        ctx.u[departing]
    } else {
        ctx.l[departing]
    };

    ctx.status[entering] = leaving_row as i64;
    ctx.basis_header[leaving_row] = entering;

    pricing.on_pivot(entering, departing, leaving_row, alpha);

    Ok(PivotOutcome {
        leaving_var: Some(departing),
        entering,
    })
}

/// Permanently substitutes `x_var = value`: folds its
/// contribution into the objective constant and the right-hand side, then
/// fixes its bounds so no pivot can ever reselect it. Provided for an
/// external presolve collaborator; the driver (C7) never calls this itself.
pub fn fix_variable(
    ctx: &mut Context,
    column: &[(I, E)],
    var: I,
    value: E,
    b: &mut [E],
    obj_constant: &mut E,
) {
    *obj_constant += ctx.c[var] * value;
    for &(row, coef) in column {
        b[row] -= coef * value;
    }
    ctx.l[var] = value;
    ctx.u[var] = value;
    ctx.status[var] = context::FIXED;
    ctx.x[var] = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingKind;

    fn identity_column(n: usize) -> impl Fn(I) -> Vec<(I, E)> {
        move |var: I| vec![(var - n, 1.0)]
    }

    #[test]
    fn pivot_updates_basis_header_and_status() {
        let m = 2;
        let mut basis = Basis::new(m);
        basis.refactor(&[10, 11], identity_column(10), 0).unwrap();

        let mut ctx = Context::new(
            &{
                use crate::matrix::ConstraintMatrix;
                use crate::model::Sense;
                let a = ConstraintMatrix::from_csc(2, 1, vec![0, 2], vec![0, 1], vec![1.0, 1.0])
                    .unwrap();
                crate::Model::new(
                    vec![-1.0],
                    a,
                    vec![5.0, 5.0],
                    vec![Sense::Le, Sense::Le],
                    vec![0.0],
                    vec![crate::INFINITY],
                )
                .unwrap()
            },
            crate::SimplexOptions::new(),
        );
        ctx.basis_header = vec![10, 11];
        ctx.d[0] = -1.0; // entering var 0 attractive at lower bound

        let mut pricing = PricingEngine::new(ctx.n_total, PricingKind::Dantzig, 1e-6);
        let alpha = [1.0, 1.0];
        let ratio = crate::ratio_test::RatioTestResult {
            leaving_row: Some(0),
            pivot_element: 1.0,
            theta: 5.0,
            flip: false,
        };

        let outcome =
            apply_pivot(&mut ctx, &mut basis, &mut pricing, 0, &alpha, 1.0, &ratio).unwrap();

        assert_eq!(outcome.leaving_var, Some(10));
        assert_eq!(ctx.basis_header[0], 0);
        assert_eq!(ctx.status[0], 0);
        assert_eq!(ctx.status[10], context::AT_LOWER);
        assert!((ctx.x[0] - 5.0).abs() < 1e-9);
        assert_eq!(basis.eta_count(), 1);
    }

    #[test]
    fn bound_flip_does_not_touch_basis() {
        let m = 1;
        let mut basis = Basis::new(m);
        basis.refactor(&[10], identity_column(10), 0).unwrap();

        let mut ctx = Context::new(
            &{
                use crate::matrix::ConstraintMatrix;
                use crate::model::Sense;
                let a = ConstraintMatrix::from_csc(1, 1, vec![0, 1], vec![0], vec![1.0]).unwrap();
                crate::Model::new(
                    vec![1.0],
                    a,
                    vec![5.0],
                    vec![Sense::Le],
                    vec![0.0],
                    vec![1.0],
                )
                .unwrap()
            },
            crate::SimplexOptions::new(),
        );
        ctx.basis_header = vec![10];

        let mut pricing = PricingEngine::new(ctx.n_total, PricingKind::Dantzig, 1e-6);
        let ratio = crate::ratio_test::RatioTestResult {
            leaving_row: None,
            pivot_element: 0.0,
            theta: 1.0,
            flip: true,
        };
        let alpha = [1.0];
        let outcome =
            apply_pivot(&mut ctx, &mut basis, &mut pricing, 0, &alpha, 1.0, &ratio).unwrap();

        assert_eq!(outcome.leaving_var, None);
        assert_eq!(basis.eta_count(), 0);
        assert_eq!(ctx.status[0], context::AT_UPPER);
    }
}
