//! Harris two-pass ratio test (C4): given the FTRAN'd pivot column
//! `alpha` and the entering variable's step direction, selects the leaving
//! row and step length, trading a small, bounded feasibility violation
//! (`10 * tau_f`) for a numerically stable pivot element.

use crate::{E, I, is_infinite};

/// Outcome of the entering variable's own bound check and every
/// significant basic row, before pass 2 narrows to the stability winner.
struct Candidate {
    row: I,
    theta_relaxed: E,
    theta_exact: E,
    alpha: E,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioTestResult {
    /// `None` when the entering variable bound-flips with no basis change.
    pub leaving_row: Option<I>,
    pub pivot_element: E,
    pub theta: E,
    pub flip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatioTestOutcome {
    Unbounded,
    Pivot(RatioTestResult),
}

/// `alpha`: `FTRAN(A_j)`, one entry per basic row. `s`: entering variable's
/// step direction (`+1.0` moving up from its lower bound, `-1.0` moving
/// down from its upper bound). `lower_basic`/`upper_basic`: bounds of the
/// variable currently basic in each row. `entering_lower`/`entering_upper`:
/// the entering variable's own bounds (may be infinite).
#[allow(clippy::too_many_arguments)]
pub fn harris_ratio_test(
    alpha: &[E],
    s: E,
    x_basic: &[E],
    lower_basic: &[E],
    upper_basic: &[E],
    entering_lower: E,
    entering_upper: E,
    tau_f: E,
    tau_pivot: E,
) -> RatioTestOutcome {
    let m = alpha.len();
    let mut candidates = Vec::new();

    for i in 0..m {
        let signed = s * alpha[i];
        if signed.abs() <= tau_pivot {
            continue;
        }
        let bound = if signed > 0.0 { lower_basic[i] } else { upper_basic[i] };
        if is_infinite(bound) {
            continue;
        }
        let theta_exact = (x_basic[i] - bound) / signed;
        let theta_relaxed = theta_exact + 10.0 * tau_f / signed.abs();
        candidates.push(Candidate {
            row: i,
            theta_relaxed,
            theta_exact,
            alpha: alpha[i],
        });
    }

    let own_distance = if is_infinite(entering_lower) || is_infinite(entering_upper) {
        crate::INFINITY
    } else {
        entering_upper - entering_lower
    };

    let row_min = candidates
        .iter()
        .map(|c| c.theta_relaxed)
        .fold(E::INFINITY, E::min);
    let theta_star = row_min.min(own_distance).max(0.0);

    if is_infinite(theta_star) {
        // Neither a basic row nor the entering variable's own bounds limit
        // the step: the LP is unbounded in this direction.
        return RatioTestOutcome::Unbounded;
    }

    if own_distance <= theta_star {
        return RatioTestOutcome::Pivot(RatioTestResult {
            leaving_row: None,
            pivot_element: 0.0,
            theta: own_distance.max(0.0),
            flip: true,
        });
    }

    // Pass 2: among rows admissible within theta_star, pick the one with
    // the largest |alpha_i| for numerical stability; ties broken by
    // smallest row index for determinism.
    let mut best: Option<&Candidate> = None;
    for c in &candidates {
        if c.theta_exact > theta_star {
            continue;
        }
        best = match best {
            None => Some(c),
            Some(b) => {
                if c.alpha.abs() > b.alpha.abs()
                    || (c.alpha.abs() == b.alpha.abs() && c.row < b.row)
                {
                    Some(c)
                } else {
                    Some(b)
                }
            }
        };
    }

    match best {
        Some(c) => RatioTestOutcome::Pivot(RatioTestResult {
            leaving_row: Some(c.row),
            pivot_element: c.alpha,
            theta: c.theta_exact.max(0.0),
            flip: false,
        }),
        // theta_star came from a candidate's relaxed theta but no candidate
        // passed the exact-theta re-check (can happen only in pathological
        // degeneracy); fall back to the single smallest-relaxed-theta row.
        None => match candidates
            .iter()
            .min_by(|a, b| a.theta_relaxed.partial_cmp(&b.theta_relaxed).unwrap())
        {
            Some(c) => RatioTestOutcome::Pivot(RatioTestResult {
                leaving_row: Some(c.row),
                pivot_element: c.alpha,
                theta: 0.0,
                flip: false,
            }),
            None => RatioTestOutcome::Unbounded,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_when_no_row_and_entering_unbounded() {
        let outcome = harris_ratio_test(
            &[0.0, 0.0],
            1.0,
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[crate::INFINITY, crate::INFINITY],
            0.0,
            crate::INFINITY,
            1e-6,
            1e-10,
        );
        assert_eq!(outcome, RatioTestOutcome::Unbounded);
    }

    #[test]
    fn simple_pivot_picks_binding_row() {
        // x_basic = [5, 2], alpha = [1, 1], moving up (s=1): row 1 hits its
        // lower bound of 0 first (theta=2) vs row 0 (theta=5).
        let outcome = harris_ratio_test(
            &[1.0, 1.0],
            1.0,
            &[5.0, 2.0],
            &[0.0, 0.0],
            &[crate::INFINITY, crate::INFINITY],
            0.0,
            crate::INFINITY,
            1e-6,
            1e-10,
        );
        match outcome {
            RatioTestOutcome::Pivot(r) => {
                assert_eq!(r.leaving_row, Some(1));
                assert!((r.theta - 2.0).abs() < 1e-6);
                assert!(!r.flip);
            }
            _ => panic!("expected a pivot"),
        }
    }

    #[test]
    fn bound_flip_when_entering_range_is_tighter() {
        // Entering variable has range [0, 1]; basic rows would allow up to
        // theta=5, so the entering variable flips instead of pivoting.
        let outcome = harris_ratio_test(
            &[1.0],
            1.0,
            &[5.0],
            &[0.0],
            &[crate::INFINITY],
            0.0,
            1.0,
            1e-6,
            1e-10,
        );
        match outcome {
            RatioTestOutcome::Pivot(r) => {
                assert!(r.flip);
                assert_eq!(r.leaving_row, None);
                assert!((r.theta - 1.0).abs() < 1e-9);
            }
            _ => panic!("expected a flip"),
        }
    }

    #[test]
    fn stability_pass_prefers_larger_pivot_magnitude() {
        // Two rows tie on relaxed theta but row 0 has the larger |alpha|.
        let outcome = harris_ratio_test(
            &[2.0, 0.1],
            1.0,
            &[2.0, 0.1],
            &[0.0, 0.0],
            &[crate::INFINITY, crate::INFINITY],
            0.0,
            crate::INFINITY,
            1e-6,
            1e-10,
        );
        match outcome {
            RatioTestOutcome::Pivot(r) => assert_eq!(r.leaving_row, Some(0)),
            _ => panic!("expected a pivot"),
        }
    }
}
