//! FTRAN / BTRAN kernels (C3): the data-flow glue between the constraint
//! matrix (C1), the basis (C2), and the driver (C7). The actual forward/
//! backward substitution plus eta-chain walk lives on [`crate::basis::Basis`]
//! (it needs the chain's internals); this module is where a *variable*
//! (structural or logical) becomes the dense column FTRAN/BTRAN operate on.

use crate::basis::Basis;
use crate::error::SimplexResult;
use crate::model::Model;
use crate::{E, I};

/// The column of variable `var` in the working system: `A`'s column if
/// `var` is structural (`var < n`), otherwise the unit column for row
/// `var - n` scaled by that row's slack coefficient (`+1` for `<=`/`=`,
/// `-1` for `>=`). Used both to assemble the basis matrix at refactor
/// (`Basis::refactor`'s `column_of` callback) and to fetch the entering
/// column for FTRAN.
pub fn variable_column(model: &Model, var: I) -> Vec<(I, E)> {
    let n = model.n_vars();
    if var < n {
        let (rows, values) = model.matrix().col(var);
        rows.iter().copied().zip(values.iter().copied()).collect()
    } else {
        let row = var - n;
        let sense = model.senses()[row];
        vec![(row, model.slack_coefficient(sense))]
    }
}

/// FTRAN the entering column: gather `variable_column(model, var)` into a
/// dense length-`m` vector and solve `B * alpha = a_var`.
pub fn ftran_column(basis: &Basis, model: &Model, m: usize, var: I) -> SimplexResult<Vec<E>> {
    let mut dense = vec![0.0; m];
    for (row, value) in variable_column(model, var) {
        dense[row] += value;
    }
    basis.ftran(&dense)
}

/// BTRAN the basic costs: solve `y^T B = c_B^T`, i.e. `B^T y = c_B`.
pub fn btran_costs(basis: &Basis, c_basic: &[E]) -> SimplexResult<Vec<E>> {
    basis.btran(c_basic)
}

/// Reduced cost of variable `var`: `d_j = c_j - y^T A_j` (structural) or
/// `d_j = 0 - y^T (unit column)` (logical), using the already-BTRAN'd dual
/// vector `y`.
pub fn reduced_cost(model: &Model, c_working: &[E], y: &[E], var: I) -> E {
    let n = model.n_vars();
    let cj = if var < n { c_working[var] } else { 0.0 };
    let mut aty = 0.0;
    for (row, value) in variable_column(model, var) {
        aty += value * y[row];
    }
    cj - aty
}
