//! Microbenchmarks for the hot path of one simplex iteration: FTRAN, BTRAN,
//! and the pivot executor's eta append, on a synthetic banded basis.
//!
//! Uses `divan` with no harness, scaled down to the core's own primitives
//! since the netlib loaders that would otherwise drive these benchmarks are
//! out of scope here.

use pfi_simplex::basis::Basis;
use pfi_simplex::{E, I};

fn main() {
    divan::main();
}

/// `m x m` basis with a tridiagonal structure (4 on the diagonal, -1 off),
/// factorized once and reused across iterations within a benchmark.
fn tridiagonal_basis(m: usize) -> Basis {
    let mut basis = Basis::new(m);
    let col = move |var: I| -> Vec<(I, E)> {
        let mut entries = vec![(var, 4.0)];
        if var > 0 {
            entries.push((var - 1, -1.0));
        }
        if var + 1 < m {
            entries.push((var + 1, -1.0));
        }
        entries
    };
    basis.refactor(&(0..m).collect::<Vec<_>>(), col, 0).unwrap();
    basis
}

#[divan::bench(args = [32, 128, 512])]
fn ftran_no_etas(m: usize) {
    let basis = tridiagonal_basis(m);
    let a: Vec<E> = (0..m).map(|i| (i + 1) as E).collect();
    divan::black_box(basis.ftran(&a).unwrap());
}

#[divan::bench(args = [32, 128, 512])]
fn btran_no_etas(m: usize) {
    let basis = tridiagonal_basis(m);
    let c: Vec<E> = vec![1.0; m];
    divan::black_box(basis.btran(&c).unwrap());
}

/// FTRAN/BTRAN cost after accumulating a chain of etas, just under the
/// default `refactor_freq` threshold — the worst case the driver
/// tolerates before forcing a refactor.
#[divan::bench(args = [32, 128])]
fn ftran_with_eta_chain(m: usize) {
    let mut basis = tridiagonal_basis(m);
    for k in 0..90usize.min(m) {
        let pivot_row = k % m;
        let entries: Vec<(I, E)> = (0..m)
            .filter(|&i| i != pivot_row)
            .map(|i| (i, 0.01 * ((i + k) as E)))
            .collect();
        basis.append_eta(pivot_row, 2.0, entries);
    }
    let a: Vec<E> = (0..m).map(|i| (i + 1) as E).collect();
    divan::black_box(basis.ftran(&a).unwrap());
}
