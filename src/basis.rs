//! Basis state (C2): `B^-1` represented in product form — an LU
//! factorization at the last refactorization point, composed with an
//! append-only chain of elementary eta matrices.
//!
//! The LU factorization itself is delegated to `faer`'s sparse simplicial
//! LU (`crate::linalg::lu`) rather than re-deriving general sparse Gaussian
//! elimination; only the eta chain — which has no library equivalent here —
//! is hand-rolled.

use faer::Mat;
use faer::sparse::{SparseColMat, Triplet};

use crate::error::{SimplexError, SimplexResult};
use crate::linalg::lu::SimplicialSparseLu;
use crate::linalg::solver::Solver;
use crate::{E, I};

/// A single elementary matrix, differing from the identity in column
/// `pivot_row`: `pivot_elem` on the diagonal, `entries` (row, value) off it.
/// `value` at `(i, v)` is `alpha_i / alpha_r`, per the pivot executor's
/// construction rule.
#[derive(Debug, Clone)]
pub struct Eta {
    pub pivot_row: I,
    pub pivot_elem: E,
    pub entries: Vec<(I, E)>,
}

/// Append-only store for the eta chain. A bump arena reset on refactor is
/// the intended storage strategy; the safe-Rust translation used here is a
/// `Vec<Eta>` cleared (not reallocated) on refactor, which gives the same
/// "one bulk deallocation, no per-node free" behavior without hand-rolled
/// unsafe allocation.
#[derive(Debug, Default)]
pub struct EtaArena {
    etas: Vec<Eta>,
}

impl EtaArena {
    pub fn new() -> Self {
        Self { etas: Vec::new() }
    }

    pub fn push(&mut self, eta: Eta) {
        self.etas.push(eta);
    }

    pub fn len(&self) -> usize {
        self.etas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.etas.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Eta> {
        self.etas.iter()
    }

    /// Resets the chain to empty, retaining the backing allocation — the
    /// arena-reset step of a refactorization.
    pub fn reset(&mut self) {
        self.etas.clear();
    }
}

/// `B^-1 = E_k ... E_1 U^-1 L^-1`. Owns the eta chain and the two LU
/// factorizations needed by FTRAN/BTRAN: one of `B` (forward substitution)
/// and one of `B^T` (backward substitution), refactorized together.
/// Keeping a second, independently factorized transpose avoids depending on
/// a transpose-solve entry point on the sparse LU type.
pub struct Basis {
    m: usize,
    lu_forward: SimplicialSparseLu,
    lu_backward: SimplicialSparseLu,
    etas: EtaArena,
    refactor_count: usize,
}

impl Basis {
    pub fn new(m: usize) -> Self {
        Self {
            m,
            lu_forward: SimplicialSparseLu::new(),
            lu_backward: SimplicialSparseLu::new(),
            etas: EtaArena::new(),
            refactor_count: 0,
        }
    }

    pub fn eta_count(&self) -> usize {
        self.etas.len()
    }

    pub fn refactor_count(&self) -> usize {
        self.refactor_count
    }

    pub fn etas(&self) -> &EtaArena {
        &self.etas
    }

    /// Recomputes the LU factorization of `B` (and of `B^T`) from the
    /// basis header, clearing the eta chain. `basis_header[r]` gives
    /// the variable occupying row `r`; `column_of` returns that variable's
    /// column in `A` (or the logical unit column for a slack/artificial),
    /// as `(row, value)` pairs.
    pub fn refactor(
        &mut self,
        basis_header: &[I],
        column_of: impl Fn(I) -> Vec<(I, E)>,
        attempt: u8,
    ) -> SimplexResult<()> {
        let m = self.m;
        debug_assert_eq!(basis_header.len(), m);

        let mut fwd_triplets = Vec::new();
        let mut bwd_triplets = Vec::new();
        for (col, &var) in basis_header.iter().enumerate() {
            for (row, value) in column_of(var) {
                if row >= m {
                    return Err(SimplexError::invariant(format!(
                        "basis column for variable {var} has row index {row} out of range [0, {m})"
                    )));
                }
                fwd_triplets.push(Triplet::new(row, col, value));
                bwd_triplets.push(Triplet::new(col, row, value));
            }
        }

        let b_mat = SparseColMat::try_new_from_triplets(m, m, &fwd_triplets)
            .map_err(|_| SimplexError::invariant("failed to assemble basis matrix"))?;
        let bt_mat = SparseColMat::try_new_from_triplets(m, m, &bwd_triplets)
            .map_err(|_| SimplexError::invariant("failed to assemble transposed basis matrix"))?;

        self.lu_forward
            .factorize(b_mat.as_ref())
            .map_err(|_| SimplexError::SingularBasis { attempt })?;
        self.lu_backward
            .factorize(bt_mat.as_ref())
            .map_err(|_| SimplexError::SingularBasis { attempt })?;

        self.etas.reset();
        self.refactor_count += 1;
        Ok(())
    }

    pub fn append_eta(&mut self, pivot_row: I, pivot_elem: E, entries: Vec<(I, E)>) {
        self.etas.push(Eta {
            pivot_row,
            pivot_elem,
            entries,
        });
    }

    /// `B x = a`: solve against the LU of `B`, then walk the eta chain
    /// oldest-to-newest.
    pub fn ftran(&self, a: &[E]) -> SimplexResult<Vec<E>> {
        let mut v = self.lu_solve(&self.lu_forward, a)?;
        for eta in self.etas.iter() {
            let temp = v[eta.pivot_row];
            v[eta.pivot_row] = temp / eta.pivot_elem;
            for &(i, e) in &eta.entries {
                v[i] -= e * temp;
            }
        }
        Ok(v)
    }

    /// `B^T y = c`: walk the eta chain newest-to-oldest (each acting as its
    /// own transpose, touching only the pivot row), then solve against the
    /// LU of `B^T`.
    pub fn btran(&self, c: &[E]) -> SimplexResult<Vec<E>> {
        let mut v = c.to_vec();
        for eta in self.etas.iter().rev() {
            let temp: E = eta.entries.iter().map(|&(i, e)| e * v[i]).sum();
            v[eta.pivot_row] = (v[eta.pivot_row] - temp) / eta.pivot_elem;
        }
        self.lu_solve(&self.lu_backward, &v)
    }

    fn lu_solve(&self, lu: &SimplicialSparseLu, rhs: &[E]) -> SimplexResult<Vec<E>> {
        let b = Mat::from_fn(self.m, 1, |i, _| rhs[i]);
        let x = lu.solve(b.as_ref())?;
        Ok((0..self.m).map(|i| x[(i, 0)]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// basis_header entries `>= n` name the logical (slack) column for row
    /// `var - n`: a unit vector, coefficient `+1`.
    fn identity_column(n: usize) -> impl Fn(I) -> Vec<(I, E)> {
        move |var: I| vec![(var - n, 1.0)]
    }

    #[test]
    fn ftran_btran_identity_basis_is_exact() {
        let m = 3;
        let mut basis = Basis::new(m);
        let header: Vec<I> = (0..m).map(|i| 10 + i).collect();
        basis.refactor(&header, identity_column(10), 0).unwrap();

        let a = vec![2.0, -3.0, 5.0];
        let x = basis.ftran(&a).unwrap();
        assert_eq!(x, a);

        let c = vec![1.0, 1.0, 1.0];
        let y = basis.btran(&c).unwrap();
        assert_eq!(y, c);
    }

    #[test]
    fn ftran_matches_dense_tridiagonal_inverse() {
        // B = [[4,-1,0],[-1,4,-1],[0,-1,4]]
        let m = 3;
        let mut basis = Basis::new(m);
        let col = |var: I| -> Vec<(I, E)> {
            match var {
                0 => vec![(0, 4.0), (1, -1.0)],
                1 => vec![(0, -1.0), (1, 4.0), (2, -1.0)],
                2 => vec![(1, -1.0), (2, 4.0)],
                _ => unreachable!(),
            }
        };
        basis.refactor(&[0, 1, 2], col, 0).unwrap();

        let a = vec![1.0, 2.0, 3.0];
        let x = basis.ftran(&a).unwrap();

        // Bx should recover a.
        let bx = [
            4.0 * x[0] - x[1],
            -x[0] + 4.0 * x[1] - x[2],
            -x[1] + 4.0 * x[2],
        ];
        for i in 0..3 {
            assert!((bx[i] - a[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn eta_chain_roundtrips_after_append() {
        let m = 2;
        let mut basis = Basis::new(m);
        basis.refactor(&[10, 11], identity_column(10), 0).unwrap();

        // Pivot: entering column alpha = [2.0, 1.0] in row 0.
        let alpha = [2.0, 1.0];
        let pivot_row = 0;
        let pivot_elem = alpha[pivot_row];
        let entries: Vec<(I, E)> = (0..m)
            .filter(|&i| i != pivot_row)
            .map(|i| (i, alpha[i] / pivot_elem))
            .collect();
        basis.append_eta(pivot_row, pivot_elem, entries);
        assert_eq!(basis.eta_count(), 1);

        let a = vec![2.0, 1.0];
        let x = basis.ftran(&a).unwrap();
        // B_new^-1 * (original column) should be e_0 (the entering column
        // becomes the new basic column at row 0).
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!(x[1].abs() < 1e-9);
    }

    #[test]
    fn singular_basis_is_reported() {
        let m = 2;
        let mut basis = Basis::new(m);
        // Two identical columns: singular.
        let col = |_var: I| -> Vec<(I, E)> { vec![(0, 1.0), (1, 2.0)] };
        let err = basis.refactor(&[0, 1], col, 0).unwrap_err();
        assert!(matches!(err, SimplexError::SingularBasis { attempt: 0 }));
    }
}
