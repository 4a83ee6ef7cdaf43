//! Sparse LU factorization of the basis matrix, via `faer`'s simplicial LU
//! (COLAMD fill-reducing ordering, then numeric factorization with partial
//! pivoting), surfacing this crate's [`SimplexError`] instead of a `Problem`.

use faer::dyn_stack::{MemBuffer, MemStack};
use faer::perm::Perm;
use faer::prelude::{Reborrow, ReborrowMut};
use faer::sparse::SparseColMatRef;
use faer::sparse::linalg::colamd;
use faer::sparse::linalg::lu::simplicial::{self, SimplicialLu};
use faer::{Mat, MatMut, MatRef};

use crate::error::{SimplexError, SimplexResult};
use crate::linalg::solver::Solver;
use crate::{E, I};

/// Sparse LU solver for the m×m basis matrix. Re-analyzed and re-factorized
/// from scratch at every refactorization point: the column set of
/// the basis changes pivot to pivot, so there is no stable symbolic phase
/// to amortize across refactors the way there would be for a fixed-sparsity
/// Newton system.
#[allow(non_snake_case)]
pub struct SimplicialSparseLu {
    lu: Option<SimplicialLu<I, E>>,
    row_perm: Option<Perm<I>>,
    col_perm: Option<Perm<I>>,
}

impl Solver for SimplicialSparseLu {
    fn new() -> Self {
        Self {
            lu: None,
            row_perm: None,
            col_perm: None,
        }
    }

    fn factorize(&mut self, mat: SparseColMatRef<I, E>) -> SimplexResult<()> {
        let nrows = mat.nrows();
        let ncols = mat.ncols();
        let nnz = mat.compute_nnz();

        let (col_perm_fwd, col_perm_inv) = {
            let mut perm = vec![0usize; ncols];
            let mut perm_inv = vec![0usize; ncols];

            let mut mem = MemBuffer::try_new(colamd::order_scratch::<usize>(nrows, ncols, nnz))
                .map_err(|_| SimplexError::OutOfMemory)?;

            colamd::order(
                &mut perm,
                &mut perm_inv,
                mat.symbolic(),
                colamd::Control::default(),
                MemStack::new(&mut mem),
            )
            .map_err(|_| SimplexError::SingularBasis { attempt: 0 })?;

            (perm, perm_inv)
        };
        let col_perm = unsafe {
            Perm::new_unchecked(
                col_perm_fwd.into_boxed_slice(),
                col_perm_inv.into_boxed_slice(),
            )
        };

        let mut row_perm = vec![0usize; nrows];
        let mut row_perm_inv = vec![0usize; nrows];
        let mut lu = SimplicialLu::new();

        let mut mem = MemBuffer::try_new(simplicial::factorize_simplicial_numeric_lu_scratch::<
            I,
            E,
        >(nrows, ncols))
        .map_err(|_| SimplexError::OutOfMemory)?;
        let mut stack = MemStack::new(&mut mem);

        simplicial::factorize_simplicial_numeric_lu::<I, E>(
            &mut row_perm,
            &mut row_perm_inv,
            &mut lu,
            mat.rb(),
            col_perm.as_ref(),
            &mut stack,
        )
        .map_err(|_| SimplexError::SingularBasis { attempt: 0 })?;

        self.row_perm =
            Some(unsafe { Perm::new_unchecked(row_perm.into_boxed_slice(), row_perm_inv.into_boxed_slice()) });
        self.col_perm = Some(col_perm);
        self.lu = Some(lu);

        Ok(())
    }

    fn solve_in_place(&self, sol: &mut MatMut<E>) -> SimplexResult<()> {
        let lu = self
            .lu
            .as_ref()
            .ok_or_else(|| SimplexError::invariant("LU factorization not computed"))?;
        let row_perm = self
            .row_perm
            .as_ref()
            .ok_or_else(|| SimplexError::invariant("row permutation not computed"))?;
        let col_perm = self
            .col_perm
            .as_ref()
            .ok_or_else(|| SimplexError::invariant("column permutation not computed"))?;

        let nrows = lu.nrows();
        let nrhs = sol.ncols();
        let mut work = Mat::zeros(nrows, nrhs);

        lu.solve_in_place_with_conj(
            row_perm.as_ref(),
            col_perm.as_ref(),
            faer::Conj::No,
            sol.rb_mut(),
            faer::Par::Seq,
            work.as_mut(),
        );

        Ok(())
    }

    fn solve(&self, b: MatRef<E>) -> SimplexResult<Mat<E>> {
        let mut sol = Mat::zeros(b.nrows(), b.ncols());
        sol.copy_from(b);
        self.solve_in_place(&mut sol.as_mut())?;
        Ok(sol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::sparse::{SparseColMat, Triplet};

    fn tridiagonal(n: usize) -> SparseColMat<I, E> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push(Triplet::new(i, i, 4.0));
            if i + 1 < n {
                triplets.push(Triplet::new(i, i + 1, -1.0));
                triplets.push(Triplet::new(i + 1, i, -1.0));
            }
        }
        SparseColMat::try_new_from_triplets(n, n, &triplets).unwrap()
    }

    #[test]
    fn factorize_then_solve_recovers_rhs() {
        let mat = tridiagonal(4);
        let mut solver = SimplicialSparseLu::new();
        solver.factorize(mat.as_ref()).unwrap();

        let b = Mat::from_fn(4, 1, |i, _| (i + 1) as E);
        let x = solver.solve(b.as_ref()).unwrap();

        let mut check = Mat::zeros(4, 1);
        faer::linalg::matmul::matmul(
            check.as_mut(),
            faer::Accum::Replace,
            &mat,
            x.as_ref(),
            1.0,
            faer::Par::Seq,
        );
        for i in 0..4 {
            assert!((check[(i, 0)] - b[(i, 0)]).abs() < 1e-9);
        }
    }

    #[test]
    fn singular_matrix_reports_error() {
        let triplets = vec![
            Triplet::new(0, 0, 1.0),
            Triplet::new(1, 0, 2.0),
            Triplet::new(0, 1, 2.0),
            Triplet::new(1, 1, 4.0),
        ];
        let mat = SparseColMat::try_new_from_triplets(2, 2, &triplets).unwrap();
        let mut solver = SimplicialSparseLu::new();
        assert!(solver.factorize(mat.as_ref()).is_err());
    }
}
