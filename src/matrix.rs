//! Sparse constraint matrix (C1): CSC is authoritative, a CSR view is
//! lazily built on first row query and invalidated on any mutation.
//!
//! CSC storage and the transpose-on-demand CSR view follow the shape of the
//! symbolic/numeric split already used by the basis's LU factorization
//! (`basis::lu`): cheap to rebuild, never mutated in place.

use crate::error::{SimplexError, SimplexResult};
use crate::{E, I};
use std::cell::RefCell;

/// Column-compressed sparse matrix with a lazily constructed row view.
///
/// Invariants (validated by [`ConstraintMatrix::validate`]):
/// - `col_ptr[0] == 0`, `col_ptr` is non-decreasing, `col_ptr[ncols] == nnz`.
/// - every row index is in `[0, nrows)`.
/// - row indices within a column are *not* required to be sorted.
pub struct ConstraintMatrix {
    nrows: usize,
    ncols: usize,
    col_ptr: Vec<I>,
    row_idx: Vec<I>,
    values: Vec<E>,
    /// Lazily built `(row_ptr, col_idx, row_values)`. `None` until the first
    /// row-oriented query after construction or after a mutation.
    row_view: RefCell<Option<RowView>>,
}

struct RowView {
    row_ptr: Vec<I>,
    col_idx: Vec<I>,
    row_values: Vec<E>,
}

impl ConstraintMatrix {
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<I>,
        row_idx: Vec<I>,
        values: Vec<E>,
    ) -> SimplexResult<Self> {
        let mat = Self {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values,
            row_view: RefCell::new(None),
        };
        mat.validate()?;
        Ok(mat)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn col_ptr(&self) -> &[I] {
        &self.col_ptr
    }

    /// Borrow the `(row_idx, values)` slices for column `j`.
    pub fn col(&self, j: I) -> (&[I], &[E]) {
        let start = self.col_ptr[j];
        let end = self.col_ptr[j + 1];
        (&self.row_idx[start..end], &self.values[start..end])
    }

    /// Checks the CSC format invariants: col_ptr shape and in-range rows.
    pub fn validate(&self) -> SimplexResult<()> {
        if self.col_ptr.len() != self.ncols + 1 {
            return Err(SimplexError::invariant("col_ptr length must be ncols + 1"));
        }
        if self.col_ptr[0] != 0 {
            return Err(SimplexError::invariant("col_ptr[0] must be 0"));
        }
        if *self.col_ptr.last().unwrap() != self.values.len() {
            return Err(SimplexError::invariant("col_ptr[ncols] must equal nnz"));
        }
        for w in self.col_ptr.windows(2) {
            if w[0] > w[1] {
                return Err(SimplexError::invariant("col_ptr must be non-decreasing"));
            }
        }
        if self.row_idx.len() != self.values.len() {
            return Err(SimplexError::invariant(
                "row_idx and values must have equal length",
            ));
        }
        for &r in &self.row_idx {
            if r >= self.nrows {
                return Err(SimplexError::invariant(format!(
                    "row index {r} out of range [0, {})",
                    self.nrows
                )));
            }
        }
        Ok(())
    }

    /// `y <- Ax` (or `y += Ax` if `accumulate`). Only columns with `x[j] !=
    /// 0` are touched, so the cost is proportional to the nonzeros of the
    /// active columns rather than the full matrix.
    pub fn mul(&self, x: &[E], y: &mut [E], accumulate: bool) {
        debug_assert_eq!(x.len(), self.ncols);
        debug_assert_eq!(y.len(), self.nrows);
        if !accumulate {
            y.fill(0.0);
        }
        for j in 0..self.ncols {
            let xj = x[j];
            if xj == 0.0 {
                continue;
            }
            let start = self.col_ptr[j];
            let end = self.col_ptr[j + 1];
            for k in start..end {
                y[self.row_idx[k]] += self.values[k] * xj;
            }
        }
    }

    /// `y <- A^T x` (or `y += A^T x` if `accumulate`), via the lazily built
    /// row view so each row's nonzeros are contiguous.
    pub fn tmul(&self, x: &[E], y: &mut [E], accumulate: bool) {
        debug_assert_eq!(x.len(), self.nrows);
        debug_assert_eq!(y.len(), self.ncols);
        self.ensure_row_view();
        let view = self.row_view.borrow();
        let view = view.as_ref().expect("row view just built");
        if !accumulate {
            y.fill(0.0);
        }
        for i in 0..self.nrows {
            let xi = x[i];
            if xi == 0.0 {
                continue;
            }
            let start = view.row_ptr[i];
            let end = view.row_ptr[i + 1];
            for k in start..end {
                y[view.col_idx[k]] += view.row_values[k] * xi;
            }
        }
    }

    /// Forces the row view to be (re)built. Exposed for tests that check
    /// the CSC/CSR round-trip law; normal use lazily builds it on first
    /// `tmul`/`row` call.
    pub fn ensure_row_view(&self) {
        if self.row_view.borrow().is_some() {
            return;
        }
        *self.row_view.borrow_mut() = Some(self.build_row_view());
    }

    /// Two-pass transpose: pass 1 counts entries per row into `row_ptr` and
    /// prefix-sums it; pass 2 scatters `(col_idx, row_values)` using a
    /// working copy of `row_ptr` as a per-row cursor. Column indices within
    /// each resulting row come out sorted ascending because columns are
    /// visited in increasing order during the scatter.
    fn build_row_view(&self) -> RowView {
        let nnz = self.values.len();
        let mut row_ptr = vec![0usize; self.nrows + 1];
        for &r in &self.row_idx {
            row_ptr[r + 1] += 1;
        }
        for i in 0..self.nrows {
            row_ptr[i + 1] += row_ptr[i];
        }

        let mut cursor = row_ptr.clone();
        let mut col_idx = vec![0usize; nnz];
        let mut row_values = vec![0.0; nnz];
        for j in 0..self.ncols {
            let start = self.col_ptr[j];
            let end = self.col_ptr[j + 1];
            for k in start..end {
                let r = self.row_idx[k];
                let dest = cursor[r];
                col_idx[dest] = j;
                row_values[dest] = self.values[k];
                cursor[r] += 1;
            }
        }

        RowView {
            row_ptr,
            col_idx,
            row_values,
        }
    }

    /// Invalidates the cached row view. No core operation currently mutates
    /// a `ConstraintMatrix` in place (the model is read-only for the
    /// duration of a solve), but this is kept so a future mutating API
    /// cannot silently serve a stale CSR view.
    pub fn invalidate_row_view(&self) {
        *self.row_view.borrow_mut() = None;
    }

    /// Binary-searches the (sorted) row for column `j`'s coefficient, `None`
    /// if absent. Only valid after the row view has been built.
    pub fn row_entry(&self, i: I, j: I) -> Option<E> {
        self.ensure_row_view();
        let view = self.row_view.borrow();
        let view = view.as_ref().unwrap();
        let start = view.row_ptr[i];
        let end = view.row_ptr[i + 1];
        view.col_idx[start..end]
            .binary_search(&j)
            .ok()
            .map(|offset| view.row_values[start + offset])
    }
}
