//! In-place dense linear algebra kernels for the constrained solve.
//!
//! Lower-triangular Cholesky and substitution routines operating on
//! borrowed storage; the dynamics hot path performs no allocation. Only
//! the lower triangles of the input matrices are read.

use nalgebra::{DMatrix, DVector};

/// Marker for a failed factorization (matrix not positive definite).
#[derive(Debug, Clone, Copy)]
pub(crate) struct NotPositiveDefinite;

/// In-place Cholesky (L·Lᵀ) factorization of the lower triangle of `m`.
///
/// On success the lower triangle holds L; the strict upper triangle is
/// left untouched.
pub(crate) fn cholesky_in_place(m: &mut DMatrix<f64>) -> Result<(), NotPositiveDefinite> {
    let n = m.nrows();
    for j in 0..n {
        // Diagonal: L[j,j] = sqrt(M[j,j] - Σ L[j,k]²)
        let mut diag = m[(j, j)];
        for k in 0..j {
            diag -= m[(j, k)] * m[(j, k)];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(NotPositiveDefinite);
        }
        let ljj = diag.sqrt();
        m[(j, j)] = ljj;

        // Off-diagonal: L[i,j] = (M[i,j] - Σ L[i,k]·L[j,k]) / L[j,j]
        for i in (j + 1)..n {
            let mut sum = m[(i, j)];
            for k in 0..j {
                sum -= m[(i, k)] * m[(j, k)];
            }
            m[(i, j)] = sum / ljj;
        }
    }
    Ok(())
}

/// In-place Cholesky of a positive *semi*definite matrix.
///
/// Negligible pivots (structurally redundant constraint rows produce
/// exactly-zero rows) are zeroed out; the paired
/// [`cholesky_solve_semidefinite`] then assigns zero to the corresponding
/// solution entries. A pivot that is negative beyond roundoff tolerance
/// still fails: the matrix is genuinely indefinite.
pub(crate) fn cholesky_in_place_semidefinite(
    m: &mut DMatrix<f64>,
) -> Result<(), NotPositiveDefinite> {
    let n = m.nrows();
    let mut max_diag = 0.0_f64;
    for j in 0..n {
        max_diag = max_diag.max(m[(j, j)].abs());
    }
    let tol = 1e-12 * max_diag.max(1.0);

    for j in 0..n {
        let mut diag = m[(j, j)];
        for k in 0..j {
            diag -= m[(j, k)] * m[(j, k)];
        }
        if !diag.is_finite() || diag < -1e-8 * max_diag.max(1.0) {
            return Err(NotPositiveDefinite);
        }
        if diag <= tol {
            // Redundant direction: zero the pivot and its column.
            m[(j, j)] = 0.0;
            for i in (j + 1)..n {
                m[(i, j)] = 0.0;
            }
            continue;
        }
        let ljj = diag.sqrt();
        m[(j, j)] = ljj;
        for i in (j + 1)..n {
            let mut sum = m[(i, j)];
            for k in 0..j {
                sum -= m[(i, k)] * m[(j, k)];
            }
            m[(i, j)] = sum / ljj;
        }
    }
    Ok(())
}

/// Solve `L·Lᵀ·x = b` for a semidefinite factor from
/// [`cholesky_in_place_semidefinite`]; entries in redundant directions are
/// set to zero.
pub(crate) fn cholesky_solve_semidefinite(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();
    for j in 0..n {
        if l[(j, j)] == 0.0 {
            x[j] = 0.0;
            continue;
        }
        for k in 0..j {
            let xk = x[k];
            x[j] -= l[(j, k)] * xk;
        }
        x[j] /= l[(j, j)];
    }
    for j in (0..n).rev() {
        if l[(j, j)] == 0.0 {
            x[j] = 0.0;
            continue;
        }
        for k in (j + 1)..n {
            let xk = x[k];
            x[j] -= l[(k, j)] * xk;
        }
        x[j] /= l[(j, j)];
    }
}

/// Forward substitution `L·y = b`, overwriting `x` (on entry `b`).
pub(crate) fn forward_substitute(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();
    for j in 0..n {
        for k in 0..j {
            let xk = x[k];
            x[j] -= l[(j, k)] * xk;
        }
        x[j] /= l[(j, j)];
    }
}

/// Forward substitution on a raw row buffer (used for `L·Yᵀ = Kᵀ`, one
/// constraint row at a time).
pub(crate) fn forward_substitute_slice(l: &DMatrix<f64>, x: &mut [f64]) {
    let n = l.nrows();
    debug_assert_eq!(x.len(), n);
    for j in 0..n {
        for k in 0..j {
            let xk = x[k];
            x[j] -= l[(j, k)] * xk;
        }
        x[j] /= l[(j, j)];
    }
}

/// Solve `L·Lᵀ·x = b` in place, with L in the lower triangle of `l`.
pub(crate) fn cholesky_solve_in_place(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();
    // Forward: L·y = b
    forward_substitute(l, x);
    // Backward: Lᵀ·x = y
    for j in (0..n).rev() {
        for k in (j + 1)..n {
            let xk = x[k];
            x[j] -= l[(k, j)] * xk;
        }
        x[j] /= l[(j, j)];
    }
}
