//! Constrained forward-dynamics solve.
//!
//! Solves the KKT system
//!
//! ```text
//! [ M  Kᵀ ] [ v̇ ] = [ τ - c ]
//! [ K  0  ] [ λ ]   [ -k    ]
//! ```
//!
//! by Cholesky elimination: with `M = L·Lᵀ`, `Y = K·L⁻ᵀ` and
//! `A = Y·Yᵀ`, the multipliers solve `A·λ = Y·L⁻¹(τ - c) + k` and the
//! accelerations follow from back-substitution. Everything runs on the
//! preallocated scratch in [`DynamicsResult`]; no allocation.

use nalgebra::DVector;

use crate::error::{DynamicsError, Result};
use crate::linalg::{
    cholesky_in_place, cholesky_in_place_semidefinite, cholesky_solve_in_place,
    cholesky_solve_semidefinite, forward_substitute,
};
use crate::results::DynamicsResult;

/// Solve for `v̇` (and `λ` when constraints are present) given applied
/// joint torques `tau`.
///
/// Reads `result.mass_matrix` (lower triangle), `result.dynamics_bias`,
/// `result.constraint_jacobian`, and `result.constraint_bias`; writes
/// `result.vd` and `result.lambda`.
///
/// # Errors
///
/// [`DynamicsError::Singular`] when the mass matrix is not positive
/// definite, or when the constraint system `A = K·M⁻¹·Kᵀ` is rank
/// deficient.
///
/// # Panics
///
/// Panics if `tau` does not have `nv` entries.
pub fn dynamics_solve(result: &mut DynamicsResult, tau: &DVector<f64>) -> Result<()> {
    let nv = result.vd.len();
    let nc = result.lambda.len();
    assert_eq!(tau.len(), nv, "torque vector length");

    // τ' = τ - c
    result.tau_scratch.copy_from(tau);
    result.tau_scratch -= &result.dynamics_bias;

    // L·Lᵀ = M
    result.chol_l.copy_from(&result.mass_matrix);
    cholesky_in_place(&mut result.chol_l).map_err(|_| DynamicsError::Singular {
        what: "mass matrix",
    })?;

    if nc == 0 {
        result.vd.copy_from(&result.tau_scratch);
        cholesky_solve_in_place(&result.chol_l, &mut result.vd);
        return Ok(());
    }

    // Yᵀ = L⁻¹·Kᵀ, built one constraint row at a time.
    for r in 0..nc {
        for j in 0..nv {
            result.constraint_y[(r, j)] = result.constraint_jacobian[(r, j)];
        }
        // Row-major view of row r as a contiguous scratch is not
        // available from DMatrix; substitute in place through indexing.
        forward_substitute_row(&result.chol_l, &mut result.constraint_y, r);
    }

    // z = L⁻¹·τ'
    result.solve_z.copy_from(&result.tau_scratch);
    forward_substitute(&result.chol_l, &mut result.solve_z);

    // A = Y·Yᵀ (lower triangle), b = Y·z + k  (stored in λ).
    for i in 0..nc {
        for j in 0..=i {
            let mut sum = 0.0;
            for col in 0..nv {
                sum += result.constraint_y[(i, col)] * result.constraint_y[(j, col)];
            }
            result.constraint_a[(i, j)] = sum;
        }
        let mut b = result.constraint_bias[i];
        for col in 0..nv {
            b += result.constraint_y[(i, col)] * result.solve_z[col];
        }
        result.lambda[i] = b;
    }

    // A is only positive *semi*definite when loop constraints carry
    // structurally redundant rows (e.g. planar loops); zero-pivot rows get
    // zero multipliers, while a genuinely indefinite A still fails.
    cholesky_in_place_semidefinite(&mut result.constraint_a).map_err(|_| {
        DynamicsError::Singular {
            what: "constraint matrix",
        }
    })?;
    cholesky_solve_semidefinite(&result.constraint_a, &mut result.lambda);

    // τ' ← τ' - Kᵀ·λ, then M·v̇ = τ'.
    for j in 0..nv {
        let mut dot = 0.0;
        for i in 0..nc {
            dot += result.constraint_jacobian[(i, j)] * result.lambda[i];
        }
        result.tau_scratch[j] -= dot;
    }
    result.vd.copy_from(&result.tau_scratch);
    cholesky_solve_in_place(&result.chol_l, &mut result.vd);
    Ok(())
}

/// Forward-substitute `L` against row `r` of `y` in place:
/// `y[r, :] ← y[r, :]·L⁻ᵀ`, i.e. solves `L·x = y[r, :]ᵀ`.
fn forward_substitute_row(l: &nalgebra::DMatrix<f64>, y: &mut nalgebra::DMatrix<f64>, r: usize) {
    let n = l.nrows();
    for j in 0..n {
        let mut sum = y[(r, j)];
        for k in 0..j {
            sum -= l[(j, k)] * y[(r, k)];
        }
        y[(r, j)] = sum / l[(j, j)];
    }
}
