//! Preallocated output and scratch buffers for the dynamics pipeline.

use nalgebra::{DMatrix, DVector};

use mech_spatial::{SpatialAcceleration, Wrench};

use crate::mechanism::Mechanism;

/// Outputs and scratch storage for [`dynamics`](crate::dynamics) and its
/// sub-algorithms.
///
/// All buffers are allocated once, at construction; the solver and the
/// recursions never allocate. Create one per state you simulate and reuse
/// it across steps.
pub struct DynamicsResult {
    /// Joint accelerations `v̇` (length `nv`).
    pub vd: DVector<f64>,
    /// Loop-constraint multipliers `λ` (length `num_constraints`).
    pub lambda: DVector<f64>,
    /// Joint-space mass matrix; only the lower triangle is written.
    pub mass_matrix: DMatrix<f64>,
    /// Dynamics bias `c(q, v, w_ext)` (length `nv`).
    pub dynamics_bias: DVector<f64>,
    /// Loop-constraint Jacobian `K` (`num_constraints × nv`).
    pub constraint_jacobian: DMatrix<f64>,
    /// Loop-constraint bias `k` (length `num_constraints`).
    pub constraint_bias: DVector<f64>,
    /// Per-body spatial accelerations (recursion scratch / output).
    pub accelerations: Vec<SpatialAcceleration>,
    /// Per-body joint wrenches (recursion scratch / output).
    pub joint_wrenches: Vec<Wrench>,
    /// Per-body contact wrenches accumulated from the environment.
    pub contact_wrenches: Vec<Wrench>,
    /// Per-body total external wrenches (user + contact).
    pub total_wrenches: Vec<Wrench>,
    /// Contact-state derivative `ṡ`, for the caller's integrator.
    pub contact_state_derivative: DVector<f64>,

    // Factorization scratch for the constrained solve.
    pub(crate) chol_l: DMatrix<f64>,
    pub(crate) constraint_a: DMatrix<f64>,
    pub(crate) constraint_y: DMatrix<f64>,
    pub(crate) solve_z: DVector<f64>,
    pub(crate) tau_scratch: DVector<f64>,
}

impl DynamicsResult {
    /// Bare buffers with no per-body storage; used by solver unit tests.
    #[cfg(test)]
    pub(crate) fn new_raw(nv: usize, nc: usize) -> Self {
        Self {
            vd: DVector::zeros(nv),
            lambda: DVector::zeros(nc),
            mass_matrix: DMatrix::zeros(nv, nv),
            dynamics_bias: DVector::zeros(nv),
            constraint_jacobian: DMatrix::zeros(nc, nv),
            constraint_bias: DVector::zeros(nc),
            accelerations: Vec::new(),
            joint_wrenches: Vec::new(),
            contact_wrenches: Vec::new(),
            total_wrenches: Vec::new(),
            contact_state_derivative: DVector::zeros(0),
            chol_l: DMatrix::zeros(nv, nv),
            constraint_a: DMatrix::zeros(nc, nc),
            constraint_y: DMatrix::zeros(nc, nv),
            solve_z: DVector::zeros(nv),
            tau_scratch: DVector::zeros(nv),
        }
    }

    /// Allocate buffers sized for `mechanism`.
    #[must_use]
    pub fn new(mechanism: &Mechanism) -> Self {
        let nv = mechanism.num_velocities();
        let nb = mechanism.num_bodies();
        let nc = mechanism.num_constraints();
        let root = mechanism.root_frame();

        let accelerations = mechanism
            .bodies()
            .iter()
            .map(|b| SpatialAcceleration::zero(b.default_frame(), root, root))
            .collect();
        let zero_wrenches = || vec![Wrench::zero(root); nb];

        Self {
            vd: DVector::zeros(nv),
            lambda: DVector::zeros(nc),
            mass_matrix: DMatrix::zeros(nv, nv),
            dynamics_bias: DVector::zeros(nv),
            constraint_jacobian: DMatrix::zeros(nc, nv),
            constraint_bias: DVector::zeros(nc),
            accelerations,
            joint_wrenches: zero_wrenches(),
            contact_wrenches: zero_wrenches(),
            total_wrenches: zero_wrenches(),
            contact_state_derivative: DVector::zeros(mechanism.num_contact_states()),
            chol_l: DMatrix::zeros(nv, nv),
            constraint_a: DMatrix::zeros(nc, nc),
            constraint_y: DMatrix::zeros(nc, nv),
            solve_z: DVector::zeros(nv),
            tau_scratch: DVector::zeros(nv),
        }
    }
}
