//! Dynamics algorithms: mass matrix, Newton–Euler recursion, loop
//! constraints, and the constrained forward-dynamics solve.

pub mod constraint;
pub mod crba;
pub mod rnea;
pub mod solve;

pub use constraint::constraint_jacobian_and_bias_into;
pub use crba::{mass_matrix, mass_matrix_into};
pub use rnea::{
    dynamics_bias, dynamics_bias_into, inverse_dynamics, inverse_dynamics_into,
    newton_euler_into, spatial_accelerations_into,
};
pub use solve::dynamics_solve;

use nalgebra::DVector;

use mech_spatial::Wrench;

use crate::contact::contact_dynamics;
use crate::error::Result;
use crate::results::DynamicsResult;
use crate::state::MechanismState;

/// Constrained forward dynamics.
///
/// Pipeline, in order:
///
/// 1. contact dynamics (wrenches + contact-state derivatives),
/// 2. total external wrenches (user + contact),
/// 3. dynamics bias `c(q, v, w_ext)`,
/// 4. mass matrix `M(q)`,
/// 5. loop-constraint Jacobian `K` and bias `k`,
/// 6. KKT solve for `v̇` and `λ`.
///
/// `external_wrenches` are per-body, world-frame, indexed by topological
/// position (entry 0 is ignored).
///
/// # Errors
///
/// [`DynamicsError::UnsupportedJoint`](crate::DynamicsError::UnsupportedJoint)
/// from constraint assembly and
/// [`DynamicsError::Singular`](crate::DynamicsError::Singular) from the
/// solve.
///
/// # Panics
///
/// Panics on buffer-length mismatches.
pub fn dynamics(
    state: &mut MechanismState,
    result: &mut DynamicsResult,
    tau: &DVector<f64>,
    external_wrenches: &[Wrench],
) -> Result<()> {
    let mechanism = state.mechanism_arc();
    assert_eq!(tau.len(), mechanism.num_velocities(), "torque vector length");
    assert_eq!(
        external_wrenches.len(),
        mechanism.num_bodies(),
        "external wrench buffer length"
    );

    contact_dynamics(state, result);

    for k in 0..mechanism.num_bodies() {
        result.total_wrenches[k] = external_wrenches[k] + result.contact_wrenches[k];
    }

    {
        let DynamicsResult {
            dynamics_bias,
            accelerations,
            joint_wrenches,
            total_wrenches,
            ..
        } = result;
        dynamics_bias_into(state, dynamics_bias, accelerations, joint_wrenches, total_wrenches);
    }

    mass_matrix_into(state, &mut result.mass_matrix);
    constraint_jacobian_and_bias_into(
        state,
        &mut result.constraint_jacobian,
        &mut result.constraint_bias,
    )?;
    dynamics_solve(result, tau)
}

/// Allocating convenience form of [`dynamics`]: builds a fresh
/// [`DynamicsResult`], runs the pipeline, and returns it.
///
/// # Errors
///
/// Same as [`dynamics`].
pub fn dynamics_alloc(
    state: &mut MechanismState,
    tau: &DVector<f64>,
    external_wrenches: &[Wrench],
) -> Result<DynamicsResult> {
    let mut result = DynamicsResult::new(state.mechanism());
    dynamics(state, &mut result, tau, external_wrenches)?;
    Ok(result)
}
