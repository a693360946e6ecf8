//! Newton–Euler recursion: spatial accelerations, body wrenches, inverse
//! dynamics, and the dynamics bias.
//!
//! Featherstone Chapter 5. The root is seeded with `-gravity` so gravity
//! enters every body wrench through the forward pass; the backward pass
//! accumulates joint wrenches toward the root and projects them onto the
//! joint motion subspaces.

use nalgebra::{DVector, Vector3};

use mech_spatial::{SpatialAcceleration, Wrench};

use crate::error::{DynamicsError, Result};
use crate::mechanism::{BodyId, JointId};
use crate::state::MechanismState;

/// Forward pass shared by [`spatial_accelerations_into`],
/// [`inverse_dynamics_into`], and [`dynamics_bias_into`]; `vd = None`
/// means `v̇ = 0`.
fn accelerations_pass(
    state: &mut MechanismState,
    out: &mut [SpatialAcceleration],
    vd: Option<&DVector<f64>>,
) {
    state.ensure_bias_accelerations();
    state.ensure_motion_subspaces();
    let mechanism = state.mechanism_arc();
    assert_eq!(out.len(), mechanism.num_bodies(), "acceleration buffer length");
    if let Some(vd) = vd {
        assert_eq!(vd.len(), mechanism.num_velocities(), "v̇ vector length");
    }

    let root = state.root_frame();
    // Seeding the root with -g makes the Newton-Euler wrenches include
    // gravity without an explicit per-body force.
    out[0] = SpatialAcceleration::new(root, root, root, Vector3::zeros(), -mechanism.gravity());

    for k in 1..mechanism.num_bodies() {
        let joint_id = JointId::new(k - 1);
        let parent = mechanism.predecessor(joint_id).index();

        let mut angular = out[parent].angular;
        let mut linear = out[parent].linear;

        if let Some(vd) = vd {
            let subspace = &state.subspaces[joint_id.index()];
            let vr = mechanism.v_range(joint_id);
            for c in 0..subspace.cols() {
                let (a, l) = subspace.col(c);
                let vdc = vd[vr.start + c];
                angular += a * vdc;
                linear += l * vdc;
            }
        }

        // Velocity-product term: bias(body) - bias(parent).
        let bias_body = state.biases[k];
        let bias_parent = state.biases[parent];
        angular += bias_body.angular - bias_parent.angular;
        linear += bias_body.linear - bias_parent.linear;

        out[k] = SpatialAcceleration::new(
            mechanism.body(BodyId::new(k)).default_frame(),
            root,
            root,
            angular,
            linear,
        );
    }
}

/// Per-body spatial accelerations (gravity included via the root seed) for
/// the given `v̇`, expressed in the root frame.
///
/// # Panics
///
/// Panics on buffer-length mismatches.
pub fn spatial_accelerations_into(
    state: &mut MechanismState,
    out: &mut [SpatialAcceleration],
    vd: &DVector<f64>,
) {
    accelerations_pass(state, out, Some(vd));
}

/// Newton–Euler body wrenches: `wᵢ = Iᵢ·aᵢ + ξᵢ ×* (Iᵢ·ξᵢ) - w_extᵢ`,
/// written per body into `wrenches` (world frame).
///
/// # Panics
///
/// Panics on buffer-length mismatches.
pub fn newton_euler_into(
    state: &mut MechanismState,
    wrenches: &mut [Wrench],
    accelerations: &[SpatialAcceleration],
    external_wrenches: &[Wrench],
) {
    state.ensure_twists();
    let mechanism = state.mechanism_arc();
    assert_eq!(wrenches.len(), mechanism.num_bodies(), "wrench buffer length");
    assert_eq!(
        external_wrenches.len(),
        mechanism.num_bodies(),
        "external wrench buffer length"
    );
    let root = state.root_frame();
    wrenches[0] = Wrench::zero(root);
    for k in 1..mechanism.num_bodies() {
        wrenches[k] = match mechanism.body(BodyId::new(k)).inertia() {
            Some(inertia) => {
                let world_inertia = inertia.transform(&state.transforms_to_root[k]);
                world_inertia.newton_euler(&accelerations[k], &state.twists[k])
                    - external_wrenches[k]
            }
            None => -external_wrenches[k],
        };
    }
}

/// Backward pass: accumulate joint wrenches toward the root (in place in
/// `wrenches`) and project each onto its joint's motion subspace,
/// writing joint torques into `tau`.
fn joint_wrenches_and_torques(
    state: &mut MechanismState,
    tau: &mut DVector<f64>,
    wrenches: &mut [Wrench],
) {
    state.ensure_transforms();
    let mechanism = state.mechanism_arc();
    assert_eq!(tau.len(), mechanism.num_velocities(), "torque vector length");

    for k in (1..mechanism.num_bodies()).rev() {
        let joint_id = JointId::new(k - 1);
        let joint = mechanism.joint(joint_id);
        // All children (larger indices) have already been accumulated.
        let local = wrenches[k].transform(&state.transforms_to_root[k].inv());
        let range = mechanism.v_range(joint_id);
        joint.joint_torque(&local, &mut tau.as_mut_slice()[range]);

        let parent = mechanism.predecessor(joint_id).index();
        let child_wrench = wrenches[k];
        wrenches[parent] += child_wrench;
    }
}

/// Inverse dynamics: `τ = M(q)·v̇ + c(q, v, w_ext)` via the Newton–Euler
/// recursion, using caller-provided scratch buffers.
///
/// Only the tree form is supported.
///
/// # Errors
///
/// [`DynamicsError::UnsupportedTopology`] if the mechanism has loop
/// joints.
///
/// # Panics
///
/// Panics on buffer-length mismatches.
pub fn inverse_dynamics_into(
    state: &mut MechanismState,
    tau: &mut DVector<f64>,
    accelerations: &mut [SpatialAcceleration],
    wrenches: &mut [Wrench],
    vd: &DVector<f64>,
    external_wrenches: &[Wrench],
) -> Result<()> {
    let num_loops = state.mechanism().loop_joints().len();
    if num_loops > 0 {
        return Err(DynamicsError::UnsupportedTopology(num_loops));
    }
    spatial_accelerations_into(state, accelerations, vd);
    newton_euler_into(state, wrenches, accelerations, external_wrenches);
    joint_wrenches_and_torques(state, tau, wrenches);
    Ok(())
}

/// Allocating form of [`inverse_dynamics_into`].
///
/// # Errors
///
/// [`DynamicsError::UnsupportedTopology`] if the mechanism has loop
/// joints.
pub fn inverse_dynamics(
    state: &mut MechanismState,
    vd: &DVector<f64>,
    external_wrenches: &[Wrench],
) -> Result<DVector<f64>> {
    let mechanism = state.mechanism_arc();
    let root = state.root_frame();
    let mut tau = DVector::zeros(mechanism.num_velocities());
    let mut accelerations = vec![
        SpatialAcceleration::zero(root, root, root);
        mechanism.num_bodies()
    ];
    let mut wrenches = vec![Wrench::zero(root); mechanism.num_bodies()];
    inverse_dynamics_into(
        state,
        &mut tau,
        &mut accelerations,
        &mut wrenches,
        vd,
        external_wrenches,
    )?;
    Ok(tau)
}

/// Dynamics bias `c(q, v, w_ext)`: inverse dynamics with `v̇ = 0`.
///
/// Loop joints are allowed here; the bias recursion only touches the tree.
///
/// # Panics
///
/// Panics on buffer-length mismatches.
pub fn dynamics_bias_into(
    state: &mut MechanismState,
    bias: &mut DVector<f64>,
    accelerations: &mut [SpatialAcceleration],
    wrenches: &mut [Wrench],
    external_wrenches: &[Wrench],
) {
    accelerations_pass(state, accelerations, None);
    newton_euler_into(state, wrenches, accelerations, external_wrenches);
    joint_wrenches_and_torques(state, bias, wrenches);
}

/// Allocating form of [`dynamics_bias_into`].
pub fn dynamics_bias(
    state: &mut MechanismState,
    external_wrenches: &[Wrench],
) -> DVector<f64> {
    let mechanism = state.mechanism_arc();
    let root = state.root_frame();
    let mut bias = DVector::zeros(mechanism.num_velocities());
    let mut accelerations = vec![
        SpatialAcceleration::zero(root, root, root);
        mechanism.num_bodies()
    ];
    let mut wrenches = vec![Wrench::zero(root); mechanism.num_bodies()];
    dynamics_bias_into(
        state,
        &mut bias,
        &mut accelerations,
        &mut wrenches,
        external_wrenches,
    );
    bias
}
