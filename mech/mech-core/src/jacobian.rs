//! Path Jacobians, the momentum matrix, and relative accelerations.

use nalgebra::{DVector, Vector3};

use mech_spatial::{GeometricJacobian, MomentumMatrix, SpatialAcceleration, Transform3D, Twist};

use crate::mechanism::BodyId;
use crate::path::{PathDirection, TreePath};
use crate::state::MechanismState;

/// Assemble the geometric Jacobian of `path` into `out`.
///
/// Column blocks follow the path's edge order; a joint's
/// motion-subspace-in-world columns are negated when its edge is traversed
/// up the tree. `root_to_desired`, when given, re-expresses every column
/// (its source frame must be the root frame). The result maps the path's
/// velocity subvector to the twist of `path.target` with respect to
/// `path.source`.
///
/// # Panics
///
/// Panics if `out` does not have `path_num_velocities(path)` columns.
pub fn geometric_jacobian_into(
    state: &mut MechanismState,
    path: &TreePath,
    root_to_desired: Option<&Transform3D>,
    out: &mut GeometricJacobian,
) {
    state.ensure_motion_subspaces();
    let mechanism = state.mechanism_arc();
    assert_eq!(
        out.cols(),
        mechanism.path_num_velocities(path),
        "jacobian column count must match the path's velocity dimension"
    );
    if let Some(t) = root_to_desired {
        debug_assert_eq!(t.from, state.root_frame(), "transform source frame");
    }

    let mut offset = 0;
    for &(joint_id, direction) in path.edges() {
        let sign = match direction {
            PathDirection::Up => -1.0,
            PathDirection::Down => 1.0,
        };
        let subspace = &state.subspaces[joint_id.index()];
        for c in 0..subspace.cols() {
            let (mut ang, mut lin) = subspace.col(c);
            if let Some(t) = root_to_desired {
                let a = t.rot * ang;
                lin = t.rot * lin + t.trans.cross(&a);
                ang = a;
            }
            out.set_col(offset + c, &(ang * sign), &(lin * sign));
        }
        offset += subspace.cols();
    }

    out.body = mechanism.body(path.target).default_frame();
    out.base = mechanism.body(path.source).default_frame();
    out.frame = root_to_desired.map_or(state.root_frame(), |t| t.to);
}

/// Allocating form of [`geometric_jacobian_into`] (world frame).
pub fn geometric_jacobian(state: &mut MechanismState, path: &TreePath) -> GeometricJacobian {
    let mechanism = state.mechanism_arc();
    let mut out = GeometricJacobian::zeros(
        mechanism.body(path.target).default_frame(),
        mechanism.body(path.source).default_frame(),
        state.root_frame(),
        mechanism.path_num_velocities(path),
    );
    geometric_jacobian_into(state, path, None, &mut out);
    out
}

/// Assemble the momentum matrix `A(q)` into `out` (root frame): block `i`
/// is `I_crb(succ_i)·S_i`, so `A·v` is the total spatial momentum.
///
/// # Panics
///
/// Panics if `out` does not have `num_velocities` columns.
pub fn momentum_matrix_into(state: &mut MechanismState, out: &mut MomentumMatrix) {
    state.ensure_motion_subspaces();
    state.ensure_crb_inertias();
    let mechanism = state.mechanism_arc();
    assert_eq!(
        out.cols(),
        mechanism.num_velocities(),
        "momentum matrix column count"
    );
    out.frame = state.root_frame();
    for j in 0..mechanism.num_tree_joints() {
        let joint_id = crate::mechanism::JointId::new(j);
        let succ = mechanism.successor(joint_id).index();
        let crb = state.crb_inertias[succ];
        let subspace = &state.subspaces[j];
        let vr = mechanism.v_range(joint_id);
        for c in 0..subspace.cols() {
            let (a, l) = subspace.col(c);
            let (ha, hl) = crb.apply(&a, &l);
            out.set_col(vr.start + c, &ha, &hl);
        }
    }
}

/// Allocating form of [`momentum_matrix_into`].
pub fn momentum_matrix(state: &mut MechanismState) -> MomentumMatrix {
    let mut out = MomentumMatrix::zeros(state.root_frame(), state.mechanism().num_velocities());
    momentum_matrix_into(state, &mut out);
    out
}

/// Twist of `body` relative to `base`, expressed in the root frame.
pub fn relative_twist(state: &mut MechanismState, body: BodyId, base: BodyId) -> Twist {
    state.ensure_twists();
    state.twists[body.index()] - state.twists[base.index()]
}

/// Spatial acceleration of `body` relative to `base` for the given `v̇`,
/// expressed in the root frame.
///
/// Walks the tree path between the two bodies accumulating `S·v̇` per
/// joint (negated on upward edges), then adds the bias-acceleration
/// difference of the endpoints.
pub fn relative_acceleration(
    state: &mut MechanismState,
    body: BodyId,
    base: BodyId,
    vd: &DVector<f64>,
) -> SpatialAcceleration {
    state.ensure_bias_accelerations();
    state.ensure_motion_subspaces();
    let mechanism = state.mechanism_arc();
    assert_eq!(vd.len(), mechanism.num_velocities(), "v̇ vector length");

    let path = mechanism.path(base, body);
    let mut angular = Vector3::zeros();
    let mut linear = Vector3::zeros();
    for &(joint_id, direction) in path.edges() {
        let sign = match direction {
            PathDirection::Up => -1.0,
            PathDirection::Down => 1.0,
        };
        let subspace = &state.subspaces[joint_id.index()];
        let vr = mechanism.v_range(joint_id);
        for c in 0..subspace.cols() {
            let (a, l) = subspace.col(c);
            let vdc = sign * vd[vr.start + c];
            angular += a * vdc;
            linear += l * vdc;
        }
    }

    let bias_body = state.biases[body.index()];
    let bias_base = state.biases[base.index()];
    SpatialAcceleration::new(
        mechanism.body(body).default_frame(),
        mechanism.body(base).default_frame(),
        state.root_frame(),
        angular + bias_body.angular - bias_base.angular,
        linear + bias_body.linear - bias_base.linear,
    )
}
