//! Loop-closure constraint assembly.
//!
//! For each loop joint, the constraint wrench subspace `T` (complementary
//! to the joint's motion subspace) is expressed in world coordinates; the
//! constraint Jacobian rows are `±Tᵀ·S_k` over the cached tree path from
//! predecessor to successor, and the constraint bias follows
//! Featherstone eq. 8.47.

use nalgebra::{DMatrix, DVector, Vector3};

use crate::error::{DynamicsError, Result};
use crate::joint::JointKind;
use crate::path::PathDirection;
use crate::state::MechanismState;

/// Assemble the loop-constraint Jacobian `K` and bias `k` into the given
/// buffers.
///
/// After a successful call, `K·v̇ + k = 0` expresses the loop-closure
/// acceleration constraints.
///
/// # Errors
///
/// [`DynamicsError::UnsupportedJoint`] for a floating loop joint (its
/// constraint wrench subspace is empty, so it constrains nothing).
///
/// # Panics
///
/// Panics if the buffers are not `num_constraints × nv` /
/// `num_constraints`.
pub fn constraint_jacobian_and_bias_into(
    state: &mut MechanismState,
    kmat: &mut DMatrix<f64>,
    kbias: &mut DVector<f64>,
) -> Result<()> {
    state.ensure_all();
    let mechanism = state.mechanism_arc();
    let nc = mechanism.num_constraints();
    assert_eq!(kmat.nrows(), nc, "constraint jacobian rows");
    assert_eq!(kmat.ncols(), mechanism.num_velocities(), "constraint jacobian cols");
    assert_eq!(kbias.len(), nc, "constraint bias length");
    kmat.fill(0.0);
    kbias.fill(0.0);

    for (l, loop_joint) in mechanism.loop_joints().iter().enumerate() {
        if matches!(loop_joint.joint.kind(), JointKind::Floating) {
            return Err(DynamicsError::UnsupportedJoint {
                joint: loop_joint.joint.name().to_string(),
            });
        }
        let rows = mechanism.loop_row_range(l);
        let succ = loop_joint.successor.index();
        let pred = loop_joint.predecessor.index();

        // Constraint wrench subspace in world: frame_after sits on the
        // successor body.
        let after_to_succ = mechanism
            .body(loop_joint.successor)
            .frame_definition(loop_joint.joint.frame_after());
        let to_world = state.transforms_to_root[succ] * after_to_succ;
        let t_local = loop_joint.joint.constraint_wrench_subspace();
        let mut t_world: [(Vector3<f64>, Vector3<f64>); 6] =
            [(Vector3::zeros(), Vector3::zeros()); 6];
        for (c, slot) in t_world.iter_mut().enumerate().take(t_local.cols()) {
            let (a, lcol) = t_local.col(c);
            let lin = to_world.rot * lcol;
            let ang = to_world.rot * a + to_world.trans.cross(&lin);
            *slot = (ang, lin);
        }

        // K rows: ±Tᵀ·S_k along the tree path.
        for &(joint_id, direction) in state.loop_paths[l].edges() {
            let sign = match direction {
                PathDirection::Up => -1.0,
                PathDirection::Down => 1.0,
            };
            let subspace = &state.subspaces[joint_id.index()];
            let vr = mechanism.v_range(joint_id);
            for c in 0..subspace.cols() {
                let (sa, sl) = subspace.col(c);
                for (r, &(ta, tl)) in t_world.iter().enumerate().take(rows.len()) {
                    kmat[(rows.start + r, vr.start + c)] = sign * (ta.dot(&sa) + tl.dot(&sl));
                }
            }
        }

        // Bias: k = Tᵀ·(v_succ ×ₘ v_pred + bias_succ - bias_pred).
        let tw_succ = state.twists[succ];
        let tw_pred = state.twists[pred];
        let cross_ang = tw_succ.angular.cross(&tw_pred.angular);
        let cross_lin =
            tw_succ.angular.cross(&tw_pred.linear) + tw_succ.linear.cross(&tw_pred.angular);
        let bias_ang =
            cross_ang + state.biases[succ].angular - state.biases[pred].angular;
        let bias_lin = cross_lin + state.biases[succ].linear - state.biases[pred].linear;
        for (r, &(ta, tl)) in t_world.iter().enumerate().take(rows.len()) {
            kbias[rows.start + r] = ta.dot(&bias_ang) + tl.dot(&bias_lin);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::joint::Joint;
    use crate::mechanism::{BodyId, Mechanism};
    use crate::state::MechanismState;
    use approx::assert_relative_eq;
    use mech_spatial::{SpatialInertia, Transform3D};
    use std::sync::Arc;

    /// Two independent revolute links whose tips are pinned together by a
    /// loop revolute joint (a degenerate four-bar).
    fn pinned_pair() -> Arc<Mechanism> {
        let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
        let root_frame = mech.root_frame();

        let mut frames = Vec::new();
        for (name, offset) in [("left", 0.0), ("right", 1.0)] {
            let j = Joint::new(name, JointKind::Revolute { axis: Vector3::z_axis() });
            let before = j.frame_before();
            let frame = j.frame_after();
            let link = RigidBody::new(
                format!("{name}_link"),
                frame,
                Some(SpatialInertia::point_mass(
                    frame,
                    1.0,
                    &Vector3::new(0.5, 0.0, 0.0),
                )),
            );
            mech.attach(
                mech.root(),
                j,
                Transform3D::translation(before, root_frame, Vector3::new(offset, 0.0, 0.0)),
                link,
                None,
            );
            frames.push(frame);
        }

        let closure = Joint::new("closure", JointKind::Revolute { axis: Vector3::z_axis() });
        let before = closure.frame_before();
        let after = closure.frame_after();
        mech.add_loop_joint(
            BodyId::new(1),
            BodyId::new(2),
            closure,
            Transform3D::translation(before, frames[0], Vector3::new(1.0, 0.0, 0.0)),
            Transform3D::translation(after, frames[1], Vector3::new(0.0, 0.0, 0.0)),
        );
        Arc::new(mech)
    }

    #[test]
    fn constraint_matrix_shape_and_rank() {
        let mech = pinned_pair();
        assert_eq!(mech.num_constraints(), 5);
        let mut state = MechanismState::new(Arc::clone(&mech));
        let mut k = DMatrix::zeros(5, 2);
        let mut kb = DVector::zeros(5);
        constraint_jacobian_and_bias_into(&mut state, &mut k, &mut kb).unwrap();
        // Planar mechanism: at least one row must couple the two joints.
        assert!(k.iter().any(|x| x.abs() > 1e-9));
    }

    #[test]
    fn force_rows_measure_relative_pin_velocity() {
        // The three force rows of K·v must equal the relative velocity of
        // successor vs. predecessor at the closure joint's frame_after
        // origin, expressed along that frame's world axes.
        let mech = pinned_pair();
        let mut state = MechanismState::new(Arc::clone(&mech));
        state.set_configuration(&[0.6, -1.1]);
        let v = [0.7, -0.3];
        state.set_velocity(&v);

        let mut k = DMatrix::zeros(5, 2);
        let mut kb = DVector::zeros(5);
        constraint_jacobian_and_bias_into(&mut state, &mut k, &mut kb).unwrap();
        let kv = &k * DVector::from_column_slice(&v);

        let tw1 = state.twist_wrt_world(BodyId::new(1));
        let tw2 = state.twist_wrt_world(BodyId::new(2));
        // frame_after of the closure coincides with the right link frame.
        let pin_transform = state.transform_to_root(BodyId::new(2));
        let pin = pin_transform.transform_point(&Vector3::zeros());
        let dv = tw2.point_velocity(&pin) - tw1.point_velocity(&pin);
        for i in 0..3 {
            let axis = pin_transform.rot.column(i).into_owned();
            assert_relative_eq!(kv[i], axis.dot(&dv), epsilon = 1e-9);
        }
    }

    #[test]
    fn floating_loop_joint_is_rejected() {
        let mech = pinned_pair();
        let mut with_float = (*mech).clone();
        let bad = Joint::new("bad", JointKind::Floating);
        let before = bad.frame_before();
        let after = bad.frame_after();
        let f1 = with_float.body(BodyId::new(1)).default_frame();
        let f2 = with_float.body(BodyId::new(2)).default_frame();
        with_float.add_loop_joint(
            BodyId::new(1),
            BodyId::new(2),
            bad,
            Transform3D::identity(before, f1),
            Transform3D::identity(after, f2),
        );
        let mut state = MechanismState::new(Arc::new(with_float));
        let mut k = DMatrix::zeros(5, 2);
        let mut kb = DVector::zeros(5);
        let err = constraint_jacobian_and_bias_into(&mut state, &mut k, &mut kb);
        assert!(matches!(err, Err(DynamicsError::UnsupportedJoint { .. })));
    }
}
