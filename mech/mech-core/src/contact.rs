//! Contact dynamics against environment half-spaces.
//!
//! For every registered contact point and every half-space, the driver
//! evaluates the point's cached world position and velocity; while the
//! point penetrates, the contact model produces a force (accumulated into
//! the body's contact wrench) and a contact-state derivative. Outside
//! contact, the state is reset and its derivative zeroed. Integration of
//! the state is the external time-stepper's job.
//!
//! Contact-state layout in `MechanismState::s`: bodies in topological
//! order, points in registration order, half-spaces in registration
//! order, `num_states()` slots each.

use mech_contact::ContactModel;
use mech_spatial::Wrench;

use crate::results::DynamicsResult;
use crate::state::MechanismState;

/// Evaluate all contact points, writing per-body contact wrenches and the
/// contact-state derivative into `result` and updating the contact state
/// machines in `state`.
///
/// # Panics
///
/// Panics if `result` was not sized for this state's mechanism.
pub fn contact_dynamics(state: &mut MechanismState, result: &mut DynamicsResult) {
    state.ensure_twists();
    let mechanism = state.mechanism_arc();
    assert_eq!(
        result.contact_state_derivative.len(),
        state.s.len(),
        "contact state derivative length"
    );
    assert_eq!(
        result.contact_wrenches.len(),
        mechanism.num_bodies(),
        "contact wrench buffer length"
    );

    let root = state.root_frame();
    for w in &mut result.contact_wrenches {
        *w = Wrench::zero(root);
    }
    if mechanism.environment().is_empty() {
        result.contact_state_derivative.fill(0.0);
        return;
    }

    let mut offset = 0;
    for k in 0..mechanism.num_bodies() {
        let body = mechanism.body(crate::mechanism::BodyId::new(k));
        if body.contact_points().is_empty() {
            continue;
        }
        let transform = state.transforms_to_root[k];
        let twist = state.twists[k];
        for point in body.contact_points() {
            let world_point = transform.transform_point(&point.location);
            for halfspace in mechanism.environment() {
                let n = point.model.num_states();
                let state_slice = &mut state.s.as_mut_slice()[offset..offset + n];
                let deriv_slice =
                    &mut result.contact_state_derivative.as_mut_slice()[offset..offset + n];
                offset += n;

                let separation = halfspace.separation(&world_point);
                if separation < 0.0 {
                    let velocity = twist.point_velocity(&world_point);
                    let force = point.model.compute(
                        -separation,
                        &velocity,
                        &halfspace.outward_normal,
                        state_slice,
                        deriv_slice,
                    );
                    result.contact_wrenches[k] +=
                        Wrench::from_force_at_point(root, &world_point, &force);
                } else {
                    point.model.reset(state_slice);
                    point.model.zero_derivative(deriv_slice);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::joint::{Joint, JointKind};
    use crate::mechanism::{BodyId, Mechanism};
    use approx::assert_relative_eq;
    use mech_contact::{ContactPoint, HalfSpace3D, SoftContactModel};
    use mech_spatial::{SpatialInertia, Transform3D};
    use nalgebra::Vector3;
    use std::sync::Arc;

    fn falling_ball() -> Arc<Mechanism> {
        let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
        let root_frame = mech.root_frame();
        let joint = Joint::new("free", JointKind::Floating);
        let before = joint.frame_before();
        let frame = joint.frame_after();
        let mut ball = RigidBody::new(
            "ball",
            frame,
            Some(SpatialInertia::point_mass(frame, 1.0, &Vector3::zeros())),
        );
        ball.add_contact_point(ContactPoint::new(
            Vector3::zeros(),
            SoftContactModel::default_params(),
        ));
        mech.attach(
            mech.root(),
            joint,
            Transform3D::identity(before, root_frame),
            ball,
            None,
        );
        mech.add_environment_halfspace(HalfSpace3D::ground());
        Arc::new(mech)
    }

    #[test]
    fn no_contact_above_the_ground() {
        let mech = falling_ball();
        let mut state = MechanismState::new(Arc::clone(&mech));
        state.set_joint_configuration(
            mech.find_joint("free").unwrap(),
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1],
        );
        let mut result = DynamicsResult::new(&mech);
        contact_dynamics(&mut state, &mut result);
        assert_relative_eq!(result.contact_wrenches[1].linear, Vector3::zeros());
        assert_relative_eq!(result.contact_state_derivative.norm(), 0.0);
    }

    #[test]
    fn penetration_produces_upward_force() {
        let mech = falling_ball();
        let mut state = MechanismState::new(Arc::clone(&mech));
        state.set_joint_configuration(
            mech.find_joint("free").unwrap(),
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.005],
        );
        state.set_joint_velocity(
            mech.find_joint("free").unwrap(),
            &[0.0, 0.0, 0.0, 0.0, 0.0, -0.1],
        );
        let mut result = DynamicsResult::new(&mech);
        contact_dynamics(&mut state, &mut result);
        assert!(result.contact_wrenches[1].linear.z > 0.0);
    }

    #[test]
    fn leaving_contact_resets_state() {
        let mech = falling_ball();
        let mut state = MechanismState::new(Arc::clone(&mech));
        let joint = mech.find_joint("free").unwrap();
        // In contact with tangential motion: bristle state derivative
        // becomes nonzero.
        state.set_joint_configuration(joint, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.002]);
        state.set_joint_velocity(joint, &[0.0, 0.0, 0.0, 0.2, 0.0, 0.0]);
        let mut result = DynamicsResult::new(&mech);
        contact_dynamics(&mut state, &mut result);
        assert!(result.contact_state_derivative.norm() > 0.0);

        // Integrate the state a little, then move out of contact.
        let s: Vec<f64> = state
            .contact_state()
            .iter()
            .zip(result.contact_state_derivative.iter())
            .map(|(s, ds)| s + 0.01 * ds)
            .collect();
        state.set_contact_state(&s);
        state.set_joint_configuration(joint, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5]);
        contact_dynamics(&mut state, &mut result);
        assert_relative_eq!(state.contact_state().norm(), 0.0);
        assert_relative_eq!(result.contact_state_derivative.norm(), 0.0);
    }
}
