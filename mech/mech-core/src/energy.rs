//! Mass, energy, and momentum queries.

use nalgebra::Vector3;

use mech_spatial::Momentum;

use crate::error::{DynamicsError, Result};
use crate::mechanism::BodyId;
use crate::state::MechanismState;

/// Center of mass of the whole mechanism, in the root frame.
///
/// The root body is ignored (it carries no dynamic mass).
///
/// # Errors
///
/// Returns [`DynamicsError::ZeroMass`] when the total mass vanishes.
pub fn center_of_mass(state: &mut MechanismState) -> Result<Vector3<f64>> {
    let ids: Vec<BodyId> = (1..state.mechanism().num_bodies())
        .map(BodyId::new)
        .collect();
    center_of_mass_of(state, &ids)
}

/// Center of mass of a subset of bodies, in the root frame.
///
/// # Errors
///
/// Returns [`DynamicsError::ZeroMass`] when the subset's mass vanishes.
pub fn center_of_mass_of(state: &mut MechanismState, bodies: &[BodyId]) -> Result<Vector3<f64>> {
    state.ensure_transforms();
    let mechanism = state.mechanism_arc();
    let mut weighted = Vector3::zeros();
    let mut total_mass = 0.0;
    for &id in bodies {
        if id.index() == 0 {
            continue;
        }
        if let Some(inertia) = mechanism.body(id).inertia() {
            let com_world = state.transforms_to_root[id.index()].transform_point(&inertia.com());
            weighted += com_world * inertia.mass;
            total_mass += inertia.mass;
        }
    }
    if total_mass <= 0.0 {
        return Err(DynamicsError::ZeroMass);
    }
    Ok(weighted / total_mass)
}

/// Gravitational potential energy `U = -Σ mᵢ·g·cᵢ`, with the convention
/// that `dU/dt = -m·gᵀ·v_com`.
pub fn gravitational_potential_energy(state: &mut MechanismState) -> f64 {
    state.ensure_transforms();
    let mechanism = state.mechanism_arc();
    let g = mechanism.gravity();
    let mut potential = 0.0;
    for k in 1..mechanism.num_bodies() {
        if let Some(inertia) = mechanism.body(BodyId::new(k)).inertia() {
            let com_world = state.transforms_to_root[k].transform_point(&inertia.com());
            potential -= inertia.mass * g.dot(&com_world);
        }
    }
    potential
}

/// Kinetic energy `½ Σ ξᵢᵀ·Iᵢ·ξᵢ` over all bodies.
pub fn kinetic_energy(state: &mut MechanismState) -> f64 {
    state.ensure_twists();
    let mechanism = state.mechanism_arc();
    let mut energy = 0.0;
    for k in 1..mechanism.num_bodies() {
        if let Some(inertia) = mechanism.body(BodyId::new(k)).inertia() {
            let world_inertia = inertia.transform(&state.transforms_to_root[k]);
            energy += world_inertia.kinetic_energy(&state.twists[k]);
        }
    }
    energy
}

/// Total spatial momentum in the root frame.
pub fn momentum(state: &mut MechanismState) -> Momentum {
    state.ensure_twists();
    let mechanism = state.mechanism_arc();
    let mut total = Momentum::zero(state.root_frame());
    for k in 1..mechanism.num_bodies() {
        if let Some(inertia) = mechanism.body(BodyId::new(k)).inertia() {
            let world_inertia = inertia.transform(&state.transforms_to_root[k]);
            total += world_inertia.momentum(&state.twists[k]);
        }
    }
    total
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::joint::{Joint, JointKind};
    use crate::mechanism::Mechanism;
    use approx::assert_relative_eq;
    use mech_spatial::{SpatialInertia, Transform3D};
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn pendulum() -> Arc<Mechanism> {
        let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
        let root_frame = mech.root_frame();
        let joint = Joint::new("pin", JointKind::Revolute { axis: Vector3::y_axis() });
        let before = joint.frame_before();
        let frame = joint.frame_after();
        let link = RigidBody::new(
            "link",
            frame,
            Some(SpatialInertia::point_mass(
                frame,
                2.0,
                &Vector3::new(1.0, 0.0, 0.0),
            )),
        );
        mech.attach(
            mech.root(),
            joint,
            Transform3D::identity(before, root_frame),
            link,
            None,
        );
        Arc::new(mech)
    }

    #[test]
    fn com_of_pendulum() {
        let mut state = MechanismState::new(pendulum());
        let com = center_of_mass(&mut state).unwrap();
        assert_relative_eq!(com, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_mass_subset_errors() {
        let mut state = MechanismState::new(pendulum());
        let err = center_of_mass_of(&mut state, &[BodyId::new(0)]);
        assert!(matches!(err, Err(DynamicsError::ZeroMass)));
    }

    #[test]
    fn potential_energy_tracks_height() {
        let mut state = MechanismState::new(pendulum());
        let u0 = gravitational_potential_energy(&mut state);
        // Rotating -π/2 about +y lifts the mass from z = 0 to z = +1.
        state.set_configuration(&[-FRAC_PI_2]);
        let u1 = gravitational_potential_energy(&mut state);
        assert_relative_eq!(u1 - u0, 2.0 * 9.81 * 1.0, epsilon = 1e-9);
    }

    #[test]
    fn kinetic_energy_of_spinning_pendulum() {
        let mut state = MechanismState::new(pendulum());
        state.set_velocity(&[3.0]);
        // Point mass at radius 1, m = 2: E = ½·m·(ω·r)² = 9.
        assert_relative_eq!(kinetic_energy(&mut state), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn momentum_of_spinning_pendulum() {
        let mut state = MechanismState::new(pendulum());
        state.set_velocity(&[2.0]);
        let h = momentum(&mut state);
        // Tip speed 2 in -z (ω = +2 about y, r = +x): linear momentum -4 z.
        assert_relative_eq!(h.linear, Vector3::new(0.0, 0.0, -4.0), epsilon = 1e-12);
        // Angular momentum about origin: m·r×v = 2·(1,0,0)×(0,0,-2) = (0,4,0).
        assert_relative_eq!(h.angular, Vector3::new(0.0, 4.0, 0.0), epsilon = 1e-12);
    }
}
