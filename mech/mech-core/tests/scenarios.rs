//! End-to-end dynamics scenarios with analytically known outcomes.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector, Vector3};

use mech_contact::{ContactPoint, HalfSpace3D, SoftContactModel};
use mech_core::{
    dynamics, dynamics_bias, gravitational_potential_energy, inverse_dynamics, kinetic_energy,
    mass_matrix, BodyId, DynamicsResult, Joint, JointKind, Mechanism, MechanismState, RigidBody,
};
use mech_spatial::{SpatialInertia, Transform3D, Wrench};

fn no_external(mechanism: &Mechanism) -> Vec<Wrench> {
    vec![Wrench::zero(mechanism.root_frame()); mechanism.num_bodies()]
}

/// Symmetrize a lower-triangle mass matrix for residual checks.
fn full_mass_matrix(lower: &DMatrix<f64>) -> DMatrix<f64> {
    let n = lower.nrows();
    let mut full = lower.clone();
    for i in 0..n {
        for j in (i + 1)..n {
            full[(i, j)] = lower[(j, i)];
        }
    }
    full
}

/// Pendulum hinged about +y at the origin; unit point mass one meter from
/// the axis, hanging straight down at `q = 0`. At `q = π/2` the link is
/// horizontal and `θ̈ = -g·sin(q)`.
fn hanging_pendulum() -> Arc<Mechanism> {
    let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
    let root_frame = mech.root_frame();
    let joint = Joint::new("pin", JointKind::Revolute { axis: Vector3::y_axis() });
    let before = joint.frame_before();
    let frame = joint.frame_after();
    let link = RigidBody::new(
        "bob",
        frame,
        Some(SpatialInertia::point_mass(
            frame,
            1.0,
            &Vector3::new(0.0, 0.0, -1.0),
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
fn pendulum_horizontal_release_accelerates_at_g() {
    let mech = hanging_pendulum();
    let mut state = MechanismState::new(Arc::clone(&mech));
    state.set_configuration(&[FRAC_PI_2]);
    state.set_velocity(&[0.0]);

    let mut result = DynamicsResult::new(&mech);
    let tau = DVector::zeros(1);
    dynamics(&mut state, &mut result, &tau, &no_external(&mech)).unwrap();
    assert_relative_eq!(result.vd[0], -9.81, epsilon = 1e-9);
}

#[test]
fn pendulum_energy_conserved_over_one_second() {
    let mech = hanging_pendulum();
    let mut state = MechanismState::new(Arc::clone(&mech));
    let mut result = DynamicsResult::new(&mech);
    let tau = DVector::zeros(1);
    let external = no_external(&mech);

    let accel = |state: &mut MechanismState, result: &mut DynamicsResult, q: f64, v: f64| {
        state.set_configuration(&[q]);
        state.set_velocity(&[v]);
        dynamics(state, result, &tau, &external).unwrap();
        result.vd[0]
    };

    let mut q = FRAC_PI_2;
    let mut v = 0.0;
    state.set_configuration(&[q]);
    state.set_velocity(&[v]);
    let e0 = kinetic_energy(&mut state) + gravitational_potential_energy(&mut state);

    // Velocity Verlet (the acceleration depends on q only here): symplectic
    // and second order, so drift stays far below the tolerance.
    let dt = 1e-3;
    let steps = 1000;
    let mut a = accel(&mut state, &mut result, q, v);
    for _ in 0..steps {
        q += dt * v + 0.5 * dt * dt * a;
        let a_new = accel(&mut state, &mut result, q, v);
        v += 0.5 * dt * (a + a_new);
        a = accel(&mut state, &mut result, q, v);
    }

    state.set_configuration(&[q]);
    state.set_velocity(&[v]);
    let e1 = kinetic_energy(&mut state) + gravitational_potential_energy(&mut state);
    assert!(
        (e1 - e0).abs() < 1e-3,
        "energy drift {} exceeds tolerance",
        e1 - e0
    );
}

fn floating_body() -> Arc<Mechanism> {
    let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
    let root_frame = mech.root_frame();
    let joint = Joint::new("free", JointKind::Floating);
    let before = joint.frame_before();
    let frame = joint.frame_after();
    let body = RigidBody::new(
        "brick",
        frame,
        Some(SpatialInertia::from_com(
            frame,
            2.0,
            &Vector3::zeros(),
            nalgebra::Matrix3::from_diagonal(&Vector3::new(0.02, 0.03, 0.04)),
        )),
    );
    mech.attach(
        mech.root(),
        joint,
        Transform3D::identity(before, root_frame),
        body,
        None,
    );
    Arc::new(mech)
}

#[test]
fn floating_body_free_fall() {
    let mech = floating_body();
    let mut state = MechanismState::new(Arc::clone(&mech));
    let mut result = DynamicsResult::new(&mech);
    let tau = DVector::zeros(6);
    dynamics(&mut state, &mut result, &tau, &no_external(&mech)).unwrap();

    // v̇ = (ω̇, a_body): no angular acceleration, -g linear.
    for i in 0..3 {
        assert_relative_eq!(result.vd[i], 0.0, epsilon = 1e-10);
    }
    assert_relative_eq!(result.vd[3], 0.0, epsilon = 1e-10);
    assert_relative_eq!(result.vd[4], 0.0, epsilon = 1e-10);
    assert_relative_eq!(result.vd[5], -9.81, epsilon = 1e-10);

    // Semi-implicit rollout: position drops by ~½·g·t².
    let dt = 1e-3;
    let steps = 500;
    let joint = mech.find_joint("free").unwrap();
    let mut q_dot = vec![0.0; mech.num_positions()];
    for _ in 0..steps {
        dynamics(&mut state, &mut result, &tau, &no_external(&mech)).unwrap();
        let v_new: Vec<f64> = state
            .velocity()
            .iter()
            .zip(result.vd.iter())
            .map(|(v, a)| v + dt * a)
            .collect();
        state.set_velocity(&v_new);
        state.configuration_derivative(&mut q_dot);
        let q_new: Vec<f64> = state
            .configuration()
            .iter()
            .zip(q_dot.iter())
            .map(|(q, qd)| q + dt * qd)
            .collect();
        state.set_configuration(&q_new);
    }
    let t = dt * steps as f64;
    let z = state.joint_configuration(joint)[6];
    assert_relative_eq!(z, -0.5 * 9.81 * t * t, epsilon = 6e-3);
}

fn two_link_arm() -> Arc<Mechanism> {
    let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
    let root_frame = mech.root_frame();

    let j1 = Joint::new("shoulder", JointKind::Revolute { axis: Vector3::y_axis() });
    let j1_before = j1.frame_before();
    let l1_frame = j1.frame_after();
    let elbow_frame = mech_spatial::CartesianFrame3D::new();
    let mut link1 = RigidBody::new(
        "upper",
        l1_frame,
        Some(SpatialInertia::point_mass(
            l1_frame,
            1.3,
            &Vector3::new(0.5, 0.0, 0.0),
        )),
    );
    link1.add_frame_definition(Transform3D::translation(
        elbow_frame,
        l1_frame,
        Vector3::new(1.0, 0.0, 0.0),
    ));
    mech.attach(
        mech.root(),
        j1,
        Transform3D::identity(j1_before, root_frame),
        link1,
        None,
    );

    let j2 = Joint::new("elbow", JointKind::Revolute { axis: Vector3::y_axis() });
    let j2_before = j2.frame_before();
    let l2_frame = j2.frame_after();
    let link2 = RigidBody::new(
        "fore",
        l2_frame,
        Some(SpatialInertia::point_mass(
            l2_frame,
            0.7,
            &Vector3::new(0.8, 0.0, 0.0),
        )),
    );
    mech.attach(
        BodyId::new(1),
        j2,
        Transform3D::identity(j2_before, elbow_frame),
        link2,
        None,
    );
    Arc::new(mech)
}

#[test]
fn two_link_mass_matrix_matches_finite_differenced_torques() {
    let mech = two_link_arm();
    let mut state = MechanismState::new(Arc::clone(&mech));
    state.set_configuration(&[0.9, -1.3]);
    state.set_velocity(&[0.4, -0.2]);

    let m = mass_matrix(&mut state);
    let c = dynamics_bias(&mut state, &no_external(&mech));

    // τ(v̇) is exactly linear in v̇, so forward differences recover M.
    let h = 1.0;
    for j in 0..2 {
        let mut vd = DVector::zeros(2);
        vd[j] = h;
        let tau = inverse_dynamics(&mut state, &vd, &no_external(&mech)).unwrap();
        for i in 0..2 {
            let m_ij = (tau[i] - c[i]) / h;
            let stored = if i >= j { m[(i, j)] } else { m[(j, i)] };
            assert_relative_eq!(m_ij, stored, epsilon = 1e-8);
        }
    }
}

fn prismatic_revolute_chain() -> Arc<Mechanism> {
    let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
    let root_frame = mech.root_frame();

    let j1 = Joint::new("rail", JointKind::Prismatic { axis: Vector3::x_axis() });
    let j1_before = j1.frame_before();
    let cart_frame = j1.frame_after();
    let cart = RigidBody::new(
        "cart",
        cart_frame,
        Some(SpatialInertia::point_mass(cart_frame, 3.0, &Vector3::zeros())),
    );
    mech.attach(
        mech.root(),
        j1,
        Transform3D::identity(j1_before, root_frame),
        cart,
        None,
    );

    let j2 = Joint::new("pole", JointKind::Revolute { axis: Vector3::y_axis() });
    let j2_before = j2.frame_before();
    let pole_frame = j2.frame_after();
    let pole = RigidBody::new(
        "pole",
        pole_frame,
        Some(SpatialInertia::point_mass(
            pole_frame,
            0.4,
            &Vector3::new(0.0, 0.0, -0.6),
        )),
    );
    mech.attach(
        BodyId::new(1),
        j2,
        Transform3D::identity(j2_before, cart_frame),
        pole,
        None,
    );
    Arc::new(mech)
}

#[test]
fn inverse_then_forward_dynamics_roundtrip() {
    let mech = prismatic_revolute_chain();
    let mut state = MechanismState::new(Arc::clone(&mech));
    state.set_configuration(&[0.3, 1.1]);
    state.set_velocity(&[-0.8, 2.2]);

    let vd_expected = DVector::from_vec(vec![1.9, -3.4]);
    let tau = inverse_dynamics(&mut state, &vd_expected, &no_external(&mech)).unwrap();

    let mut result = DynamicsResult::new(&mech);
    dynamics(&mut state, &mut result, &tau, &no_external(&mech)).unwrap();
    assert_relative_eq!(result.vd[0], vd_expected[0], epsilon = 1e-9);
    assert_relative_eq!(result.vd[1], vd_expected[1], epsilon = 1e-9);
}

/// Parallelogram four-bar: crank and rocker of length 1 pivoting about +z
/// at (0,0,0) and (2,0,0), coupler of length 2 pinned tip-to-tip by a
/// revolute loop joint.
fn four_bar() -> Arc<Mechanism> {
    let mut mech = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, -9.81, 0.0));
    let root_frame = mech.root_frame();

    let crank_joint = Joint::new("crank", JointKind::Revolute { axis: Vector3::z_axis() });
    let crank_before = crank_joint.frame_before();
    let crank_frame = crank_joint.frame_after();
    let crank_tip = mech_spatial::CartesianFrame3D::new();
    let mut crank = RigidBody::new(
        "crank",
        crank_frame,
        Some(SpatialInertia::point_mass(
            crank_frame,
            1.0,
            &Vector3::new(0.5, 0.0, 0.0),
        )),
    );
    crank.add_frame_definition(Transform3D::translation(
        crank_tip,
        crank_frame,
        Vector3::new(1.0, 0.0, 0.0),
    ));
    mech.attach(
        mech.root(),
        crank_joint,
        Transform3D::identity(crank_before, root_frame),
        crank,
        None,
    );

    let coupler_joint = Joint::new("coupler", JointKind::Revolute { axis: Vector3::z_axis() });
    let coupler_before = coupler_joint.frame_before();
    let coupler_frame = coupler_joint.frame_after();
    let coupler_tip = mech_spatial::CartesianFrame3D::new();
    let mut coupler = RigidBody::new(
        "coupler",
        coupler_frame,
        Some(SpatialInertia::point_mass(
            coupler_frame,
            2.0,
            &Vector3::new(1.0, 0.0, 0.0),
        )),
    );
    coupler.add_frame_definition(Transform3D::translation(
        coupler_tip,
        coupler_frame,
        Vector3::new(2.0, 0.0, 0.0),
    ));
    mech.attach(
        BodyId::new(1),
        coupler_joint,
        Transform3D::identity(coupler_before, crank_tip),
        coupler,
        None,
    );

    let rocker_joint = Joint::new("rocker", JointKind::Revolute { axis: Vector3::z_axis() });
    let rocker_before = rocker_joint.frame_before();
    let rocker_frame = rocker_joint.frame_after();
    let rocker_tip = mech_spatial::CartesianFrame3D::new();
    let mut rocker = RigidBody::new(
        "rocker",
        rocker_frame,
        Some(SpatialInertia::point_mass(
            rocker_frame,
            1.0,
            &Vector3::new(0.5, 0.0, 0.0),
        )),
    );
    rocker.add_frame_definition(Transform3D::translation(
        rocker_tip,
        rocker_frame,
        Vector3::new(1.0, 0.0, 0.0),
    ));
    mech.attach(
        mech.root(),
        rocker_joint,
        Transform3D::translation(rocker_before, root_frame, Vector3::new(2.0, 0.0, 0.0)),
        rocker,
        None,
    );

    let closure = Joint::new("closure", JointKind::Revolute { axis: Vector3::z_axis() });
    let closure_before = closure.frame_before();
    let closure_after = closure.frame_after();
    mech.add_loop_joint(
        BodyId::new(2),
        BodyId::new(3),
        closure,
        Transform3D::identity(closure_before, coupler_tip),
        Transform3D::identity(closure_after, rocker_tip),
    );
    Arc::new(mech)
}

#[test]
fn four_bar_constraint_residuals_vanish() {
    let mech = four_bar();
    let mut state = MechanismState::new(Arc::clone(&mech));
    // Closed parallelogram configuration, compatible velocity.
    state.set_configuration(&[FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2]);
    let omega = 0.9;
    state.set_velocity(&[omega, -omega, omega]);

    let mut result = DynamicsResult::new(&mech);
    let tau = DVector::zeros(3);
    dynamics(&mut state, &mut result, &tau, &no_external(&mech)).unwrap();

    // The compatible velocity satisfies K·v = 0.
    let kv = &result.constraint_jacobian * state.velocity();
    assert!(kv.norm() < 1e-9, "K·v = {}", kv.norm());

    // λ finite, acceleration-level constraint satisfied.
    assert!(result.lambda.iter().all(|x| x.is_finite()));
    let residual = &result.constraint_jacobian * &result.vd + &result.constraint_bias;
    assert!(residual.norm() < 1e-9, "K·v̇ + k = {}", residual.norm());

    // Full KKT residual: M·v̇ + c + Kᵀ·λ = τ.
    let m_full = full_mass_matrix(&result.mass_matrix);
    let kkt = &m_full * &result.vd
        + &result.dynamics_bias
        + result.constraint_jacobian.transpose() * &result.lambda
        - &tau;
    assert!(kkt.norm() < 1e-8, "KKT residual = {}", kkt.norm());
}

#[test]
fn contact_with_ground_halfspace_dissipates() {
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
    let mech = Arc::new(mech);

    let mut state = MechanismState::new(Arc::clone(&mech));
    let free = mech.find_joint("free").unwrap();
    state.set_joint_configuration(free, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.01]);
    state.set_joint_velocity(free, &[0.0, 0.0, 0.0, 0.0, 0.0, -0.5]);

    let mut result = DynamicsResult::new(&mech);
    let tau = DVector::zeros(6);
    let external = no_external(&mech);

    let energy = |q: &[f64], v: &[f64]| {
        // ½·|v|² + g·z for the unit point mass.
        0.5 * (v[3] * v[3] + v[4] * v[4] + v[5] * v[5]) + 9.81 * q[6]
    };
    let e0 = energy(
        state.joint_configuration(free),
        state.joint_velocity(free),
    );

    let dt = 1e-4;
    let mut q_dot = vec![0.0; mech.num_positions()];
    let mut saw_contact_force = false;
    let mut min_z: f64 = 1.0;
    for _ in 0..10_000 {
        dynamics(&mut state, &mut result, &tau, &external).unwrap();
        if result.contact_wrenches[1].linear.z > 0.0 {
            saw_contact_force = true;
        }
        let v_new: Vec<f64> = state
            .velocity()
            .iter()
            .zip(result.vd.iter())
            .map(|(v, a)| v + dt * a)
            .collect();
        state.set_velocity(&v_new);
        state.configuration_derivative(&mut q_dot);
        let q_new: Vec<f64> = state
            .configuration()
            .iter()
            .zip(q_dot.iter())
            .map(|(q, qd)| q + dt * qd)
            .collect();
        state.set_configuration(&q_new);
        let s_new: Vec<f64> = state
            .contact_state()
            .iter()
            .zip(result.contact_state_derivative.iter())
            .map(|(s, ds)| s + dt * ds)
            .collect();
        state.set_contact_state(&s_new);
        min_z = min_z.min(state.joint_configuration(free)[6]);
    }

    assert!(saw_contact_force, "the ball never touched the ground");
    assert!(min_z > -0.02, "the ball tunnelled to z = {min_z}");
    let e1 = energy(
        state.joint_configuration(free),
        state.joint_velocity(free),
    );
    assert!(
        e1 < 0.9 * e0,
        "contact failed to dissipate: E {e0} -> {e1}"
    );
}
