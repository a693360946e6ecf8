//! Joints: the closed set of joint kinds and their capability surface.
//!
//! Dispatch over [`JointKind`] is a hand-rolled `match` — the set is closed
//! and dispatch sits on the hot path of every recursion.

use nalgebra::{Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use rand::Rng;

use mech_spatial::{
    se3, CartesianFrame3D, GeometricJacobian, SpatialAcceleration, Transform3D, Twist, Wrench,
    WrenchMatrix,
};

/// The kind of a joint, fixing its position/velocity dimensions and motion
/// subspace.
#[derive(Debug, Clone)]
pub enum JointKind {
    /// 6-DoF free motion; configuration is a unit quaternion plus a
    /// translation `(w, x, y, z, px, py, pz)`, velocity is the body-frame
    /// twist `(ω, v)`.
    Floating,
    /// 1-DoF rotation about a body-fixed unit axis.
    Revolute {
        /// Rotation axis, expressed in both joint frames.
        axis: Unit<Vector3<f64>>,
    },
    /// 1-DoF translation along a body-fixed unit axis.
    Prismatic {
        /// Translation axis, expressed in both joint frames.
        axis: Unit<Vector3<f64>>,
    },
    /// 0-DoF rigid attachment.
    Fixed,
}

impl JointKind {
    /// Configuration vector dimension.
    #[must_use]
    pub fn num_positions(&self) -> usize {
        match self {
            JointKind::Floating => 7,
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => 1,
            JointKind::Fixed => 0,
        }
    }

    /// Velocity vector dimension.
    #[must_use]
    pub fn num_velocities(&self) -> usize {
        match self {
            JointKind::Floating => 6,
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => 1,
            JointKind::Fixed => 0,
        }
    }
}

/// A joint connecting a predecessor body (via `frame_before`) to a
/// successor body (via `frame_after`).
///
/// The joint transform maps `frame_after` to `frame_before`; the joint
/// twist is the motion of `frame_after` with respect to `frame_before`,
/// expressed in `frame_after`.
#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    frame_before: CartesianFrame3D,
    frame_after: CartesianFrame3D,
    kind: JointKind,
}

impl Joint {
    /// Create a joint with fresh before/after frames.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: JointKind) -> Self {
        Self {
            name: name.into(),
            frame_before: CartesianFrame3D::new(),
            frame_after: CartesianFrame3D::new(),
            kind,
        }
    }

    /// Joint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame attached to the predecessor body.
    #[must_use]
    pub fn frame_before(&self) -> CartesianFrame3D {
        self.frame_before
    }

    /// Frame attached to the successor body.
    #[must_use]
    pub fn frame_after(&self) -> CartesianFrame3D {
        self.frame_after
    }

    /// The joint kind.
    #[must_use]
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    /// Configuration vector dimension.
    #[must_use]
    pub fn num_positions(&self) -> usize {
        self.kind.num_positions()
    }

    /// Velocity vector dimension.
    #[must_use]
    pub fn num_velocities(&self) -> usize {
        self.kind.num_velocities()
    }

    fn unit_quaternion(q: &[f64]) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
    }

    /// Joint transform from `frame_after` to `frame_before` at
    /// configuration `q`.
    #[must_use]
    pub fn joint_transform(&self, q: &[f64]) -> Transform3D {
        assert_eq!(q.len(), self.num_positions(), "configuration length");
        match &self.kind {
            JointKind::Floating => {
                let quat = Self::unit_quaternion(q);
                Transform3D::from_quaternion(
                    self.frame_after,
                    self.frame_before,
                    &quat,
                    Vector3::new(q[4], q[5], q[6]),
                )
            }
            JointKind::Revolute { axis } => Transform3D::rotation(
                self.frame_after,
                self.frame_before,
                Rotation3::from_axis_angle(axis, q[0]).into_inner(),
            ),
            JointKind::Prismatic { axis } => Transform3D::translation(
                self.frame_after,
                self.frame_before,
                axis.into_inner() * q[0],
            ),
            JointKind::Fixed => Transform3D::identity(self.frame_after, self.frame_before),
        }
    }

    /// Twist of `frame_after` with respect to `frame_before`, expressed in
    /// `frame_after`.
    #[must_use]
    pub fn joint_twist(&self, _q: &[f64], v: &[f64]) -> Twist {
        assert_eq!(v.len(), self.num_velocities(), "velocity length");
        let (angular, linear) = match &self.kind {
            JointKind::Floating => (
                Vector3::new(v[0], v[1], v[2]),
                Vector3::new(v[3], v[4], v[5]),
            ),
            JointKind::Revolute { axis } => (axis.into_inner() * v[0], Vector3::zeros()),
            JointKind::Prismatic { axis } => (Vector3::zeros(), axis.into_inner() * v[0]),
            JointKind::Fixed => (Vector3::zeros(), Vector3::zeros()),
        };
        Twist::new(
            self.frame_after,
            self.frame_before,
            self.frame_after,
            angular,
            linear,
        )
    }

    /// Motion subspace `S`: maps the joint velocity to the joint twist.
    ///
    /// Frames: body `frame_after`, base `frame_before`, expressed in
    /// `frame_after`. Constant for every kind.
    #[must_use]
    pub fn motion_subspace(&self) -> GeometricJacobian {
        let mut s = GeometricJacobian::zeros(
            self.frame_after,
            self.frame_before,
            self.frame_after,
            self.num_velocities(),
        );
        match &self.kind {
            JointKind::Floating => {
                for i in 0..3 {
                    let e = Vector3::ith(i, 1.0);
                    s.set_col(i, &e, &Vector3::zeros());
                    s.set_col(i + 3, &Vector3::zeros(), &e);
                }
            }
            JointKind::Revolute { axis } => {
                s.set_col(0, &axis.into_inner(), &Vector3::zeros());
            }
            JointKind::Prismatic { axis } => {
                s.set_col(0, &Vector3::zeros(), &axis.into_inner());
            }
            JointKind::Fixed => {}
        }
        s
    }

    /// Bias acceleration of the joint in its own frame.
    ///
    /// Zero for every kind here: the motion subspaces are constant in
    /// `frame_after`.
    #[must_use]
    pub fn bias_acceleration(&self, _q: &[f64], _v: &[f64]) -> SpatialAcceleration {
        SpatialAcceleration::zero(self.frame_after, self.frame_before, self.frame_after)
    }

    /// Constraint wrench subspace `T`, complementary to the motion
    /// subspace, expressed in `frame_after`. Has `6 - nv` columns.
    #[must_use]
    pub fn constraint_wrench_subspace(&self) -> WrenchMatrix {
        let cols = 6 - self.num_velocities();
        let mut t = WrenchMatrix::zeros(self.frame_after, cols);
        match &self.kind {
            JointKind::Floating => {}
            JointKind::Revolute { axis } => {
                // Three pure forces, two torques perpendicular to the axis.
                for i in 0..3 {
                    t.set_col(i, &Vector3::zeros(), &Vector3::ith(i, 1.0));
                }
                let (b1, b2) = perpendicular_basis(axis);
                t.set_col(3, &b1, &Vector3::zeros());
                t.set_col(4, &b2, &Vector3::zeros());
            }
            JointKind::Prismatic { axis } => {
                // Three pure torques, two forces perpendicular to the axis.
                for i in 0..3 {
                    t.set_col(i, &Vector3::ith(i, 1.0), &Vector3::zeros());
                }
                let (b1, b2) = perpendicular_basis(axis);
                t.set_col(3, &Vector3::zeros(), &b1);
                t.set_col(4, &Vector3::zeros(), &b2);
            }
            JointKind::Fixed => {
                for i in 0..3 {
                    t.set_col(i, &Vector3::ith(i, 1.0), &Vector3::zeros());
                    t.set_col(i + 3, &Vector3::zeros(), &Vector3::ith(i, 1.0));
                }
            }
        }
        t
    }

    /// Map joint velocity to configuration derivative: `q̇ = f(q, v)`.
    pub fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        assert_eq!(q_dot.len(), self.num_positions(), "q̇ length");
        match &self.kind {
            JointKind::Floating => {
                let quat = Self::unit_quaternion(q);
                let omega = Vector3::new(v[0], v[1], v[2]);
                // q̇ = ½ q ⊗ (0, ω) for body-frame angular velocity.
                let qdot = quat.into_inner() * Quaternion::from_imag(omega) * 0.5;
                q_dot[0] = qdot.w;
                q_dot[1] = qdot.i;
                q_dot[2] = qdot.j;
                q_dot[3] = qdot.k;
                let pdot = quat * Vector3::new(v[3], v[4], v[5]);
                q_dot[4] = pdot.x;
                q_dot[5] = pdot.y;
                q_dot[6] = pdot.z;
            }
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => q_dot[0] = v[0],
            JointKind::Fixed => {}
        }
    }

    /// Map configuration derivative to joint velocity: `v = f(q, q̇)`.
    pub fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        assert_eq!(v.len(), self.num_velocities(), "velocity length");
        match &self.kind {
            JointKind::Floating => {
                let quat = Self::unit_quaternion(q);
                let qdot = Quaternion::new(q_dot[0], q_dot[1], q_dot[2], q_dot[3]);
                // (0, ω) = 2 q⁻¹ ⊗ q̇
                let omega = (quat.into_inner().conjugate() * qdot).imag() * 2.0;
                v[0] = omega.x;
                v[1] = omega.y;
                v[2] = omega.z;
                let vel = quat.inverse() * Vector3::new(q_dot[4], q_dot[5], q_dot[6]);
                v[3] = vel.x;
                v[4] = vel.y;
                v[5] = vel.z;
            }
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => v[0] = q_dot[0],
            JointKind::Fixed => {}
        }
    }

    /// Joint torque from a wrench expressed in `frame_after`: `τ = Sᵀ·w`.
    pub fn joint_torque(&self, wrench: &Wrench, tau: &mut [f64]) {
        debug_assert_eq!(wrench.frame, self.frame_after, "wrench frame");
        assert_eq!(tau.len(), self.num_velocities(), "torque length");
        match &self.kind {
            JointKind::Floating => {
                tau[0] = wrench.angular.x;
                tau[1] = wrench.angular.y;
                tau[2] = wrench.angular.z;
                tau[3] = wrench.linear.x;
                tau[4] = wrench.linear.y;
                tau[5] = wrench.linear.z;
            }
            JointKind::Revolute { axis } => tau[0] = axis.dot(&wrench.angular),
            JointKind::Prismatic { axis } => tau[0] = axis.dot(&wrench.linear),
            JointKind::Fixed => {}
        }
    }

    /// Write the zero (reference) configuration.
    pub fn zero_configuration(&self, q: &mut [f64]) {
        assert_eq!(q.len(), self.num_positions(), "configuration length");
        match &self.kind {
            JointKind::Floating => {
                q[0] = 1.0;
                for slot in q.iter_mut().skip(1) {
                    *slot = 0.0;
                }
            }
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => q[0] = 0.0,
            JointKind::Fixed => {}
        }
    }

    /// Write a random configuration.
    pub fn rand_configuration<R: Rng + ?Sized>(&self, q: &mut [f64], rng: &mut R) {
        assert_eq!(q.len(), self.num_positions(), "configuration length");
        match &self.kind {
            JointKind::Floating => {
                // Uniform unit quaternion via rejection sampling in the 4-ball.
                let (w, x, y, z) = loop {
                    let w = rng.gen_range(-1.0..1.0);
                    let x = rng.gen_range(-1.0..1.0);
                    let y = rng.gen_range(-1.0..1.0);
                    let z = rng.gen_range(-1.0..1.0);
                    let n2: f64 = w * w + x * x + y * y + z * z;
                    if n2 > 1e-6 && n2 <= 1.0 {
                        let n = n2.sqrt();
                        break (w / n, x / n, y / n, z / n);
                    }
                };
                q[0] = w;
                q[1] = x;
                q[2] = y;
                q[3] = z;
                for slot in q.iter_mut().skip(4) {
                    *slot = rng.gen_range(-1.0..1.0);
                }
            }
            JointKind::Revolute { .. } => {
                q[0] = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
            }
            JointKind::Prismatic { .. } => q[0] = rng.gen_range(-1.0..1.0),
            JointKind::Fixed => {}
        }
    }

    /// Renormalize the configuration (unit quaternion for floating joints).
    pub fn normalize_configuration(&self, q: &mut [f64]) {
        if let JointKind::Floating = self.kind {
            let n = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
            assert!(n > 0.0, "cannot normalize a zero quaternion");
            for slot in q.iter_mut().take(4) {
                *slot /= n;
            }
        }
    }

    /// Local exponential coordinates `ϕ` (and `ϕ̇`) of `q` around `q0`.
    ///
    /// For the floating joint: `ϕ = log(T(q0)⁻¹·T(q))` with `ϕ̇` from the
    /// joint twist at `q`, treating `q0` as stationary. For 1-DoF joints
    /// this is the configuration difference.
    pub fn local_coordinates(
        &self,
        phi: &mut [f64],
        phi_dot: &mut [f64],
        q0: &[f64],
        q: &[f64],
        v: &[f64],
    ) {
        assert_eq!(phi.len(), self.num_velocities(), "ϕ length");
        assert_eq!(phi_dot.len(), self.num_velocities(), "ϕ̇ length");
        match &self.kind {
            JointKind::Floating => {
                let rot0 = Self::unit_quaternion(q0).to_rotation_matrix().into_inner();
                let rot = Self::unit_quaternion(q).to_rotation_matrix().into_inner();
                let p0 = Vector3::new(q0[4], q0[5], q0[6]);
                let p = Vector3::new(q[4], q[5], q[6]);
                let rel_rot = rot0.transpose() * rot;
                let rel_trans = rot0.transpose() * (p - p0);
                let omega = Vector3::new(v[0], v[1], v[2]);
                let vel = Vector3::new(v[3], v[4], v[5]);
                let ((theta, nu), (theta_dot, nu_dot)) =
                    se3::log_with_time_derivative(&rel_rot, &rel_trans, &omega, &vel);
                for i in 0..3 {
                    phi[i] = theta[i];
                    phi[i + 3] = nu[i];
                    phi_dot[i] = theta_dot[i];
                    phi_dot[i + 3] = nu_dot[i];
                }
            }
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => {
                phi[0] = q[0] - q0[0];
                phi_dot[0] = v[0];
            }
            JointKind::Fixed => {}
        }
    }

    /// Configuration from local exponential coordinates around `q0`:
    /// `q = T(q0)·exp(ϕ)` for the floating joint, `q0 + ϕ` for 1-DoF.
    pub fn global_coordinates(&self, q: &mut [f64], q0: &[f64], phi: &[f64]) {
        assert_eq!(phi.len(), self.num_velocities(), "ϕ length");
        match &self.kind {
            JointKind::Floating => {
                let quat0 = Self::unit_quaternion(q0);
                let rot0 = quat0.to_rotation_matrix().into_inner();
                let p0 = Vector3::new(q0[4], q0[5], q0[6]);
                let theta = Vector3::new(phi[0], phi[1], phi[2]);
                let nu = Vector3::new(phi[3], phi[4], phi[5]);
                let (rel_rot, rel_trans) = se3::exp(&theta, &nu);
                let rot = Rotation3::from_matrix_unchecked(rot0 * rel_rot);
                let quat = UnitQuaternion::from_rotation_matrix(&rot);
                q[0] = quat.w;
                q[1] = quat.i;
                q[2] = quat.j;
                q[3] = quat.k;
                let p = p0 + rot0 * rel_trans;
                q[4] = p.x;
                q[5] = p.y;
                q[6] = p.z;
            }
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => q[0] = q0[0] + phi[0],
            JointKind::Fixed => {}
        }
    }

    /// Joint with reversed direction: before/after frames swap, and the
    /// axis is negated for revolute/prismatic kinds. Used when re-rooting
    /// subtrees.
    #[must_use]
    pub fn flip_direction(&self) -> Joint {
        let kind = match &self.kind {
            JointKind::Revolute { axis } => JointKind::Revolute {
                axis: Unit::new_unchecked(-axis.into_inner()),
            },
            JointKind::Prismatic { axis } => JointKind::Prismatic {
                axis: Unit::new_unchecked(-axis.into_inner()),
            },
            other => other.clone(),
        };
        Joint {
            name: self.name.clone(),
            frame_before: self.frame_after,
            frame_after: self.frame_before,
            kind,
        }
    }
}

/// Two unit vectors completing `axis` to an orthonormal basis.
fn perpendicular_basis(axis: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let a = axis.into_inner();
    // Pick the coordinate axis least aligned with `a`.
    let helper = if a.x.abs() <= a.y.abs() && a.x.abs() <= a.z.abs() {
        Vector3::x()
    } else if a.y.abs() <= a.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let b1 = a.cross(&helper).normalize();
    let b2 = a.cross(&b1);
    (b1, b2)
}
