//! Spatial inertia of a rigid body.

use nalgebra::{Matrix3, Vector3};

use crate::frame::{check_frame, CartesianFrame3D};
use crate::motion::{SpatialAcceleration, Twist};
use crate::skew;
use crate::transform::Transform3D;
use crate::wrench::{Momentum, Wrench};

/// Spatial inertia expressed about the origin of `frame`.
///
/// Parameterized as `(J, c, m)`:
/// - `moment` J: 3×3 rotational inertia about the frame origin,
/// - `cross_part` c = m·r_com: first moment of mass,
/// - `mass` m.
///
/// The equivalent 6×6 operator is
///
/// ```text
/// I = [ J     [c]× ]
///     [ [c]×ᵀ  m·E ]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SpatialInertia {
    /// Frame the inertia is expressed in.
    pub frame: CartesianFrame3D,
    /// Rotational inertia about the frame origin.
    pub moment: Matrix3<f64>,
    /// First moment of mass, `m · r_com`.
    pub cross_part: Vector3<f64>,
    /// Mass.
    pub mass: f64,
}

impl SpatialInertia {
    /// Create a spatial inertia from its parts.
    #[must_use]
    pub fn new(
        frame: CartesianFrame3D,
        moment: Matrix3<f64>,
        cross_part: Vector3<f64>,
        mass: f64,
    ) -> Self {
        Self {
            frame,
            moment,
            cross_part,
            mass,
        }
    }

    /// Zero inertia (massless body).
    #[must_use]
    pub fn zero(frame: CartesianFrame3D) -> Self {
        Self::new(frame, Matrix3::zeros(), Vector3::zeros(), 0.0)
    }

    /// Point mass at `pos` (expressed in `frame`).
    #[must_use]
    pub fn point_mass(frame: CartesianFrame3D, mass: f64, pos: &Vector3<f64>) -> Self {
        let p = skew(pos);
        Self {
            frame,
            // Parallel-axis moment of a point: m·(|p|²E − p·pᵀ) = −m·[p]×[p]×
            moment: -(p * p) * mass,
            cross_part: pos * mass,
            mass,
        }
    }

    /// Inertia from center-of-mass quantities: mass, CoM position, and
    /// rotational inertia about the CoM.
    #[must_use]
    pub fn from_com(
        frame: CartesianFrame3D,
        mass: f64,
        com: &Vector3<f64>,
        moment_about_com: Matrix3<f64>,
    ) -> Self {
        let p = skew(com);
        Self {
            frame,
            moment: moment_about_com - (p * p) * mass,
            cross_part: com * mass,
            mass,
        }
    }

    /// Center of mass position in `frame`. Zero for a massless inertia.
    #[must_use]
    pub fn com(&self) -> Vector3<f64> {
        if self.mass == 0.0 {
            Vector3::zeros()
        } else {
            self.cross_part / self.mass
        }
    }

    /// Re-express this inertia in the destination frame of `t` (congruence).
    ///
    /// Derived from `I' = X*·I·X⁻¹` with the force/motion adjoints of `t`:
    /// the mass is invariant, the first moment rotates and shifts, and the
    /// moment picks up the mixed and parallel-axis terms.
    #[must_use]
    pub fn transform(&self, t: &Transform3D) -> Self {
        check_frame(t.from, self.frame);
        let rc = t.rot * self.cross_part;
        let p = t.trans;
        let cross_part = rc + p * self.mass;

        let ph = skew(&p);
        let rch = skew(&rc);
        let moment =
            t.rot * self.moment * t.rot.transpose() - ph * rch - rch * ph - (ph * ph) * self.mass;

        Self {
            frame: t.to,
            moment,
            cross_part,
            mass: self.mass,
        }
    }

    /// Apply the 6×6 operator to raw angular/linear motion coordinates.
    ///
    /// Returns `(J·ω + c×v, m·v − c×ω)`. No frame bookkeeping; the tagged
    /// entry points wrap this.
    #[inline]
    #[must_use]
    pub fn apply(&self, angular: &Vector3<f64>, linear: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.moment * angular + self.cross_part.cross(linear),
            linear * self.mass - self.cross_part.cross(angular),
        )
    }

    /// Momentum of a body with this inertia moving with `twist`.
    #[must_use]
    pub fn momentum(&self, twist: &Twist) -> Momentum {
        check_frame(self.frame, twist.frame);
        let (angular, linear) = self.apply(&twist.angular, &twist.linear);
        Momentum::new(self.frame, angular, linear)
    }

    /// Newton–Euler body wrench: `I·a + v ×* (I·v)`.
    #[must_use]
    pub fn newton_euler(&self, acc: &SpatialAcceleration, twist: &Twist) -> Wrench {
        check_frame(self.frame, acc.frame);
        check_frame(self.frame, twist.frame);
        let (ia_ang, ia_lin) = self.apply(&acc.angular, &acc.linear);
        let h = self.momentum(twist);
        Wrench::new(self.frame, ia_ang, ia_lin) + twist.cross_force(&h)
    }

    /// Kinetic energy of a body with this inertia moving with `twist`.
    #[must_use]
    pub fn kinetic_energy(&self, twist: &Twist) -> f64 {
        0.5 * self.momentum(twist).dot(twist)
    }
}

impl std::ops::Add for SpatialInertia {
    type Output = SpatialInertia;

    fn add(self, rhs: SpatialInertia) -> SpatialInertia {
        check_frame(self.frame, rhs.frame);
        SpatialInertia {
            frame: self.frame,
            moment: self.moment + rhs.moment,
            cross_part: self.cross_part + rhs.cross_part,
            mass: self.mass + rhs.mass,
        }
    }
}

impl std::ops::AddAssign for SpatialInertia {
    fn add_assign(&mut self, rhs: SpatialInertia) {
        check_frame(self.frame, rhs.frame);
        self.moment += rhs.moment;
        self.cross_part += rhs.cross_part;
        self.mass += rhs.mass;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    #[test]
    fn point_mass_momentum_under_translation_twist() {
        let f = CartesianFrame3D::new();
        let body = CartesianFrame3D::new();
        let base = CartesianFrame3D::new();
        let inertia = SpatialInertia::point_mass(f, 2.0, &Vector3::zeros());
        let tw = Twist::new(body, base, f, Vector3::zeros(), Vector3::new(3.0, 0.0, 0.0));
        let h = inertia.momentum(&tw);
        assert_relative_eq!(h.linear, Vector3::new(6.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(h.angular, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn transform_to_com_removes_parallel_axis_terms() {
        let a = CartesianFrame3D::new();
        let b = CartesianFrame3D::new();
        let pos = Vector3::new(0.0, 1.0, 0.0);
        let inertia = SpatialInertia::point_mass(a, 2.0, &pos);
        // Shift the origin onto the point: inertia becomes that of a point
        // mass at the origin (zero moment, zero first moment).
        let t = Transform3D::translation(a, b, -pos);
        let shifted = inertia.transform(&t);
        assert_relative_eq!(shifted.mass, 2.0, epsilon = 1e-12);
        assert_relative_eq!(shifted.cross_part, Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(shifted.moment, Matrix3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn transform_roundtrip() {
        let a = CartesianFrame3D::new();
        let b = CartesianFrame3D::new();
        let inertia = SpatialInertia::from_com(
            a,
            3.0,
            &Vector3::new(0.2, -0.4, 0.6),
            Matrix3::from_diagonal(&Vector3::new(0.1, 0.2, 0.3)),
        );
        let t = Transform3D::new(
            a,
            b,
            Rotation3::from_axis_angle(&Vector3::y_axis(), 1.3).into_inner(),
            Vector3::new(-0.5, 0.1, 2.0),
        );
        let back = inertia.transform(&t).transform(&t.inv());
        assert_relative_eq!(back.mass, inertia.mass, epsilon = 1e-12);
        assert_relative_eq!(back.cross_part, inertia.cross_part, epsilon = 1e-10);
        assert_relative_eq!(back.moment, inertia.moment, epsilon = 1e-10);
    }

    #[test]
    fn kinetic_energy_of_spinning_point_mass() {
        let f = CartesianFrame3D::new();
        let body = CartesianFrame3D::new();
        let base = CartesianFrame3D::new();
        // Unit mass at (1,0,0), spinning about z at 2 rad/s: |v| = 2, E = 2.
        let inertia = SpatialInertia::point_mass(f, 1.0, &Vector3::new(1.0, 0.0, 0.0));
        let tw = Twist::new(body, base, f, Vector3::new(0.0, 0.0, 2.0), Vector3::zeros());
        assert_relative_eq!(inertia.kinetic_energy(&tw), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn energy_invariant_under_transform() {
        let a = CartesianFrame3D::new();
        let b = CartesianFrame3D::new();
        let body = CartesianFrame3D::new();
        let base = CartesianFrame3D::new();
        let inertia = SpatialInertia::from_com(
            a,
            1.5,
            &Vector3::new(0.3, 0.1, -0.2),
            Matrix3::from_diagonal(&Vector3::new(0.4, 0.5, 0.6)),
        );
        let tw = Twist::new(
            body,
            base,
            a,
            Vector3::new(0.7, -0.3, 0.2),
            Vector3::new(0.1, 0.9, -0.4),
        );
        let t = Transform3D::new(
            a,
            b,
            Rotation3::from_axis_angle(&Vector3::z_axis(), -0.9).into_inner(),
            Vector3::new(1.0, 0.0, -1.0),
        );
        let e1 = inertia.kinetic_energy(&tw);
        let e2 = inertia.transform(&t).kinetic_energy(&tw.transform(&t));
        assert_relative_eq!(e1, e2, epsilon = 1e-10);
    }
}
