//! Force-space spatial vectors: wrenches and momenta.

use nalgebra::Vector3;

use crate::frame::{check_frame, CartesianFrame3D};
use crate::motion::Twist;
use crate::transform::Transform3D;

/// A spatial force `[τ; f]` expressed in `frame`.
///
/// The angular part is the moment about the origin of `frame`.
#[derive(Debug, Clone, Copy)]
pub struct Wrench {
    /// Frame the coordinates are expressed in.
    pub frame: CartesianFrame3D,
    /// Moment τ about the frame origin.
    pub angular: Vector3<f64>,
    /// Force f.
    pub linear: Vector3<f64>,
}

impl Wrench {
    /// Create a wrench from its parts.
    #[must_use]
    pub fn new(frame: CartesianFrame3D, angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self {
            frame,
            angular,
            linear,
        }
    }

    /// Zero wrench.
    #[must_use]
    pub fn zero(frame: CartesianFrame3D) -> Self {
        Self::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Wrench of a pure force applied at `point` (both expressed in `frame`).
    #[must_use]
    pub fn from_force_at_point(
        frame: CartesianFrame3D,
        point: &Vector3<f64>,
        force: &Vector3<f64>,
    ) -> Self {
        Self::new(frame, point.cross(force), *force)
    }

    /// Re-express this wrench in the destination frame of `t` (coadjoint).
    #[must_use]
    pub fn transform(&self, t: &Transform3D) -> Self {
        check_frame(t.from, self.frame);
        let linear = t.rot * self.linear;
        Self {
            frame: t.to,
            angular: t.rot * self.angular + t.trans.cross(&linear),
            linear,
        }
    }

    /// Power pairing with a twist: `τ·ω + f·v`.
    #[must_use]
    pub fn dot(&self, twist: &Twist) -> f64 {
        check_frame(self.frame, twist.frame);
        self.angular.dot(&twist.angular) + self.linear.dot(&twist.linear)
    }
}

impl std::ops::Add for Wrench {
    type Output = Wrench;

    fn add(self, rhs: Wrench) -> Wrench {
        check_frame(self.frame, rhs.frame);
        Wrench {
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        }
    }
}

impl std::ops::AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Wrench) {
        check_frame(self.frame, rhs.frame);
        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}

impl std::ops::Sub for Wrench {
    type Output = Wrench;

    fn sub(self, rhs: Wrench) -> Wrench {
        check_frame(self.frame, rhs.frame);
        Wrench {
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        }
    }
}

impl std::ops::Neg for Wrench {
    type Output = Wrench;

    fn neg(self) -> Wrench {
        Wrench {
            frame: self.frame,
            angular: -self.angular,
            linear: -self.linear,
        }
    }
}

impl std::ops::Mul<f64> for Wrench {
    type Output = Wrench;

    fn mul(self, rhs: f64) -> Wrench {
        Wrench {
            frame: self.frame,
            angular: self.angular * rhs,
            linear: self.linear * rhs,
        }
    }
}

/// Spatial momentum `[h_ω; h_v]` expressed in `frame`.
///
/// Transforms coadjointly, like a [`Wrench`].
#[derive(Debug, Clone, Copy)]
pub struct Momentum {
    /// Frame the coordinates are expressed in.
    pub frame: CartesianFrame3D,
    /// Angular momentum about the frame origin.
    pub angular: Vector3<f64>,
    /// Linear momentum.
    pub linear: Vector3<f64>,
}

impl Momentum {
    /// Create a momentum from its parts.
    #[must_use]
    pub fn new(frame: CartesianFrame3D, angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self {
            frame,
            angular,
            linear,
        }
    }

    /// Zero momentum.
    #[must_use]
    pub fn zero(frame: CartesianFrame3D) -> Self {
        Self::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Re-express this momentum in the destination frame of `t` (coadjoint).
    #[must_use]
    pub fn transform(&self, t: &Transform3D) -> Self {
        check_frame(t.from, self.frame);
        let linear = t.rot * self.linear;
        Self {
            frame: t.to,
            angular: t.rot * self.angular + t.trans.cross(&linear),
            linear,
        }
    }

    /// Kinetic-energy pairing with a twist: `h_ω·ω + h_v·v`.
    #[must_use]
    pub fn dot(&self, twist: &Twist) -> f64 {
        check_frame(self.frame, twist.frame);
        self.angular.dot(&twist.angular) + self.linear.dot(&twist.linear)
    }
}

impl std::ops::Add for Momentum {
    type Output = Momentum;

    fn add(self, rhs: Momentum) -> Momentum {
        check_frame(self.frame, rhs.frame);
        Momentum {
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        }
    }
}

impl std::ops::AddAssign for Momentum {
    fn add_assign(&mut self, rhs: Momentum) {
        check_frame(self.frame, rhs.frame);
        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}
