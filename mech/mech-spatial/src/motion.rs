//! Motion-space spatial vectors: twists and spatial accelerations.

use nalgebra::Vector3;

use crate::frame::{check_frame, CartesianFrame3D};
use crate::transform::Transform3D;
use crate::wrench::{Momentum, Wrench};

/// Relative velocity of `body` with respect to `base`, expressed in `frame`.
///
/// Angular and linear parts follow Featherstone's `[ω; v]` convention, with
/// the linear part being the velocity of the point of `body` currently
/// coincident with the origin of `frame`.
#[derive(Debug, Clone, Copy)]
pub struct Twist {
    /// Frame rigidly attached to the moving body.
    pub body: CartesianFrame3D,
    /// Frame the motion is measured against.
    pub base: CartesianFrame3D,
    /// Frame the coordinates are expressed in.
    pub frame: CartesianFrame3D,
    /// Angular velocity ω.
    pub angular: Vector3<f64>,
    /// Linear velocity v.
    pub linear: Vector3<f64>,
}

impl Twist {
    /// Create a twist from its parts.
    #[must_use]
    pub fn new(
        body: CartesianFrame3D,
        base: CartesianFrame3D,
        frame: CartesianFrame3D,
        angular: Vector3<f64>,
        linear: Vector3<f64>,
    ) -> Self {
        Self {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    /// Zero twist.
    #[must_use]
    pub fn zero(body: CartesianFrame3D, base: CartesianFrame3D, frame: CartesianFrame3D) -> Self {
        Self::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Re-express this twist in the destination frame of `t`.
    ///
    /// Requires `t.from == self.frame`. Body/base tags are unchanged.
    #[must_use]
    pub fn transform(&self, t: &Transform3D) -> Self {
        check_frame(t.from, self.frame);
        let angular = t.rot * self.angular;
        let linear = t.rot * self.linear + t.trans.cross(&angular);
        Self {
            body: self.body,
            base: self.base,
            frame: t.to,
            angular,
            linear,
        }
    }

    /// Velocity of the point currently at `point` (expressed in `frame`).
    #[inline]
    #[must_use]
    pub fn point_velocity(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(point)
    }

    /// Spatial cross product of two motion vectors: `self ×ₘ rhs`.
    ///
    /// This is the velocity-product term of acceleration propagation; the
    /// result inherits `rhs`'s body/base tags.
    #[must_use]
    pub fn cross(&self, rhs: &Twist) -> SpatialAcceleration {
        check_frame(self.frame, rhs.frame);
        SpatialAcceleration {
            body: rhs.body,
            base: rhs.base,
            frame: self.frame,
            angular: self.angular.cross(&rhs.angular),
            linear: self.angular.cross(&rhs.linear) + self.linear.cross(&rhs.angular),
        }
    }

    /// Spatial cross product against a force-space vector: `self ×* h`.
    ///
    /// Used in the Newton–Euler body wrench `I·a + v ×* (I·v)`.
    #[must_use]
    pub fn cross_force(&self, h: &Momentum) -> Wrench {
        check_frame(self.frame, h.frame);
        Wrench {
            frame: self.frame,
            angular: self.angular.cross(&h.angular) + self.linear.cross(&h.linear),
            linear: self.angular.cross(&h.linear),
        }
    }
}

impl std::ops::Add for Twist {
    type Output = Twist;

    /// Chain twists: `(body B wrt A) + (body C wrt B) = body C wrt A`.
    fn add(self, rhs: Twist) -> Twist {
        check_frame(self.frame, rhs.frame);
        check_frame(self.body, rhs.base);
        Twist {
            body: rhs.body,
            base: self.base,
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        }
    }
}

impl std::ops::Sub for Twist {
    type Output = Twist;

    /// Relative twist: `(body wrt W) - (base wrt W) = body wrt base`.
    fn sub(self, rhs: Twist) -> Twist {
        check_frame(self.frame, rhs.frame);
        check_frame(self.base, rhs.base);
        Twist {
            body: self.body,
            base: rhs.body,
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        }
    }
}

impl std::ops::Neg for Twist {
    type Output = Twist;

    /// Reverse the direction of motion (swaps body and base).
    fn neg(self) -> Twist {
        Twist {
            body: self.base,
            base: self.body,
            frame: self.frame,
            angular: -self.angular,
            linear: -self.linear,
        }
    }
}

impl std::ops::Mul<f64> for Twist {
    type Output = Twist;

    fn mul(self, rhs: f64) -> Twist {
        Twist {
            angular: self.angular * rhs,
            linear: self.linear * rhs,
            ..self
        }
    }
}

/// Relative spatial acceleration of `body` with respect to `base`,
/// expressed in `frame`.
///
/// Same layout and tag discipline as [`Twist`]. The plain [`transform`]
/// here is the rigid re-expression valid for quantities whose associated
/// relative velocities vanish (constant subspaces, bias-free terms); the
/// recursive algorithms compose accelerations directly in the world frame
/// so no velocity-corrected transform is needed.
///
/// [`transform`]: SpatialAcceleration::transform
#[derive(Debug, Clone, Copy)]
pub struct SpatialAcceleration {
    /// Frame rigidly attached to the accelerating body.
    pub body: CartesianFrame3D,
    /// Frame the acceleration is measured against.
    pub base: CartesianFrame3D,
    /// Frame the coordinates are expressed in.
    pub frame: CartesianFrame3D,
    /// Angular part α.
    pub angular: Vector3<f64>,
    /// Linear part a.
    pub linear: Vector3<f64>,
}

impl SpatialAcceleration {
    /// Create a spatial acceleration from its parts.
    #[must_use]
    pub fn new(
        body: CartesianFrame3D,
        base: CartesianFrame3D,
        frame: CartesianFrame3D,
        angular: Vector3<f64>,
        linear: Vector3<f64>,
    ) -> Self {
        Self {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    /// Zero acceleration.
    #[must_use]
    pub fn zero(body: CartesianFrame3D, base: CartesianFrame3D, frame: CartesianFrame3D) -> Self {
        Self::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Rigid re-expression in the destination frame of `t`.
    #[must_use]
    pub fn transform(&self, t: &Transform3D) -> Self {
        check_frame(t.from, self.frame);
        let angular = t.rot * self.angular;
        let linear = t.rot * self.linear + t.trans.cross(&angular);
        Self {
            body: self.body,
            base: self.base,
            frame: t.to,
            angular,
            linear,
        }
    }
}

impl std::ops::Add for SpatialAcceleration {
    type Output = SpatialAcceleration;

    fn add(self, rhs: SpatialAcceleration) -> SpatialAcceleration {
        check_frame(self.frame, rhs.frame);
        check_frame(self.body, rhs.base);
        SpatialAcceleration {
            body: rhs.body,
            base: self.base,
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        }
    }
}

impl std::ops::Sub for SpatialAcceleration {
    type Output = SpatialAcceleration;

    fn sub(self, rhs: SpatialAcceleration) -> SpatialAcceleration {
        check_frame(self.frame, rhs.frame);
        check_frame(self.base, rhs.base);
        SpatialAcceleration {
            body: self.body,
            base: rhs.body,
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        }
    }
}

impl std::ops::Mul<f64> for SpatialAcceleration {
    type Output = SpatialAcceleration;

    fn mul(self, rhs: f64) -> SpatialAcceleration {
        SpatialAcceleration {
            angular: self.angular * rhs,
            linear: self.linear * rhs,
            ..self
        }
    }
}
