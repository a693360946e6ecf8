//! Homogeneous transforms between tagged frames.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::frame::{check_frame, CartesianFrame3D};

/// A rigid transform from frame `from` to frame `to`.
///
/// Maps points as `p_to = rot * p_from + trans`. Composition and inversion
/// maintain the frame tags; composing transforms whose inner frames differ
/// is a programming error caught by a debug assertion.
#[derive(Debug, Clone, Copy)]
pub struct Transform3D {
    /// Source frame.
    pub from: CartesianFrame3D,
    /// Destination frame.
    pub to: CartesianFrame3D,
    /// Rotation part.
    pub rot: Matrix3<f64>,
    /// Translation part (origin of `from` expressed in `to`).
    pub trans: Vector3<f64>,
}

impl Transform3D {
    /// Create a transform from rotation and translation parts.
    #[must_use]
    pub fn new(
        from: CartesianFrame3D,
        to: CartesianFrame3D,
        rot: Matrix3<f64>,
        trans: Vector3<f64>,
    ) -> Self {
        Self {
            from,
            to,
            rot,
            trans,
        }
    }

    /// Identity transform between two (coincident) frames.
    #[must_use]
    pub fn identity(from: CartesianFrame3D, to: CartesianFrame3D) -> Self {
        Self::new(from, to, Matrix3::identity(), Vector3::zeros())
    }

    /// Pure rotation.
    #[must_use]
    pub fn rotation(from: CartesianFrame3D, to: CartesianFrame3D, rot: Matrix3<f64>) -> Self {
        Self::new(from, to, rot, Vector3::zeros())
    }

    /// Pure rotation from a unit quaternion.
    #[must_use]
    pub fn from_quaternion(
        from: CartesianFrame3D,
        to: CartesianFrame3D,
        quat: &UnitQuaternion<f64>,
        trans: Vector3<f64>,
    ) -> Self {
        Self::new(from, to, quat.to_rotation_matrix().into_inner(), trans)
    }

    /// Pure translation.
    #[must_use]
    pub fn translation(from: CartesianFrame3D, to: CartesianFrame3D, trans: Vector3<f64>) -> Self {
        Self::new(from, to, Matrix3::identity(), trans)
    }

    /// Map a point expressed in `from` to `to`.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rot * p + self.trans
    }

    /// Rotate a free vector (direction) from `from` to `to`.
    #[inline]
    #[must_use]
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rot * v
    }

    /// Inverse transform (swaps the frame tags).
    #[must_use]
    pub fn inv(&self) -> Self {
        let rot_t = self.rot.transpose();
        Self {
            from: self.to,
            to: self.from,
            rot: rot_t,
            trans: -(rot_t * self.trans),
        }
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Transform3D;

    /// Composition `self * rhs`: first `rhs`, then `self`.
    ///
    /// Requires `rhs.to == self.from`; the result maps `rhs.from` to
    /// `self.to`.
    fn mul(self, rhs: Transform3D) -> Transform3D {
        check_frame(self.from, rhs.to);
        Transform3D {
            from: rhs.from,
            to: self.to,
            rot: self.rot * rhs.rot,
            trans: self.rot * rhs.trans + self.trans,
        }
    }
}
