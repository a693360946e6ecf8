//! Environment half-space primitive.

use nalgebra::{Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A half-space `{ p : n·(p - p₀) ≤ 0 }` bounded by the plane through
/// `point` with unit `outward_normal`.
///
/// Points with negative separation are inside the material; the separation
/// is the signed distance along the outward normal.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalfSpace3D {
    /// A point on the boundary plane, in world coordinates.
    pub point: Vector3<f64>,
    /// Outward unit normal of the boundary plane.
    pub outward_normal: Unit<Vector3<f64>>,
}

impl HalfSpace3D {
    /// Create a half-space from a plane point and outward normal.
    #[must_use]
    pub fn new(point: Vector3<f64>, outward_normal: Unit<Vector3<f64>>) -> Self {
        Self {
            point,
            outward_normal,
        }
    }

    /// The ground plane `z ≤ 0`.
    #[must_use]
    pub fn ground() -> Self {
        Self::new(Vector3::zeros(), Vector3::z_axis())
    }

    /// Signed distance of `p` from the boundary along the outward normal.
    /// Negative inside the half-space material.
    #[inline]
    #[must_use]
    pub fn separation(&self, p: &Vector3<f64>) -> f64 {
        self.outward_normal.dot(&(p - self.point))
    }

    /// Whether `p` lies inside the half-space material.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        self.separation(p) <= 0.0
    }
}
