//! Body-fixed contact points.

use nalgebra::Vector3;

use crate::model::SoftContactModel;

/// A contact point rigidly attached to a body.
///
/// `location` is expressed in the owning body's default frame; the dynamics
/// core maps it to world coordinates through the body's cached transform and
/// tests it against every environment half-space.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// Position in the owning body's default frame.
    pub location: Vector3<f64>,
    /// Force model evaluated when this point penetrates a primitive.
    pub model: SoftContactModel,
}

impl ContactPoint {
    /// Create a contact point.
    #[must_use]
    pub fn new(location: Vector3<f64>, model: SoftContactModel) -> Self {
        Self { location, model }
    }
}
