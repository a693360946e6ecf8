//! Rigid bodies: inertia, body-fixed frames, and contact points.

use mech_contact::ContactPoint;
use mech_spatial::{CartesianFrame3D, SpatialInertia, Transform3D};

/// A rigid body in a mechanism.
///
/// Carries an optional spatial inertia (the root body has none), a set of
/// body-fixed frame definitions, and any registered contact points.
///
/// # Frame definitions
///
/// Each definition is a transform from some body-fixed frame to the body's
/// *default frame*. The default frame is always among the definitions, as
/// the identity. When a body becomes a joint's successor, the joint's
/// `frame_after` becomes the body's default frame (see
/// [`Mechanism::attach`](crate::Mechanism::attach)).
#[derive(Debug, Clone)]
pub struct RigidBody {
    name: String,
    default_frame: CartesianFrame3D,
    /// Inertia expressed in the default frame, `None` for the root body.
    inertia: Option<SpatialInertia>,
    /// Transforms from body-fixed frames to the default frame.
    frame_definitions: Vec<Transform3D>,
    contact_points: Vec<ContactPoint>,
}

impl RigidBody {
    /// Create a body whose default frame is `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `inertia` is present but expressed in a different frame.
    #[must_use]
    pub fn new(name: impl Into<String>, frame: CartesianFrame3D, inertia: Option<SpatialInertia>) -> Self {
        if let Some(ref i) = inertia {
            assert_eq!(
                i.frame, frame,
                "body inertia must be expressed in the body's default frame"
            );
        }
        Self {
            name: name.into(),
            default_frame: frame,
            inertia,
            frame_definitions: vec![Transform3D::identity(frame, frame)],
            contact_points: Vec::new(),
        }
    }

    /// Massless body with a fresh default frame (typical root body).
    #[must_use]
    pub fn new_root(name: impl Into<String>) -> Self {
        Self::new(name, CartesianFrame3D::new(), None)
    }

    /// Body name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The body's default frame.
    #[must_use]
    pub fn default_frame(&self) -> CartesianFrame3D {
        self.default_frame
    }

    /// The body's spatial inertia, if any, expressed in the default frame.
    #[must_use]
    pub fn inertia(&self) -> Option<&SpatialInertia> {
        self.inertia.as_ref()
    }

    /// All frame definitions (transforms to the default frame).
    #[must_use]
    pub fn frame_definitions(&self) -> &[Transform3D] {
        &self.frame_definitions
    }

    /// Whether `frame` is fixed to this body.
    #[must_use]
    pub fn is_fixed_to_body(&self, frame: CartesianFrame3D) -> bool {
        self.frame_definitions.iter().any(|t| t.from == frame)
    }

    /// Transform from `frame` to the default frame, if `frame` is defined
    /// on this body.
    #[must_use]
    pub fn try_frame_definition(&self, frame: CartesianFrame3D) -> Option<Transform3D> {
        self.frame_definitions
            .iter()
            .find(|t| t.from == frame)
            .copied()
    }

    /// Transform from `frame` to the default frame.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not fixed to this body (programming error).
    #[must_use]
    pub fn frame_definition(&self, frame: CartesianFrame3D) -> Transform3D {
        self.try_frame_definition(frame).unwrap_or_else(|| {
            panic!("{frame:?} is not fixed to body '{}'", self.name);
        })
    }

    /// Register an additional body-fixed frame.
    ///
    /// `definition.to` must already be fixed to this body; the stored
    /// definition is composed down to the default frame.
    ///
    /// # Panics
    ///
    /// Panics if `definition.to` is not fixed to this body, or the source
    /// frame already is.
    pub fn add_frame_definition(&mut self, definition: Transform3D) {
        assert!(
            !self.is_fixed_to_body(definition.from),
            "{:?} is already fixed to body '{}'",
            definition.from,
            self.name
        );
        let to_default = self.frame_definition(definition.to);
        self.frame_definitions.push(to_default * definition);
    }

    /// Register a contact point (location in the default frame).
    pub fn add_contact_point(&mut self, point: ContactPoint) {
        self.contact_points.push(point);
    }

    /// Registered contact points.
    #[must_use]
    pub fn contact_points(&self) -> &[ContactPoint] {
        &self.contact_points
    }

    /// Append an already-composed definition (transform to the default
    /// frame). Used by body merging, where composition happened upstream.
    pub(crate) fn push_raw_frame_definition(&mut self, definition: Transform3D) {
        debug_assert_eq!(definition.to, self.default_frame, "definition target frame");
        self.frame_definitions.push(definition);
    }

    /// Add `inertia` (already expressed in the default frame) to this
    /// body's inertia.
    pub(crate) fn set_inertia_sum(&mut self, inertia: SpatialInertia) {
        match &mut self.inertia {
            Some(own) => *own += inertia,
            None => self.inertia = Some(inertia),
        }
    }

    /// Drop the inertia (used when merging into the massless root).
    pub(crate) fn clear_inertia(&mut self) {
        self.inertia = None;
    }

    /// Change the default frame.
    ///
    /// `old_to_new` maps the current default frame to the new one. The
    /// inertia, every frame definition, and every contact point location
    /// are re-expressed in the new frame.
    pub(crate) fn rebase(&mut self, old_to_new: Transform3D) {
        assert_eq!(
            old_to_new.from, self.default_frame,
            "rebase transform must start at the current default frame"
        );
        let new_frame = old_to_new.to;
        self.inertia = self.inertia.map(|i| i.transform(&old_to_new));
        for def in &mut self.frame_definitions {
            *def = old_to_new * *def;
        }
        for point in &mut self.contact_points {
            point.location = old_to_new.transform_point(&point.location);
        }
        self.default_frame = new_frame;
        if !self.is_fixed_to_body(new_frame) {
            self.frame_definitions
                .push(Transform3D::identity(new_frame, new_frame));
        }
    }
}
