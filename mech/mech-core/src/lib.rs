//! Kinematic-tree rigid-body dynamics.
//!
//! The crate follows a Model/Data split:
//!
//! - [`Mechanism`] is static: the kinematic tree (bodies, joints,
//!   topological order, index maps), loop joints, gravity, and the
//!   contact environment. Immutable once states exist; shareable across
//!   any number of states.
//! - [`MechanismState`] is dynamic: `(q, v, s)` are the source of truth,
//!   and every derived quantity (world transforms, twists, bias
//!   accelerations, motion subspaces, composite inertias) is a lazily
//!   recomputed cache guarded by dirty flags.
//! - [`DynamicsResult`] carries preallocated outputs and scratch so the
//!   per-step pipeline never allocates.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Mechanism                            │
//! │  Static: bodies, tree joints, loop joints, index maps       │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ Arc
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MechanismState                          │
//! │  Dynamic: q, v, s → transforms, twists, biases, S, I_crb    │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ reads
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Algorithms: CRBA, RNEA, Jacobians, constraints, contact,   │
//! │  KKT solve → DynamicsResult                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```
//! use mech_core::{dynamics_alloc, Joint, JointKind, Mechanism, MechanismState, RigidBody};
//! use mech_spatial::{SpatialInertia, Transform3D, Wrench};
//! use nalgebra::{DVector, Vector3};
//! use std::sync::Arc;
//!
//! // A pendulum: hinge about y at the origin, unit mass at (1, 0, 0).
//! let mut mechanism = Mechanism::new(RigidBody::new_root("world"), Vector3::new(0.0, 0.0, -9.81));
//! let root_frame = mechanism.root_frame();
//! let joint = Joint::new("pin", JointKind::Revolute { axis: Vector3::y_axis() });
//! let before = joint.frame_before();
//! let link_frame = joint.frame_after();
//! let link = RigidBody::new(
//!     "link",
//!     link_frame,
//!     Some(SpatialInertia::point_mass(link_frame, 1.0, &Vector3::new(1.0, 0.0, 0.0))),
//! );
//! mechanism.attach(
//!     mechanism.root(),
//!     joint,
//!     Transform3D::identity(before, root_frame),
//!     link,
//!     None,
//! );
//!
//! let mechanism = Arc::new(mechanism);
//! let mut state = MechanismState::new(Arc::clone(&mechanism));
//! let tau = DVector::zeros(1);
//! let external = vec![Wrench::zero(mechanism.root_frame()); mechanism.num_bodies()];
//! let result = dynamics_alloc(&mut state, &tau, &external).unwrap();
//! // Positive rotation about +y swings the horizontal link downward.
//! assert!(result.vd[0] > 0.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
    clippy::too_many_lines,        // Recursions naturally have many steps
    clippy::needless_range_loop,   // Index loops mirror the math
    clippy::doc_markdown           // Not all technical terms need backticks
)]

pub mod body;
pub mod contact;
pub mod dynamics;
pub mod energy;
pub mod error;
pub mod jacobian;
pub mod joint;
mod linalg;
pub mod mechanism;
pub mod path;
pub mod results;
pub mod state;

pub use body::RigidBody;
pub use contact::contact_dynamics;
pub use dynamics::{
    dynamics, dynamics_alloc, dynamics_bias, dynamics_bias_into, dynamics_solve,
    inverse_dynamics, inverse_dynamics_into, mass_matrix, mass_matrix_into,
};
pub use dynamics::constraint::constraint_jacobian_and_bias_into;
pub use dynamics::rnea::{newton_euler_into, spatial_accelerations_into};
pub use energy::{
    center_of_mass, center_of_mass_of, gravitational_potential_energy, kinetic_energy, momentum,
};
pub use error::{DynamicsError, Result};
pub use jacobian::{
    geometric_jacobian, geometric_jacobian_into, momentum_matrix, momentum_matrix_into,
    relative_acceleration, relative_twist,
};
pub use joint::{Joint, JointKind};
pub use mechanism::{default_gravity, BodyId, JointId, LoopJoint, Mechanism};
pub use path::{PathDirection, TreePath};
pub use results::DynamicsResult;
pub use state::MechanismState;
