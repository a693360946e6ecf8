//! Frame-tagged spatial vector algebra for rigid-body dynamics.
//!
//! Implements Featherstone's 6D spatial algebra with explicit coordinate
//! frame bookkeeping. Every quantity carries the frame(s) it is expressed
//! in; operations that combine quantities check frame compatibility in
//! debug builds and are branch-free in release builds.
//!
//! Convention: spatial vectors are `[angular; linear]` (Featherstone order).
//!
//! - Motion vectors ([`Twist`], [`SpatialAcceleration`]): `[ω; v]`
//! - Force vectors ([`Wrench`], [`Momentum`]): `[τ; f]`
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ CartesianFrame3D                                          │
//! │ Opaque frame tokens; equality is the only operation       │
//! └───────────────┬───────────────────────────────────────────┘
//!                 │ tags
//!                 ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ Transform3D · Twist · SpatialAcceleration · Wrench        │
//! │ Momentum · SpatialInertia · GeometricJacobian · …         │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The SE(3) exponential/logarithm (with time derivatives) used by
//! floating-joint local coordinates lives in [`se3`].

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::doc_markdown          // Not all technical terms need backticks
)]

pub mod frame;
pub mod inertia;
pub mod matrices;
pub mod motion;
pub mod se3;
pub mod transform;
pub mod wrench;

pub use frame::CartesianFrame3D;
pub use inertia::SpatialInertia;
pub use matrices::{GeometricJacobian, MomentumMatrix, WrenchMatrix};
pub use motion::{SpatialAcceleration, Twist};
pub use transform::Transform3D;
pub use wrench::{Momentum, Wrench};

/// Skew-symmetric (cross-product) matrix of a 3-vector.
#[inline]
#[must_use]
pub fn skew(v: &nalgebra::Vector3<f64>) -> nalgebra::Matrix3<f64> {
    nalgebra::Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}
