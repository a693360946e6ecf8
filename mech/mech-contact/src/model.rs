//! Contact force models.

use nalgebra::{Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capability set through which the dynamics core drives a contact model.
///
/// Each registered contact point owns `num_states()` continuous states per
/// environment primitive. While the point is outside the primitive the core
/// calls `reset` and `zero_derivative`; while penetrating it calls
/// [`ContactModel::compute`], which produces a world-frame force and fills
/// the state derivative for the caller's integrator.
pub trait ContactModel {
    /// Number of continuous states per (contact point, primitive) pair.
    fn num_states(&self) -> usize;

    /// Reset the contact state to its out-of-contact value.
    fn reset(&self, state: &mut [f64]);

    /// Zero the state derivative.
    fn zero_derivative(&self, deriv: &mut [f64]);

    /// Evaluate the contact force.
    ///
    /// - `penetration`: depth (> 0) of the point inside the primitive,
    /// - `velocity`: world-frame velocity of the contact point,
    /// - `normal`: outward unit normal of the primitive,
    /// - `state` / `state_deriv`: the model's slices, length `num_states()`.
    ///
    /// Returns the world-frame force applied to the body at the point.
    fn compute(
        &self,
        penetration: f64,
        velocity: &Vector3<f64>,
        normal: &Unit<Vector3<f64>>,
        state: &[f64],
        state_deriv: &mut [f64],
    ) -> Vector3<f64>;
}

/// Hunt–Crossley compliant normal force: `fₙ = k·zⁿ·(1 + λ·ż)`.
///
/// `z` is penetration depth, `ż` the penetration rate (positive while
/// approaching). The force is clamped non-negative so the model never pulls.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HuntCrossleyModel {
    /// Stiffness `k` (N/mⁿ).
    pub k: f64,
    /// Dissipation coefficient `λ` (s/m).
    pub lambda: f64,
    /// Penetration exponent `n`.
    pub exponent: f64,
}

impl HuntCrossleyModel {
    /// Hertzian variant: exponent 3/2 and `λ = 3/2·α·k` for dissipation
    /// parameter `α`.
    #[must_use]
    pub fn hertz(k: f64, alpha: f64) -> Self {
        Self {
            k,
            lambda: 1.5 * alpha,
            exponent: 1.5,
        }
    }

    /// Normal force magnitude for penetration `z` and penetration rate `zdot`.
    #[must_use]
    pub fn force(&self, z: f64, zdot: f64) -> f64 {
        if z <= 0.0 {
            return 0.0;
        }
        (self.k * z.powf(self.exponent) * (1.0 + self.lambda * zdot)).max(0.0)
    }
}

/// Viscoelastic Coulomb friction (bristle model).
///
/// The tangential state `x` is a 3-vector bristle displacement. The
/// candidate force `-k·x - b·v_t` is clamped to the friction cone
/// `|f| ≤ μ·fₙ`; the state derivative `ẋ = -(k·x + f)/b` reduces to
/// `ẋ = v_t` while sticking and lets the bristle relax while sliding.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViscoelasticCoulombModel {
    /// Friction coefficient μ.
    pub mu: f64,
    /// Bristle stiffness `k` (N/m).
    pub k: f64,
    /// Bristle damping `b` (N·s/m).
    pub b: f64,
}

impl ViscoelasticCoulombModel {
    /// Create a friction model from coefficient, stiffness, and damping.
    #[must_use]
    pub fn new(mu: f64, k: f64, b: f64) -> Self {
        Self { mu, k, b }
    }

    /// Tangential force and bristle state derivative.
    fn force(
        &self,
        normal_force: f64,
        tangential_velocity: &Vector3<f64>,
        state: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let candidate = -(state * self.k + tangential_velocity * self.b);
        let bound = self.mu * normal_force;
        let force = if candidate.norm() > bound {
            candidate * (bound / candidate.norm())
        } else {
            candidate
        };
        let state_deriv = -(state * self.k + force) / self.b;
        (force, state_deriv)
    }
}

/// Combined compliant contact model: Hunt–Crossley normal force plus
/// viscoelastic Coulomb friction.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoftContactModel {
    /// Normal-force model.
    pub normal: HuntCrossleyModel,
    /// Friction model.
    pub friction: ViscoelasticCoulombModel,
}

impl SoftContactModel {
    /// Create a combined model.
    #[must_use]
    pub fn new(normal: HuntCrossleyModel, friction: ViscoelasticCoulombModel) -> Self {
        Self { normal, friction }
    }

    /// Stiff rubber-like defaults, usable for test scenes.
    #[must_use]
    pub fn default_params() -> Self {
        Self {
            normal: HuntCrossleyModel::hertz(50e3, 0.2),
            friction: ViscoelasticCoulombModel::new(0.8, 20e3, 100.0),
        }
    }
}

impl ContactModel for SoftContactModel {
    fn num_states(&self) -> usize {
        3
    }

    fn reset(&self, state: &mut [f64]) {
        state.fill(0.0);
    }

    fn zero_derivative(&self, deriv: &mut [f64]) {
        deriv.fill(0.0);
    }

    fn compute(
        &self,
        penetration: f64,
        velocity: &Vector3<f64>,
        normal: &Unit<Vector3<f64>>,
        state: &[f64],
        state_deriv: &mut [f64],
    ) -> Vector3<f64> {
        debug_assert_eq!(state.len(), 3);
        debug_assert_eq!(state_deriv.len(), 3);

        let normal_velocity = velocity.dot(normal);
        let zdot = -normal_velocity; // approaching => penetration grows
        let fn_mag = self.normal.force(penetration, zdot);

        let tangential_velocity = velocity - normal.into_inner() * normal_velocity;
        let x = Vector3::new(state[0], state[1], state[2]);
        let (ft, xdot) = self.friction.force(fn_mag, &tangential_velocity, &x);

        state_deriv[0] = xdot.x;
        state_deriv[1] = xdot.y;
        state_deriv[2] = xdot.z;

        normal.into_inner() * fn_mag + ft
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_force_repels_and_never_pulls() {
        let m = HuntCrossleyModel::hertz(1000.0, 0.2);
        assert!(m.force(0.01, 0.0) > 0.0);
        assert!(m.force(0.01, 0.5) > m.force(0.01, 0.0)); // approaching stiffens
        assert_relative_eq!(m.force(0.01, -1e3), 0.0); // separating fast: clamped
        assert_relative_eq!(m.force(-0.01, 0.0), 0.0); // no penetration, no force
    }

    #[test]
    fn sticking_state_derivative_tracks_velocity() {
        let model = SoftContactModel::default_params();
        let state = [0.0, 0.0, 0.0];
        let mut deriv = [0.0; 3];
        // Deep contact, slow tangential creep: inside the cone.
        let v = Vector3::new(1e-5, 0.0, 0.0);
        let f = model.compute(0.01, &v, &Vector3::z_axis(), &state, &mut deriv);
        assert!(f.z > 0.0);
        assert_relative_eq!(deriv[0], v.x, epsilon = 1e-12);
        assert_relative_eq!(deriv[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn sliding_force_sits_on_the_cone() {
        let model = SoftContactModel::default_params();
        let state = [0.0, 0.0, 0.0];
        let mut deriv = [0.0; 3];
        let v = Vector3::new(2.0, 0.0, 0.0); // fast slide
        let f = model.compute(0.005, &v, &Vector3::z_axis(), &state, &mut deriv);
        let fn_mag = f.z;
        let ft = Vector3::new(f.x, f.y, 0.0);
        assert!(ft.x < 0.0, "friction opposes sliding");
        assert_relative_eq!(ft.norm(), model.friction.mu * fn_mag, epsilon = 1e-9);
    }

    #[test]
    fn reset_and_zero_derivative() {
        let model = SoftContactModel::default_params();
        let mut state = [0.3, -0.1, 0.2];
        let mut deriv = [1.0, 1.0, 1.0];
        model.reset(&mut state);
        model.zero_derivative(&mut deriv);
        assert_eq!(state, [0.0; 3]);
        assert_eq!(deriv, [0.0; 3]);
    }
}
