//! Exponential coordinates on SE(3).
//!
//! Rodrigues-form `exp`/`log` between exponential coordinates `ϕ = (θ, ν)`
//! and rigid transforms `(R, p)`, plus the time derivative of `log` along a
//! trajectory, used by floating-joint local coordinates.
//!
//! Conventions: `R = exp([θ]×)`, `p = V(θ)·ν` with
//! `V(θ) = I + B[θ]× + C[θ]×²`, and the body twist `(ω, v)` satisfies
//! `Ṙ = R[ω]×`, `ṗ = R·v`. Scalar coefficients get Taylor fallbacks below
//! `t = |θ| ≈ 1e-4` so every map is smooth through the identity.

use nalgebra::{Matrix3, Vector3};

use crate::skew;

const SMALL_ANGLE: f64 = 1e-4;

/// `sin t / t`.
fn coef_a(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        let t2 = t * t;
        1.0 - t2 / 6.0 + t2 * t2 / 120.0
    } else {
        t.sin() / t
    }
}

/// `(1 - cos t) / t²`.
fn coef_b(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        let t2 = t * t;
        0.5 - t2 / 24.0 + t2 * t2 / 720.0
    } else {
        (1.0 - t.cos()) / (t * t)
    }
}

/// `(t - sin t) / t³`.
fn coef_c(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        let t2 = t * t;
        1.0 / 6.0 - t2 / 120.0 + t2 * t2 / 5040.0
    } else {
        (t - t.sin()) / (t * t * t)
    }
}

/// Coefficient of `[θ]×²` in `V⁻¹` and in the Jacobian inverses:
/// `1/t² - (1 + cos t) / (2 t sin t)`.
fn coef_e(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        let t2 = t * t;
        1.0 / 12.0 + t2 / 720.0 + t2 * t2 / 30240.0
    } else {
        1.0 / (t * t) - (1.0 + t.cos()) / (2.0 * t * t.sin())
    }
}

/// `d/dt [(1 - cos t)/t²]`.
fn coef_b_dot(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        -t / 12.0 + t * t * t / 180.0
    } else {
        t.sin() / (t * t) - 2.0 * (1.0 - t.cos()) / (t * t * t)
    }
}

/// `d/dt [(t - sin t)/t³]`.
fn coef_c_dot(t: f64) -> f64 {
    if t < SMALL_ANGLE {
        -t / 60.0 + t * t * t / 1260.0
    } else {
        (1.0 - t.cos()) / (t * t * t) - 3.0 * (t - t.sin()) / (t * t * t * t)
    }
}

/// SO(3) exponential: `R = I + A[θ]× + B[θ]ײ`.
#[must_use]
pub fn rotation_exp(theta: &Vector3<f64>) -> Matrix3<f64> {
    let t = theta.norm();
    let th = skew(theta);
    Matrix3::identity() + th * coef_a(t) + th * th * coef_b(t)
}

/// SO(3) logarithm: rotation vector of `r`.
///
/// Handles the near-π branch through the symmetric part of `r`; the sign of
/// the axis is resolved from the skew part where it is nonzero.
#[must_use]
pub fn rotation_log(r: &Matrix3<f64>) -> Vector3<f64> {
    let cos_t = ((r.trace() - 1.0) * 0.5).clamp(-1.0, 1.0);
    let t = cos_t.acos();
    // vee(R - Rᵀ) = 2 A(t) θ
    let vee = Vector3::new(
        r[(2, 1)] - r[(1, 2)],
        r[(0, 2)] - r[(2, 0)],
        r[(1, 0)] - r[(0, 1)],
    );

    if t < SMALL_ANGLE {
        return vee * 0.5;
    }

    let sin_t = t.sin();
    if sin_t.abs() > 1e-6 {
        return vee * (t / (2.0 * sin_t));
    }

    // Near π: θθᵀ = t²I + ((R + Rᵀ)/2 - I)/B(t); read off the axis from the
    // largest diagonal entry, then fix the sign with the skew part.
    let b = coef_b(t);
    let sym = (r + r.transpose()) * 0.5;
    let outer = Matrix3::identity() * (t * t) + (sym - Matrix3::identity()) / b;
    let mut k = 0;
    for i in 1..3 {
        if outer[(i, i)] > outer[(k, k)] {
            k = i;
        }
    }
    let axis_k = outer[(k, k)].max(0.0).sqrt();
    let mut theta = Vector3::zeros();
    if axis_k > 0.0 {
        theta[k] = axis_k;
        theta[(k + 1) % 3] = outer[(k, (k + 1) % 3)] / axis_k;
        theta[(k + 2) % 3] = outer[(k, (k + 2) % 3)] / axis_k;
    }
    if vee.dot(&theta) < 0.0 {
        theta = -theta;
    }
    theta
}

/// SE(3) exponential: `(R, p)` from exponential coordinates `(θ, ν)`.
#[must_use]
pub fn exp(theta: &Vector3<f64>, nu: &Vector3<f64>) -> (Matrix3<f64>, Vector3<f64>) {
    let t = theta.norm();
    let th = skew(theta);
    let rot = Matrix3::identity() + th * coef_a(t) + th * th * coef_b(t);
    let v = Matrix3::identity() + th * coef_b(t) + th * th * coef_c(t);
    (rot, v * nu)
}

/// SE(3) logarithm: exponential coordinates `(θ, ν)` of `(R, p)`.
#[must_use]
pub fn log(rot: &Matrix3<f64>, trans: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let theta = rotation_log(rot);
    let t = theta.norm();
    let th = skew(&theta);
    let v_inv = Matrix3::identity() - th * 0.5 + th * th * coef_e(t);
    (theta, v_inv * trans)
}

/// SE(3) logarithm with its time derivative along a trajectory.
///
/// Given the pose `(R, p)` and the body twist `(ω, v)` of the moving frame,
/// returns `((θ, ν), (θ̇, ν̇))` where:
///
/// - `θ̇ = Jr⁻¹(θ)·ω` (right-Jacobian inverse of SO(3)),
/// - `ν̇ = V⁻¹(θ)·(R·v − V̇·ν)` from differentiating `p = V(θ)·ν`.
#[must_use]
#[allow(clippy::similar_names)]
pub fn log_with_time_derivative(
    rot: &Matrix3<f64>,
    trans: &Vector3<f64>,
    omega: &Vector3<f64>,
    vel: &Vector3<f64>,
) -> ((Vector3<f64>, Vector3<f64>), (Vector3<f64>, Vector3<f64>)) {
    let theta = rotation_log(rot);
    let t = theta.norm();
    let th = skew(&theta);
    let e = coef_e(t);
    let v_inv = Matrix3::identity() - th * 0.5 + th * th * e;
    let nu = v_inv * trans;

    // θ̇ = ω + ½ θ×ω + E θ×(θ×ω)
    let theta_dot = omega + theta.cross(omega) * 0.5 + theta.cross(&theta.cross(omega)) * e;

    // V̇ along θ̇, with the chain-rule scalar ṫ = (θ·θ̇)/t.
    let t_dot = if t < 1e-10 { 0.0 } else { theta.dot(&theta_dot) / t };
    let thd = skew(&theta_dot);
    let v_dot = th * (coef_b_dot(t) * t_dot)
        + thd * coef_b(t)
        + th * th * (coef_c_dot(t) * t_dot)
        + (th * thd + thd * th) * coef_c(t);

    let nu_dot = v_inv * (rot * vel - v_dot * nu);
    ((theta, nu), (theta_dot, nu_dot))
}
