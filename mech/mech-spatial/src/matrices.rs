//! Column-stacked spatial matrices: geometric Jacobians, momentum
//! matrices, and wrench (constraint) matrices.
//!
//! Each type stores a 3×n angular block and a 3×n linear block sharing
//! frame tags, the column-major analog of the `jacp`/`jacr` pair used by
//! chain-walk Jacobian assembly.

use nalgebra::{Matrix3xX, Vector3};

use crate::frame::{check_frame, CartesianFrame3D};
use crate::motion::Twist;
use crate::transform::Transform3D;
use crate::wrench::{Momentum, Wrench};

/// Maps a velocity vector to the twist of `body` with respect to `base`,
/// expressed in `frame`. Columns are motion vectors.
#[derive(Debug, Clone)]
pub struct GeometricJacobian {
    /// Frame attached to the moving body.
    pub body: CartesianFrame3D,
    /// Frame the motion is measured against.
    pub base: CartesianFrame3D,
    /// Frame the columns are expressed in.
    pub frame: CartesianFrame3D,
    /// 3×n angular block.
    pub angular: Matrix3xX<f64>,
    /// 3×n linear block.
    pub linear: Matrix3xX<f64>,
}

impl GeometricJacobian {
    /// Zero Jacobian with `cols` columns.
    #[must_use]
    pub fn zeros(
        body: CartesianFrame3D,
        base: CartesianFrame3D,
        frame: CartesianFrame3D,
        cols: usize,
    ) -> Self {
        Self {
            body,
            base,
            frame,
            angular: Matrix3xX::zeros(cols),
            linear: Matrix3xX::zeros(cols),
        }
    }

    /// Number of columns (velocity dimension).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.angular.ncols()
    }

    /// Angular/linear parts of column `i`.
    #[inline]
    #[must_use]
    pub fn col(&self, i: usize) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.angular.column(i).into_owned(),
            self.linear.column(i).into_owned(),
        )
    }

    /// Overwrite column `i`.
    #[inline]
    pub fn set_col(&mut self, i: usize, angular: &Vector3<f64>, linear: &Vector3<f64>) {
        self.angular.set_column(i, angular);
        self.linear.set_column(i, linear);
    }

    /// Zero every column.
    pub fn fill_zero(&mut self) {
        self.angular.fill(0.0);
        self.linear.fill(0.0);
    }

    /// Re-express every column in the destination frame of `t`, in place.
    pub fn transform_in_place(&mut self, t: &Transform3D) {
        check_frame(t.from, self.frame);
        for i in 0..self.cols() {
            let ang = t.rot * self.angular.column(i);
            let lin = t.rot * self.linear.column(i) + t.trans.cross(&ang);
            self.angular.set_column(i, &ang);
            self.linear.set_column(i, &lin);
        }
        self.frame = t.to;
    }

    /// Multiply by a velocity vector: the resulting twist of `body` w.r.t.
    /// `base` expressed in `frame`.
    #[must_use]
    pub fn twist(&self, v: &[f64]) -> Twist {
        assert_eq!(
            v.len(),
            self.cols(),
            "velocity vector length {} does not match jacobian columns {}",
            v.len(),
            self.cols()
        );
        let mut angular = Vector3::zeros();
        let mut linear = Vector3::zeros();
        for (i, vi) in v.iter().enumerate() {
            angular += self.angular.column(i) * *vi;
            linear += self.linear.column(i) * *vi;
        }
        Twist::new(self.body, self.base, self.frame, angular, linear)
    }

    /// Project a wrench onto the column space: `τ = Jᵀ·w`, written into
    /// `out` (length = number of columns).
    pub fn transpose_mul_wrench(&self, w: &Wrench, out: &mut [f64]) {
        check_frame(self.frame, w.frame);
        assert_eq!(out.len(), self.cols(), "output length mismatch");
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.angular.column(i).dot(&w.angular) + self.linear.column(i).dot(&w.linear);
        }
    }
}

/// Maps a velocity vector to spatial momentum expressed in `frame`.
/// Columns are force-space vectors.
#[derive(Debug, Clone)]
pub struct MomentumMatrix {
    /// Frame the columns are expressed in.
    pub frame: CartesianFrame3D,
    /// 3×n angular block.
    pub angular: Matrix3xX<f64>,
    /// 3×n linear block.
    pub linear: Matrix3xX<f64>,
}

impl MomentumMatrix {
    /// Zero momentum matrix with `cols` columns.
    #[must_use]
    pub fn zeros(frame: CartesianFrame3D, cols: usize) -> Self {
        Self {
            frame,
            angular: Matrix3xX::zeros(cols),
            linear: Matrix3xX::zeros(cols),
        }
    }

    /// Number of columns (velocity dimension).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.angular.ncols()
    }

    /// Angular/linear parts of column `i`.
    #[inline]
    #[must_use]
    pub fn col(&self, i: usize) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.angular.column(i).into_owned(),
            self.linear.column(i).into_owned(),
        )
    }

    /// Overwrite column `i`.
    #[inline]
    pub fn set_col(&mut self, i: usize, angular: &Vector3<f64>, linear: &Vector3<f64>) {
        self.angular.set_column(i, angular);
        self.linear.set_column(i, linear);
    }

    /// Zero every column.
    pub fn fill_zero(&mut self) {
        self.angular.fill(0.0);
        self.linear.fill(0.0);
    }

    /// Multiply by a velocity vector.
    #[must_use]
    pub fn momentum(&self, v: &[f64]) -> Momentum {
        assert_eq!(
            v.len(),
            self.cols(),
            "velocity vector length {} does not match momentum matrix columns {}",
            v.len(),
            self.cols()
        );
        let mut angular = Vector3::zeros();
        let mut linear = Vector3::zeros();
        for (i, vi) in v.iter().enumerate() {
            angular += self.angular.column(i) * *vi;
            linear += self.linear.column(i) * *vi;
        }
        Momentum::new(self.frame, angular, linear)
    }
}

/// A set of wrench basis columns expressed in `frame` (e.g. the constraint
/// wrench subspace of a joint). Columns transform coadjointly.
#[derive(Debug, Clone)]
pub struct WrenchMatrix {
    /// Frame the columns are expressed in.
    pub frame: CartesianFrame3D,
    /// 3×n angular block.
    pub angular: Matrix3xX<f64>,
    /// 3×n linear block.
    pub linear: Matrix3xX<f64>,
}

impl WrenchMatrix {
    /// Zero wrench matrix with `cols` columns.
    #[must_use]
    pub fn zeros(frame: CartesianFrame3D, cols: usize) -> Self {
        Self {
            frame,
            angular: Matrix3xX::zeros(cols),
            linear: Matrix3xX::zeros(cols),
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.angular.ncols()
    }

    /// Angular/linear parts of column `i`.
    #[inline]
    #[must_use]
    pub fn col(&self, i: usize) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.angular.column(i).into_owned(),
            self.linear.column(i).into_owned(),
        )
    }

    /// Overwrite column `i`.
    #[inline]
    pub fn set_col(&mut self, i: usize, angular: &Vector3<f64>, linear: &Vector3<f64>) {
        self.angular.set_column(i, angular);
        self.linear.set_column(i, linear);
    }

    /// Re-express every column in the destination frame of `t`, in place
    /// (coadjoint per column).
    pub fn transform_in_place(&mut self, t: &Transform3D) {
        check_frame(t.from, self.frame);
        for i in 0..self.cols() {
            let lin = t.rot * self.linear.column(i);
            let ang = t.rot * self.angular.column(i) + t.trans.cross(&lin);
            self.angular.set_column(i, &ang);
            self.linear.set_column(i, &lin);
        }
        self.frame = t.to;
    }
}
