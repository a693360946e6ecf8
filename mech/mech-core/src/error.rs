//! Error types for dynamics computations.
//!
//! Only recoverable, data-dependent failures are errors. Frame mismatches
//! and output-buffer dimension mismatches are programming errors and panic
//! via assertions instead.

use thiserror::Error;

/// Errors surfaced by the dynamics algorithms.
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Inverse dynamics was invoked on a mechanism with loop joints; only
    /// the tree form is supported.
    #[error("inverse dynamics requires a tree mechanism ({0} loop joint(s) present)")]
    UnsupportedTopology(usize),

    /// Loop-constraint assembly encountered a joint without a usable
    /// constraint wrench subspace.
    #[error("loop joint '{joint}' cannot be used as a closure constraint")]
    UnsupportedJoint {
        /// Name of the offending joint.
        joint: String,
    },

    /// A factorization failed: the matrix is not positive definite.
    #[error("{what} is not positive definite")]
    Singular {
        /// Which matrix failed to factor.
        what: &'static str,
    },

    /// Center of mass requested for a subset with zero total mass.
    #[error("zero total mass in center-of-mass computation")]
    ZeroMass,
}

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_failure() {
        assert!(DynamicsError::UnsupportedTopology(2)
            .to_string()
            .contains("2 loop joint"));
        assert!(DynamicsError::Singular {
            what: "mass matrix"
        }
        .to_string()
        .contains("mass matrix"));
        let err = DynamicsError::UnsupportedJoint {
            joint: "four_bar_closure".into(),
        };
        assert!(err.to_string().contains("four_bar_closure"));
    }
}
