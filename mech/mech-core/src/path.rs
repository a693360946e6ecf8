//! Paths through the kinematic tree.

use crate::mechanism::{BodyId, JointId};

/// Direction in which a tree edge is traversed along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDirection {
    /// From the joint's successor toward its predecessor.
    Up,
    /// From the joint's predecessor toward its successor.
    Down,
}

/// A sequence of tree joints (with directions) from a source body to a
/// target body, through their lowest common ancestor.
///
/// Used to assemble geometric Jacobians and loop-closure constraint rows:
/// a joint's motion-subspace contribution is negated when its edge is
/// traversed [`PathDirection::Up`].
#[derive(Debug, Clone)]
pub struct TreePath {
    /// Body the path starts at.
    pub source: BodyId,
    /// Body the path ends at.
    pub target: BodyId,
    edges: Vec<(JointId, PathDirection)>,
}

impl TreePath {
    pub(crate) fn new(source: BodyId, target: BodyId, edges: Vec<(JointId, PathDirection)>) -> Self {
        Self {
            source,
            target,
            edges,
        }
    }

    /// The edges in traversal order (source to target).
    #[must_use]
    pub fn edges(&self) -> &[(JointId, PathDirection)] {
        &self.edges
    }

    /// Number of edges on the path.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
