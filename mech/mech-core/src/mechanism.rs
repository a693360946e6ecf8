//! The mechanism graph: a kinematic tree plus optional loop joints.
//!
//! Bodies and their parent joints live in flat, topologically sorted
//! vectors (root first, parent before child); ids are topological
//! positions. Loop joints are non-owning index pairs. A [`Mechanism`] is
//! immutable once states are created from it and may be shared by any
//! number of [`MechanismState`](crate::MechanismState)s.

use std::ops::Range;

use nalgebra::Vector3;
use tracing::{debug, warn};

use mech_contact::{ContactModel, HalfSpace3D};
use mech_spatial::{CartesianFrame3D, Transform3D};

use crate::body::RigidBody;
use crate::joint::{Joint, JointKind};
use crate::path::{PathDirection, TreePath};

/// Standard gravity in the usual z-up convention: `(0, 0, -9.81)` m/s².
#[must_use]
pub fn default_gravity() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, -9.81)
}

/// Index of a body: its position in the mechanism's topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) usize);

impl BodyId {
    /// Create a body id from a topological index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The topological index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a tree joint. Joint `i` connects body `i + 1` to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(pub(crate) usize);

impl JointId {
    /// Create a joint id from its index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The joint index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A non-tree joint closing a kinematic loop between two bodies already in
/// the tree. Enforced through Lagrange multipliers.
#[derive(Debug, Clone)]
pub struct LoopJoint {
    /// Body carrying `frame_before`.
    pub predecessor: BodyId,
    /// Body carrying `frame_after`.
    pub successor: BodyId,
    /// The constraint joint.
    pub joint: Joint,
}

/// A tree of rigid bodies connected by joints, plus loop joints, gravity,
/// and environment half-spaces for contact.
#[derive(Debug, Clone)]
pub struct Mechanism {
    bodies: Vec<RigidBody>,
    /// `tree_joints[i]` is the parent joint of `bodies[i + 1]`.
    tree_joints: Vec<Joint>,
    /// `parent[k]` is the topological index of body `k`'s parent
    /// (`parent[0] == 0`).
    parent: Vec<usize>,
    loop_joints: Vec<LoopJoint>,
    /// Gravity in the root frame.
    gravity: Vector3<f64>,
    environment: Vec<HalfSpace3D>,

    // Index maps, recomputed on every topology change.
    q_ranges: Vec<Range<usize>>,
    v_ranges: Vec<Range<usize>>,
    nq: usize,
    nv: usize,
    loop_row_ranges: Vec<Range<usize>>,
    num_constraints: usize,
}

impl Mechanism {
    /// Create a mechanism containing only `root_body`.
    ///
    /// Gravity is expressed in the root body's default frame; pass
    /// `(0, 0, -9.81)` for the usual convention.
    #[must_use]
    pub fn new(root_body: RigidBody, gravity: Vector3<f64>) -> Self {
        Self {
            bodies: vec![root_body],
            tree_joints: Vec::new(),
            parent: vec![0],
            loop_joints: Vec::new(),
            gravity,
            environment: Vec::new(),
            q_ranges: Vec::new(),
            v_ranges: Vec::new(),
            nq: 0,
            nv: 0,
            loop_row_ranges: Vec::new(),
            num_constraints: 0,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The root body id.
    #[must_use]
    pub fn root(&self) -> BodyId {
        BodyId(0)
    }

    /// The root body's default frame (the world frame of this mechanism).
    #[must_use]
    pub fn root_frame(&self) -> CartesianFrame3D {
        self.bodies[0].default_frame()
    }

    /// Number of bodies, root included.
    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Number of tree joints.
    #[must_use]
    pub fn num_tree_joints(&self) -> usize {
        self.tree_joints.len()
    }

    /// Total configuration dimension.
    #[must_use]
    pub fn num_positions(&self) -> usize {
        self.nq
    }

    /// Total velocity dimension.
    #[must_use]
    pub fn num_velocities(&self) -> usize {
        self.nv
    }

    /// Total number of loop-constraint rows.
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Gravity vector in the root frame.
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// The body with the given id.
    #[must_use]
    pub fn body(&self, id: BodyId) -> &RigidBody {
        &self.bodies[id.0]
    }

    /// All bodies in topological order.
    #[must_use]
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// The tree joint with the given id.
    #[must_use]
    pub fn joint(&self, id: JointId) -> &Joint {
        &self.tree_joints[id.0]
    }

    /// All tree joints, ordered like their successors.
    #[must_use]
    pub fn tree_joints(&self) -> &[Joint] {
        &self.tree_joints
    }

    /// Registered loop joints.
    #[must_use]
    pub fn loop_joints(&self) -> &[LoopJoint] {
        &self.loop_joints
    }

    /// Environment half-spaces.
    #[must_use]
    pub fn environment(&self) -> &[HalfSpace3D] {
        &self.environment
    }

    /// Parent of a non-root body.
    #[must_use]
    pub fn parent_body(&self, id: BodyId) -> Option<BodyId> {
        (id.0 != 0).then(|| BodyId(self.parent[id.0]))
    }

    /// The joint whose successor is `id`, if `id` is not the root.
    #[must_use]
    pub fn parent_joint(&self, id: BodyId) -> Option<JointId> {
        (id.0 != 0).then(|| JointId(id.0 - 1))
    }

    /// Successor body of a tree joint.
    #[must_use]
    pub fn successor(&self, id: JointId) -> BodyId {
        BodyId(id.0 + 1)
    }

    /// Predecessor body of a tree joint.
    #[must_use]
    pub fn predecessor(&self, id: JointId) -> BodyId {
        BodyId(self.parent[id.0 + 1])
    }

    /// Configuration range of a tree joint in the flat `q` vector.
    #[must_use]
    pub fn q_range(&self, id: JointId) -> Range<usize> {
        self.q_ranges[id.0].clone()
    }

    /// Velocity range of a tree joint in the flat `v` vector.
    #[must_use]
    pub fn v_range(&self, id: JointId) -> Range<usize> {
        self.v_ranges[id.0].clone()
    }

    /// Constraint row range of a loop joint in `K` and `k`.
    #[must_use]
    pub fn loop_row_range(&self, loop_index: usize) -> Range<usize> {
        self.loop_row_ranges[loop_index].clone()
    }

    /// Find a body by name.
    #[must_use]
    pub fn find_body(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .position(|b| b.name() == name)
            .map(BodyId)
    }

    /// Find a tree joint by name.
    #[must_use]
    pub fn find_joint(&self, name: &str) -> Option<JointId> {
        self.tree_joints
            .iter()
            .position(|j| j.name() == name)
            .map(JointId)
    }

    /// Total number of contact states across all (point, half-space) pairs.
    #[must_use]
    pub fn num_contact_states(&self) -> usize {
        let per_point: usize = self
            .bodies
            .iter()
            .flat_map(|b| b.contact_points())
            .map(|p| p.model.num_states())
            .sum();
        per_point * self.environment.len()
    }

    /// Number of velocities spanned by a path.
    #[must_use]
    pub fn path_num_velocities(&self, path: &TreePath) -> usize {
        path.edges()
            .iter()
            .map(|(j, _)| self.tree_joints[j.0].num_velocities())
            .sum()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Attach `body` to `parent` through `joint`.
    ///
    /// `joint_to_parent` locates `joint.frame_before` relative to a frame
    /// already fixed to the parent body. If `body_to_joint` is given, it
    /// maps the body's current default frame to `joint.frame_after`, which
    /// then becomes the body's default frame; otherwise the body's default
    /// frame must already be `joint.frame_after`.
    ///
    /// # Panics
    ///
    /// Panics on frame-tag inconsistencies (programming errors).
    pub fn attach(
        &mut self,
        parent: BodyId,
        joint: Joint,
        joint_to_parent: Transform3D,
        mut body: RigidBody,
        body_to_joint: Option<Transform3D>,
    ) -> BodyId {
        assert!(parent.0 < self.bodies.len(), "parent body out of range");
        assert_eq!(
            joint_to_parent.from,
            joint.frame_before(),
            "joint_to_parent must start at the joint's frame_before"
        );

        match body_to_joint {
            Some(b2j) => {
                assert_eq!(
                    b2j.to,
                    joint.frame_after(),
                    "body_to_joint must end at the joint's frame_after"
                );
                body.rebase(b2j);
            }
            None => assert_eq!(
                body.default_frame(),
                joint.frame_after(),
                "successor's default frame must be the joint's frame_after"
            ),
        }

        self.bodies[parent.0].add_frame_definition(joint_to_parent);
        debug!(
            joint = joint.name(),
            parent = self.bodies[parent.0].name(),
            child = body.name(),
            "attaching body"
        );

        self.tree_joints.push(joint);
        self.bodies.push(body);
        self.parent.push(parent.0);
        self.recompute_index_maps();
        BodyId(self.bodies.len() - 1)
    }

    /// Register a loop joint between two existing bodies.
    ///
    /// `before_to_predecessor` and `after_to_successor` locate the joint
    /// frames on the respective bodies.
    pub fn add_loop_joint(
        &mut self,
        predecessor: BodyId,
        successor: BodyId,
        joint: Joint,
        before_to_predecessor: Transform3D,
        after_to_successor: Transform3D,
    ) {
        assert!(predecessor.0 < self.bodies.len(), "predecessor out of range");
        assert!(successor.0 < self.bodies.len(), "successor out of range");
        assert_eq!(
            before_to_predecessor.from,
            joint.frame_before(),
            "before_to_predecessor must start at the joint's frame_before"
        );
        assert_eq!(
            after_to_successor.from,
            joint.frame_after(),
            "after_to_successor must start at the joint's frame_after"
        );
        self.bodies[predecessor.0].add_frame_definition(before_to_predecessor);
        self.bodies[successor.0].add_frame_definition(after_to_successor);
        self.loop_joints.push(LoopJoint {
            predecessor,
            successor,
            joint,
        });
        self.recompute_index_maps();
    }

    /// Register an environment half-space for contact.
    pub fn add_environment_halfspace(&mut self, halfspace: HalfSpace3D) {
        self.environment.push(halfspace);
    }

    /// Attach another mechanism's tree under `parent`, its root becoming
    /// the successor of `joint`.
    ///
    /// Returns the new ids of the submechanism's bodies, indexed by their
    /// old topological position. The submechanism's gravity and
    /// environment are ignored (a differing gravity vector is logged).
    pub fn attach_submechanism(
        &mut self,
        parent: BodyId,
        joint: Joint,
        joint_to_parent: Transform3D,
        sub: &Mechanism,
        root_to_joint: Option<Transform3D>,
    ) -> Vec<BodyId> {
        if (sub.gravity - self.gravity).norm() > 0.0 {
            warn!(
                "submechanism gravity {:?} differs from {:?}; using the host's",
                sub.gravity, self.gravity
            );
        }
        let mut map = Vec::with_capacity(sub.bodies.len());
        let sub_root = self.attach(
            parent,
            joint,
            joint_to_parent,
            sub.bodies[0].clone(),
            root_to_joint,
        );
        map.push(sub_root);
        for k in 1..sub.bodies.len() {
            self.tree_joints.push(sub.tree_joints[k - 1].clone());
            self.bodies.push(sub.bodies[k].clone());
            self.parent.push(map[sub.parent[k]].0);
            map.push(BodyId(self.bodies.len() - 1));
        }
        for lj in &sub.loop_joints {
            self.loop_joints.push(LoopJoint {
                predecessor: map[lj.predecessor.0],
                successor: map[lj.successor.0],
                joint: lj.joint.clone(),
            });
        }
        self.recompute_index_maps();
        map
    }

    /// Extract the subtree rooted at `new_root` as its own mechanism.
    ///
    /// Returns the mechanism and the mapping from old body ids to new ones
    /// (`None` for bodies outside the subtree). Loop joints with both ends
    /// inside the subtree are retained.
    #[must_use]
    pub fn submechanism(&self, new_root: BodyId) -> (Mechanism, Vec<Option<BodyId>>) {
        let n = self.bodies.len();
        let mut inside = vec![false; n];
        inside[new_root.0] = true;
        for k in (new_root.0 + 1)..n {
            inside[k] = inside[self.parent[k]];
        }

        let mut out = Mechanism::new(self.bodies[new_root.0].clone(), self.gravity);
        out.environment = self.environment.clone();
        let mut map: Vec<Option<BodyId>> = vec![None; n];
        map[new_root.0] = Some(BodyId(0));
        for k in (new_root.0 + 1)..n {
            if !inside[k] {
                continue;
            }
            out.tree_joints.push(self.tree_joints[k - 1].clone());
            out.bodies.push(self.bodies[k].clone());
            let mapped_parent = map[self.parent[k]].map_or(0, |b| b.0);
            out.parent.push(mapped_parent);
            map[k] = Some(BodyId(out.bodies.len() - 1));
        }
        for lj in &self.loop_joints {
            if let (Some(p), Some(s)) = (map[lj.predecessor.0], map[lj.successor.0]) {
                out.loop_joints.push(LoopJoint {
                    predecessor: p,
                    successor: s,
                    joint: lj.joint.clone(),
                });
            }
        }
        out.recompute_index_maps();
        (out, map)
    }

    /// Re-root the subtree currently hanging at `old_subroot` so that
    /// `new_subroot` (a body inside that subtree) becomes its root, and
    /// attach it to `new_parent` (a body outside the subtree) through
    /// `joint`.
    ///
    /// Edges on the chain from `new_subroot` up to `old_subroot` are
    /// reversed with [`Joint::flip_direction`]; every other edge is kept.
    /// Returns the rebuilt mechanism and the old-to-new body id mapping.
    #[must_use]
    pub fn reattach(
        &self,
        old_subroot: BodyId,
        new_parent: BodyId,
        joint: Joint,
        joint_to_parent: Transform3D,
        new_subroot: BodyId,
        new_subroot_to_joint: Option<Transform3D>,
    ) -> (Mechanism, Vec<Option<BodyId>>) {
        let n = self.bodies.len();
        assert!(old_subroot.0 != 0, "cannot reattach the root body");
        let mut inside = vec![false; n];
        inside[old_subroot.0] = true;
        for k in (old_subroot.0 + 1)..n {
            inside[k] = inside[self.parent[k]];
        }
        assert!(inside[new_subroot.0], "new_subroot must lie in the subtree");
        assert!(
            !inside[new_parent.0],
            "new_parent must lie outside the subtree"
        );

        debug!(
            old_subroot = self.bodies[old_subroot.0].name(),
            new_subroot = self.bodies[new_subroot.0].name(),
            "re-rooting subtree"
        );

        // Keep everything outside the subtree, in the original order.
        let mut map: Vec<Option<BodyId>> = vec![None; n];
        let mut out = Mechanism::new(self.bodies[0].clone(), self.gravity);
        out.environment = self.environment.clone();
        map[0] = Some(BodyId(0));
        for k in 1..n {
            if inside[k] {
                continue;
            }
            out.tree_joints.push(self.tree_joints[k - 1].clone());
            out.bodies.push(self.bodies[k].clone());
            let mapped_parent = map[self.parent[k]]
                .unwrap_or_else(|| panic!("parent of body {k} not mapped"));
            out.parent.push(mapped_parent.0);
            map[k] = Some(BodyId(out.bodies.len() - 1));
        }
        out.recompute_index_maps();

        // Attach the new subtree root.
        let mapped_parent = map[new_parent.0].unwrap_or_else(|| unreachable!());
        let new_root_id = out.attach(
            mapped_parent,
            joint,
            joint_to_parent,
            self.bodies[new_subroot.0].clone(),
            new_subroot_to_joint,
        );
        map[new_subroot.0] = Some(new_root_id);

        // Walk the subtree from `new_subroot`, flipping edges on the chain
        // toward `old_subroot` and keeping all others.
        let mut stack = vec![new_subroot.0];
        let mut visited = vec![false; n];
        visited[new_subroot.0] = true;
        while let Some(current) = stack.pop() {
            let current_new = map[current].unwrap_or_else(|| unreachable!());

            // Original children inside the subtree.
            for k in (old_subroot.0 + 1)..n {
                if inside[k] && self.parent[k] == current && !visited[k] {
                    visited[k] = true;
                    out.tree_joints.push(self.tree_joints[k - 1].clone());
                    out.bodies.push(self.bodies[k].clone());
                    out.parent.push(current_new.0);
                    map[k] = Some(BodyId(out.bodies.len() - 1));
                    stack.push(k);
                }
            }

            // Original parent, traversed against the old edge direction.
            if current != old_subroot.0 {
                let p = self.parent[current];
                if inside[p] && !visited[p] {
                    visited[p] = true;
                    let old_joint = &self.tree_joints[current - 1];
                    let flipped = old_joint.flip_direction();
                    let mut parent_body = self.bodies[p].clone();
                    // The flipped joint's frame_after (the old frame_before)
                    // becomes the new successor's default frame.
                    let to_new_default =
                        parent_body.frame_definition(flipped.frame_after()).inv();
                    parent_body.rebase(to_new_default);
                    out.tree_joints.push(flipped);
                    out.bodies.push(parent_body);
                    out.parent.push(current_new.0);
                    map[p] = Some(BodyId(out.bodies.len() - 1));
                    stack.push(p);
                }
            }
        }

        for lj in &self.loop_joints {
            let p = map[lj.predecessor.0].unwrap_or_else(|| unreachable!());
            let s = map[lj.successor.0].unwrap_or_else(|| unreachable!());
            out.loop_joints.push(LoopJoint {
                predecessor: p,
                successor: s,
                joint: lj.joint.clone(),
            });
        }
        out.recompute_index_maps();
        (out, map)
    }

    /// Merge away every fixed tree joint, transferring inertia, frames,
    /// and contact points onto the surviving bodies.
    ///
    /// Returns the compacted mechanism and the old-to-new body mapping
    /// (merged bodies map onto their merge target).
    #[must_use]
    pub fn remove_fixed_joints(&self) -> (Mechanism, Vec<BodyId>) {
        let n = self.bodies.len();
        let mut working: Vec<RigidBody> = self.bodies.to_vec();
        // target[k]: surviving body index that body k merges into.
        let mut target: Vec<usize> = (0..n).collect();

        for k in 1..n {
            let joint = &self.tree_joints[k - 1];
            if !matches!(joint.kind(), JointKind::Fixed) {
                continue;
            }
            let dst = target[self.parent[k]];
            // Transform from body k's default frame to dst's default frame:
            // fixed joints pin frame_after to frame_before.
            let before_def = working[dst].frame_definition(joint.frame_before());
            let body_to_dst = before_def * joint.joint_transform(&[]);
            let merged = working[k].clone();
            working[dst].merge_in(&merged, body_to_dst);
            if dst == 0 && self.bodies[0].inertia().is_none() {
                if merged.inertia().is_some() {
                    warn!(
                        body = merged.name(),
                        "dropping inertia merged into the massless root"
                    );
                }
                working[0].clear_inertia();
            }
            target[k] = dst;
        }

        let mut out = Mechanism::new(working[0].clone(), self.gravity);
        out.environment = self.environment.clone();
        let mut map: Vec<BodyId> = vec![BodyId(0); n];
        for k in 1..n {
            if target[k] != k {
                continue; // merged away
            }
            out.tree_joints.push(self.tree_joints[k - 1].clone());
            out.bodies.push(working[k].clone());
            out.parent.push(map[target[self.parent[k]]].0);
            map[k] = BodyId(out.bodies.len() - 1);
        }
        // Merged bodies map to their target's new id.
        for k in 1..n {
            if target[k] != k {
                map[k] = map[target[k]];
            }
        }
        for lj in &self.loop_joints {
            out.loop_joints.push(LoopJoint {
                predecessor: map[lj.predecessor.0],
                successor: map[lj.successor.0],
                joint: lj.joint.clone(),
            });
        }
        out.recompute_index_maps();
        (out, map)
    }

    /// Path from `from` to `to` through their lowest common ancestor.
    #[must_use]
    pub fn path(&self, from: BodyId, to: BodyId) -> TreePath {
        let mut a = from.0;
        let mut b = to.0;
        let mut up = Vec::new();
        let mut down = Vec::new();
        while a != b {
            // Advance whichever side is deeper in the topological order.
            if a > b {
                up.push((JointId(a - 1), PathDirection::Up));
                a = self.parent[a];
            } else {
                down.push((JointId(b - 1), PathDirection::Down));
                b = self.parent[b];
            }
        }
        down.reverse();
        up.extend(down);
        TreePath::new(from, to, up)
    }

    fn recompute_index_maps(&mut self) {
        self.q_ranges.clear();
        self.v_ranges.clear();
        self.nq = 0;
        self.nv = 0;
        for joint in &self.tree_joints {
            let nq = joint.num_positions();
            let nv = joint.num_velocities();
            self.q_ranges.push(self.nq..self.nq + nq);
            self.v_ranges.push(self.nv..self.nv + nv);
            self.nq += nq;
            self.nv += nv;
        }
        self.loop_row_ranges.clear();
        self.num_constraints = 0;
        for lj in &self.loop_joints {
            let rows = 6 - lj.joint.num_velocities();
            self.loop_row_ranges
                .push(self.num_constraints..self.num_constraints + rows);
            self.num_constraints += rows;
        }
    }
}

impl RigidBody {
    /// Merge `other` into `self`; `other_to_self` maps `other`'s default
    /// frame to `self`'s default frame. Used by fixed-joint removal.
    pub(crate) fn merge_in(&mut self, other: &RigidBody, other_to_self: Transform3D) {
        if let Some(other_inertia) = other.inertia() {
            let transformed = other_inertia.transform(&other_to_self);
            self.set_inertia_sum(transformed);
        }
        for def in other.frame_definitions() {
            if !self.is_fixed_to_body(def.from) {
                self.push_raw_frame_definition(other_to_self * *def);
            }
        }
        for point in other.contact_points() {
            let mut moved = *point;
            moved.location = other_to_self.transform_point(&moved.location);
            self.add_contact_point(moved);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::joint::JointKind;
    use approx::assert_relative_eq;
    use mech_spatial::SpatialInertia;

    fn unit_inertia(frame: CartesianFrame3D) -> SpatialInertia {
        SpatialInertia::point_mass(frame, 1.0, &Vector3::new(0.5, 0.0, 0.0))
    }

    /// root -- revolute -- a -- prismatic -- b.
    fn chain() -> Mechanism {
        let mut mech = Mechanism::new(RigidBody::new_root("world"), default_gravity());
        let root_frame = mech.root_frame();

        let j1 = Joint::new("shoulder", JointKind::Revolute { axis: Vector3::z_axis() });
        let j1_before = j1.frame_before();
        let a_frame = j1.frame_after();
        let f1 = CartesianFrame3D::new();
        let mut body_a = RigidBody::new("a", a_frame, Some(unit_inertia(a_frame)));
        body_a.add_frame_definition(Transform3D::translation(
            f1,
            a_frame,
            Vector3::new(1.0, 0.0, 0.0),
        ));
        mech.attach(
            mech.root(),
            j1,
            Transform3D::identity(j1_before, root_frame),
            body_a,
            None,
        );

        let j2 = Joint::new("slide", JointKind::Prismatic { axis: Vector3::x_axis() });
        let j2_before = j2.frame_before();
        let b_frame = j2.frame_after();
        let body_b = RigidBody::new("b", b_frame, Some(unit_inertia(b_frame)));
        mech.attach(
            BodyId(1),
            j2,
            Transform3D::identity(j2_before, f1),
            body_b,
            None,
        );
        mech
    }

    #[test]
    fn index_maps_cover_q_and_v() {
        let mech = chain();
        assert_eq!(mech.num_positions(), 2);
        assert_eq!(mech.num_velocities(), 2);
        assert_eq!(mech.q_range(JointId(0)), 0..1);
        assert_eq!(mech.q_range(JointId(1)), 1..2);
        assert_eq!(mech.predecessor(JointId(1)), BodyId(1));
        assert_eq!(mech.successor(JointId(1)), BodyId(2));
    }

    #[test]
    fn path_through_lca() {
        let mech = chain();
        let path = mech.path(BodyId(2), BodyId(0));
        assert_eq!(path.num_edges(), 2);
        assert!(path
            .edges()
            .iter()
            .all(|(_, d)| *d == PathDirection::Up));

        let down = mech.path(BodyId(0), BodyId(2));
        assert!(down
            .edges()
            .iter()
            .all(|(_, d)| *d == PathDirection::Down));
        assert_eq!(down.edges()[0].0, JointId(0));
    }

    #[test]
    fn remove_fixed_joints_merges_inertia() {
        let mut mech = chain();
        let j_fix = Joint::new("mount", JointKind::Fixed);
        let fix_before = j_fix.frame_before();
        let tool_frame = j_fix.frame_after();
        let tool = RigidBody::new(
            "tool",
            tool_frame,
            Some(SpatialInertia::point_mass(
                tool_frame,
                2.0,
                &Vector3::zeros(),
            )),
        );
        let b_frame = mech.body(BodyId(2)).default_frame();
        mech.attach(
            BodyId(2),
            j_fix,
            Transform3D::translation(fix_before, b_frame, Vector3::new(0.0, 0.0, 0.3)),
            tool,
            None,
        );
        assert_eq!(mech.num_bodies(), 4);

        let (merged, map) = mech.remove_fixed_joints();
        assert_eq!(merged.num_bodies(), 3);
        assert_eq!(merged.num_velocities(), 2);
        assert_eq!(map[3], map[2]);
        let b = merged.body(map[2]);
        let inertia = b.inertia().unwrap();
        assert_relative_eq!(inertia.mass, 3.0, epsilon = 1e-12);
        // Tool mass sits 0.3 above b's origin: CoM moves up.
        assert_relative_eq!(inertia.com().z, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn submechanism_extracts_subtree() {
        let mech = chain();
        let (sub, map) = mech.submechanism(BodyId(1));
        assert_eq!(sub.num_bodies(), 2);
        assert_eq!(sub.num_velocities(), 1);
        assert_eq!(map[2], Some(BodyId(1)));
        assert_eq!(map[0], None);
        assert_eq!(sub.body(BodyId(0)).name(), "a");
    }
}
