//! Mechanism state: configuration, velocity, and lazily updated caches.
//!
//! [`MechanismState`] is the dynamic counterpart to the immutable
//! [`Mechanism`]: `q`, `v`, and the contact state `s` are the only state
//! variables; everything else (world transforms, twists, bias
//! accelerations, world motion subspaces, composite inertias) is computed
//! from them on demand. Each cache carries a dirty bit:
//! [`set_configuration`](MechanismState::set_configuration) invalidates
//! everything, [`set_velocity`](MechanismState::set_velocity) only the
//! velocity-dependent caches. All cache storage is preallocated; updates
//! are allocation-free.

use std::sync::Arc;

use nalgebra::DVector;
use rand::Rng;

use mech_spatial::{
    CartesianFrame3D, GeometricJacobian, SpatialAcceleration, SpatialInertia, Transform3D, Twist,
};

use crate::mechanism::{BodyId, JointId, Mechanism};
use crate::path::TreePath;

/// Dynamic state of a mechanism plus its derived caches.
pub struct MechanismState {
    pub(crate) mechanism: Arc<Mechanism>,
    pub(crate) q: DVector<f64>,
    pub(crate) v: DVector<f64>,
    /// Contact states, laid out per (body, point, half-space); see
    /// [`crate::contact_dynamics`].
    pub(crate) s: DVector<f64>,

    root_frame: CartesianFrame3D,

    // Per-body caches (index = topological position).
    pub(crate) transforms_to_root: Vec<Transform3D>,
    pub(crate) twists: Vec<Twist>,
    pub(crate) biases: Vec<SpatialAcceleration>,
    pub(crate) crb_inertias: Vec<SpatialInertia>,

    // Per-tree-joint caches.
    local_subspaces: Vec<GeometricJacobian>,
    pub(crate) subspaces: Vec<GeometricJacobian>,

    // Per-loop-joint tree paths (topology-only, computed once).
    pub(crate) loop_paths: Vec<TreePath>,

    transforms_dirty: bool,
    twists_dirty: bool,
    biases_dirty: bool,
    subspaces_dirty: bool,
    crb_dirty: bool,
}

impl MechanismState {
    /// Create a state at the zero configuration with zero velocity.
    #[must_use]
    pub fn new(mechanism: Arc<Mechanism>) -> Self {
        let nb = mechanism.num_bodies();
        let root = mechanism.root_frame();

        let mut q = DVector::zeros(mechanism.num_positions());
        for (i, joint) in mechanism.tree_joints().iter().enumerate() {
            let range = mechanism.q_range(JointId::new(i));
            joint.zero_configuration(&mut q.as_mut_slice()[range]);
        }

        let transforms_to_root = mechanism
            .bodies()
            .iter()
            .map(|b| Transform3D::identity(b.default_frame(), root))
            .collect();
        let twists = mechanism
            .bodies()
            .iter()
            .map(|b| Twist::zero(b.default_frame(), root, root))
            .collect();
        let biases = mechanism
            .bodies()
            .iter()
            .map(|b| SpatialAcceleration::zero(b.default_frame(), root, root))
            .collect();
        let crb_inertias = vec![SpatialInertia::zero(root); nb];

        let local_subspaces: Vec<_> = mechanism
            .tree_joints()
            .iter()
            .map(crate::joint::Joint::motion_subspace)
            .collect();
        let subspaces = (0..mechanism.num_tree_joints())
            .map(|i| {
                let id = JointId::new(i);
                GeometricJacobian::zeros(
                    mechanism.body(mechanism.successor(id)).default_frame(),
                    mechanism.body(mechanism.predecessor(id)).default_frame(),
                    root,
                    mechanism.joint(id).num_velocities(),
                )
            })
            .collect();

        let loop_paths = mechanism
            .loop_joints()
            .iter()
            .map(|lj| mechanism.path(lj.predecessor, lj.successor))
            .collect();

        let s = DVector::zeros(mechanism.num_contact_states());
        let v = DVector::zeros(mechanism.num_velocities());

        Self {
            mechanism,
            q,
            v,
            s,
            root_frame: root,
            transforms_to_root,
            twists,
            biases,
            crb_inertias,
            local_subspaces,
            subspaces,
            loop_paths,
            transforms_dirty: true,
            twists_dirty: true,
            biases_dirty: true,
            subspaces_dirty: true,
            crb_dirty: true,
        }
    }

    /// The mechanism this state belongs to.
    #[must_use]
    pub fn mechanism(&self) -> &Mechanism {
        &self.mechanism
    }

    /// Shared handle to the mechanism.
    #[must_use]
    pub fn mechanism_arc(&self) -> Arc<Mechanism> {
        Arc::clone(&self.mechanism)
    }

    /// The root (world) frame.
    #[must_use]
    pub fn root_frame(&self) -> CartesianFrame3D {
        self.root_frame
    }

    // ------------------------------------------------------------------
    // State variables
    // ------------------------------------------------------------------

    /// Current configuration vector.
    #[must_use]
    pub fn configuration(&self) -> &DVector<f64> {
        &self.q
    }

    /// Current velocity vector.
    #[must_use]
    pub fn velocity(&self) -> &DVector<f64> {
        &self.v
    }

    /// Current contact state vector.
    #[must_use]
    pub fn contact_state(&self) -> &DVector<f64> {
        &self.s
    }

    /// Overwrite the configuration. Quaternions are renormalized on
    /// ingress; all position-dependent caches are invalidated.
    ///
    /// # Panics
    ///
    /// Panics if `q.len() != num_positions()`.
    pub fn set_configuration(&mut self, q: &[f64]) {
        assert_eq!(
            q.len(),
            self.mechanism.num_positions(),
            "configuration vector length"
        );
        self.q.as_mut_slice().copy_from_slice(q);
        let mechanism = Arc::clone(&self.mechanism);
        for (i, joint) in mechanism.tree_joints().iter().enumerate() {
            let range = mechanism.q_range(JointId::new(i));
            joint.normalize_configuration(&mut self.q.as_mut_slice()[range]);
        }
        self.invalidate_position_caches();
    }

    /// Overwrite the velocity; invalidates the velocity-dependent caches
    /// only.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != num_velocities()`.
    pub fn set_velocity(&mut self, v: &[f64]) {
        assert_eq!(
            v.len(),
            self.mechanism.num_velocities(),
            "velocity vector length"
        );
        self.v.as_mut_slice().copy_from_slice(v);
        self.invalidate_velocity_caches();
    }

    /// Overwrite the contact state vector.
    ///
    /// # Panics
    ///
    /// Panics if the length does not match.
    pub fn set_contact_state(&mut self, s: &[f64]) {
        assert_eq!(s.len(), self.s.len(), "contact state vector length");
        self.s.as_mut_slice().copy_from_slice(s);
    }

    /// Configuration slice of one joint.
    #[must_use]
    pub fn joint_configuration(&self, joint: JointId) -> &[f64] {
        &self.q.as_slice()[self.mechanism.q_range(joint)]
    }

    /// Velocity slice of one joint.
    #[must_use]
    pub fn joint_velocity(&self, joint: JointId) -> &[f64] {
        &self.v.as_slice()[self.mechanism.v_range(joint)]
    }

    /// Overwrite one joint's configuration.
    pub fn set_joint_configuration(&mut self, joint: JointId, q: &[f64]) {
        let range = self.mechanism.q_range(joint);
        assert_eq!(q.len(), range.len(), "joint configuration length");
        self.q.as_mut_slice()[range.clone()].copy_from_slice(q);
        let mechanism = Arc::clone(&self.mechanism);
        mechanism
            .joint(joint)
            .normalize_configuration(&mut self.q.as_mut_slice()[range]);
        self.invalidate_position_caches();
    }

    /// Overwrite one joint's velocity.
    pub fn set_joint_velocity(&mut self, joint: JointId, v: &[f64]) {
        let range = self.mechanism.v_range(joint);
        assert_eq!(v.len(), range.len(), "joint velocity length");
        self.v.as_mut_slice()[range].copy_from_slice(v);
        self.invalidate_velocity_caches();
    }

    /// Reset every joint to its zero configuration and zero the velocity.
    pub fn zero(&mut self) {
        let mechanism = Arc::clone(&self.mechanism);
        for (i, joint) in mechanism.tree_joints().iter().enumerate() {
            let range = mechanism.q_range(JointId::new(i));
            joint.zero_configuration(&mut self.q.as_mut_slice()[range]);
        }
        self.v.fill(0.0);
        self.s.fill(0.0);
        self.invalidate_position_caches();
    }

    /// Randomize the configuration.
    pub fn rand_configuration<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mechanism = Arc::clone(&self.mechanism);
        for (i, joint) in mechanism.tree_joints().iter().enumerate() {
            let range = mechanism.q_range(JointId::new(i));
            joint.rand_configuration(&mut self.q.as_mut_slice()[range], rng);
        }
        self.invalidate_position_caches();
    }

    /// Randomize the velocity (componentwise uniform in `[-1, 1)`).
    pub fn rand_velocity<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for slot in self.v.iter_mut() {
            *slot = rng.gen_range(-1.0..1.0);
        }
        self.invalidate_velocity_caches();
    }

    /// Map the current velocity to the configuration derivative `q̇`.
    ///
    /// # Panics
    ///
    /// Panics if `q_dot.len() != num_positions()`.
    pub fn configuration_derivative(&self, q_dot: &mut [f64]) {
        assert_eq!(
            q_dot.len(),
            self.mechanism.num_positions(),
            "q̇ vector length"
        );
        for (i, joint) in self.mechanism.tree_joints().iter().enumerate() {
            let id = JointId::new(i);
            let qr = self.mechanism.q_range(id);
            let vr = self.mechanism.v_range(id);
            joint.velocity_to_configuration_derivative(
                &self.q.as_slice()[qr.clone()],
                &self.v.as_slice()[vr],
                &mut q_dot[qr],
            );
        }
    }

    fn invalidate_position_caches(&mut self) {
        self.transforms_dirty = true;
        self.twists_dirty = true;
        self.biases_dirty = true;
        self.subspaces_dirty = true;
        self.crb_dirty = true;
    }

    fn invalidate_velocity_caches(&mut self) {
        self.twists_dirty = true;
        self.biases_dirty = true;
    }

    // ------------------------------------------------------------------
    // Cache updates (topological passes)
    // ------------------------------------------------------------------

    /// Bring the transforms-to-root cache up to date.
    pub(crate) fn ensure_transforms(&mut self) {
        if !self.transforms_dirty {
            return;
        }
        let mechanism = Arc::clone(&self.mechanism);
        for k in 1..mechanism.num_bodies() {
            let joint_id = JointId::new(k - 1);
            let joint = mechanism.joint(joint_id);
            let parent = mechanism.predecessor(joint_id).index();
            let before_to_parent = mechanism
                .body(BodyId::new(parent))
                .frame_definition(joint.frame_before());
            let joint_transform =
                joint.joint_transform(&self.q.as_slice()[mechanism.q_range(joint_id)]);
            self.transforms_to_root[k] =
                self.transforms_to_root[parent] * before_to_parent * joint_transform;
        }
        self.transforms_dirty = false;
    }

    /// Bring the twists-with-respect-to-world cache up to date.
    pub(crate) fn ensure_twists(&mut self) {
        self.ensure_transforms();
        if !self.twists_dirty {
            return;
        }
        let mechanism = Arc::clone(&self.mechanism);
        for k in 1..mechanism.num_bodies() {
            let joint_id = JointId::new(k - 1);
            let joint = mechanism.joint(joint_id);
            let parent = mechanism.predecessor(joint_id).index();
            let joint_twist = joint
                .joint_twist(
                    &self.q.as_slice()[mechanism.q_range(joint_id)],
                    &self.v.as_slice()[mechanism.v_range(joint_id)],
                )
                .transform(&self.transforms_to_root[k]);
            // frame_before is rigid on the parent: relabel and chain.
            let parent_twist = self.twists[parent];
            self.twists[k] = Twist::new(
                mechanism.body(BodyId::new(k)).default_frame(),
                self.root_frame,
                self.root_frame,
                parent_twist.angular + joint_twist.angular,
                parent_twist.linear + joint_twist.linear,
            );
        }
        self.twists_dirty = false;
    }

    /// Bring the bias-acceleration cache up to date.
    ///
    /// Joint bias terms vanish for every kind here (constant subspaces in
    /// `frame_after`), leaving the velocity-product term
    /// `v_parent ×ₘ v_joint`.
    pub(crate) fn ensure_bias_accelerations(&mut self) {
        self.ensure_twists();
        if !self.biases_dirty {
            return;
        }
        let mechanism = Arc::clone(&self.mechanism);
        for k in 1..mechanism.num_bodies() {
            let parent = mechanism.predecessor(JointId::new(k - 1)).index();
            let parent_twist = self.twists[parent];
            let joint_twist_ang = self.twists[k].angular - parent_twist.angular;
            let joint_twist_lin = self.twists[k].linear - parent_twist.linear;
            let cross_ang = parent_twist.angular.cross(&joint_twist_ang);
            let cross_lin = parent_twist.angular.cross(&joint_twist_lin)
                + parent_twist.linear.cross(&joint_twist_ang);
            let parent_bias = self.biases[parent];
            self.biases[k] = SpatialAcceleration::new(
                mechanism.body(BodyId::new(k)).default_frame(),
                self.root_frame,
                self.root_frame,
                parent_bias.angular + cross_ang,
                parent_bias.linear + cross_lin,
            );
        }
        self.biases_dirty = false;
    }

    /// Bring the motion-subspaces-in-world cache up to date.
    pub(crate) fn ensure_motion_subspaces(&mut self) {
        self.ensure_transforms();
        if !self.subspaces_dirty {
            return;
        }
        for j in 0..self.mechanism.num_tree_joints() {
            let body = j + 1;
            let t = &self.transforms_to_root[body];
            let local = &self.local_subspaces[j];
            let world = &mut self.subspaces[j];
            for c in 0..local.cols() {
                let (a, l) = local.col(c);
                let ang = t.rot * a;
                let lin = t.rot * l + t.trans.cross(&ang);
                world.set_col(c, &ang, &lin);
            }
        }
        self.subspaces_dirty = false;
    }

    /// Bring the composite-rigid-body inertia cache up to date.
    pub(crate) fn ensure_crb_inertias(&mut self) {
        self.ensure_transforms();
        if !self.crb_dirty {
            return;
        }
        let mechanism = Arc::clone(&self.mechanism);
        let n = mechanism.num_bodies();
        for k in 0..n {
            self.crb_inertias[k] = match mechanism.body(BodyId::new(k)).inertia() {
                Some(inertia) => inertia.transform(&self.transforms_to_root[k]),
                None => SpatialInertia::zero(self.root_frame),
            };
        }
        // Reverse topological pass: accumulate children into parents.
        for k in (1..n).rev() {
            let parent = mechanism.predecessor(JointId::new(k - 1)).index();
            let child = self.crb_inertias[k];
            self.crb_inertias[parent] += child;
        }
        self.crb_dirty = false;
    }

    /// Bring every position- and velocity-dependent cache up to date.
    pub(crate) fn ensure_all(&mut self) {
        self.ensure_transforms();
        self.ensure_twists();
        self.ensure_bias_accelerations();
        self.ensure_motion_subspaces();
        self.ensure_crb_inertias();
    }

    // ------------------------------------------------------------------
    // Cached getters
    // ------------------------------------------------------------------

    /// Transform from `body`'s default frame to the root frame.
    pub fn transform_to_root(&mut self, body: BodyId) -> Transform3D {
        self.ensure_transforms();
        self.transforms_to_root[body.index()]
    }

    /// Twist of `body` with respect to the world, expressed in the root
    /// frame.
    pub fn twist_wrt_world(&mut self, body: BodyId) -> Twist {
        self.ensure_twists();
        self.twists[body.index()]
    }

    /// Bias (velocity-product) acceleration of `body` with respect to the
    /// world, expressed in the root frame.
    pub fn bias_acceleration(&mut self, body: BodyId) -> SpatialAcceleration {
        self.ensure_bias_accelerations();
        self.biases[body.index()]
    }

    /// Motion subspace of `joint` expressed in the root frame.
    pub fn motion_subspace_in_world(&mut self, joint: JointId) -> &GeometricJacobian {
        self.ensure_motion_subspaces();
        &self.subspaces[joint.index()]
    }

    /// Composite-rigid-body inertia of `body`'s subtree, in the root frame.
    pub fn crb_inertia(&mut self, body: BodyId) -> SpatialInertia {
        self.ensure_crb_inertias();
        self.crb_inertias[body.index()]
    }
}
