//! Composite Rigid Body Algorithm for the joint-space mass matrix.
//!
//! Featherstone Chapter 6: for each tree joint `i`, form the force-space
//! block `F_i = I_crb(succ_i)·S_i` in world coordinates, write the
//! diagonal block `S_iᵀ·F_i`, then walk the ancestor chain emitting the
//! off-diagonal blocks `S_jᵀ·F_i`. Only the lower triangle is written.

use nalgebra::{DMatrix, Vector3};

use crate::mechanism::JointId;
use crate::state::MechanismState;

/// Write the mass matrix `M(q)` into `out` (lower triangle only).
///
/// `M` is symmetric positive definite for well-posed mechanisms; the
/// strict upper triangle of `out` is zeroed, not mirrored.
///
/// # Panics
///
/// Panics if `out` is not `nv × nv`.
pub fn mass_matrix_into(state: &mut MechanismState, out: &mut DMatrix<f64>) {
    state.ensure_motion_subspaces();
    state.ensure_crb_inertias();
    let mechanism = state.mechanism_arc();
    let nv = mechanism.num_velocities();
    assert_eq!(out.nrows(), nv, "mass matrix rows");
    assert_eq!(out.ncols(), nv, "mass matrix cols");
    out.fill(0.0);

    // Per-joint force blocks are at most 6 columns wide.
    let mut f_block: [(Vector3<f64>, Vector3<f64>); 6] =
        [(Vector3::zeros(), Vector3::zeros()); 6];

    for i in 0..mechanism.num_tree_joints() {
        let joint_i = JointId::new(i);
        let nv_i = mechanism.joint(joint_i).num_velocities();
        if nv_i == 0 {
            continue;
        }
        let vr_i = mechanism.v_range(joint_i);
        let succ = mechanism.successor(joint_i).index();
        let crb = state.crb_inertias[succ];
        let s_i = &state.subspaces[i];

        // F_i = I_crb(succ)·S_i
        for (c, slot) in f_block.iter_mut().enumerate().take(nv_i) {
            let (a, l) = s_i.col(c);
            *slot = crb.apply(&a, &l);
        }

        // Diagonal block, lower triangle: M[r, c] = S_i[r]·F_i[c].
        for r in 0..nv_i {
            let (sa, sl) = s_i.col(r);
            for c in 0..=r {
                let (fa, fl) = f_block[c];
                out[(vr_i.start + r, vr_i.start + c)] = sa.dot(&fa) + sl.dot(&fl);
            }
        }

        // Ancestor walk: off-diagonal blocks M[v_i, v_j] = F_iᵀ·S_j.
        let mut body = mechanism.predecessor(joint_i).index();
        while body != 0 {
            let joint_j = JointId::new(body - 1);
            let nv_j = mechanism.joint(joint_j).num_velocities();
            if nv_j > 0 {
                let vr_j = mechanism.v_range(joint_j);
                let s_j = &state.subspaces[joint_j.index()];
                for c in 0..nv_j {
                    let (sa, sl) = s_j.col(c);
                    for (r, &(fa, fl)) in f_block.iter().enumerate().take(nv_i) {
                        out[(vr_i.start + r, vr_j.start + c)] = fa.dot(&sa) + fl.dot(&sl);
                    }
                }
            }
            body = mechanism
                .parent_body(crate::mechanism::BodyId::new(body))
                .map_or(0, |b| b.index());
        }
    }
}

/// Allocating form of [`mass_matrix_into`].
pub fn mass_matrix(state: &mut MechanismState) -> DMatrix<f64> {
    let nv = state.mechanism().num_velocities();
    let mut out = DMatrix::zeros(nv, nv);
    mass_matrix_into(state, &mut out);
    out
}
