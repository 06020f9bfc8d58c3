//! Phase 0.5 (§4.3.1, sequential): top-down hierarchy walk running
//! animators, composing matrices, and detecting trivial-transform axis
//! mappings.
//!
//! Adapted from the teacher's `update_hierarchy_iterative`: an explicit
//! stack (no recursion, no stack-overflow risk on deep scenes) with the
//! same two-phase mutable/immutable borrow split (update the node, drop
//! its borrow, then borrow again immutably to read `children`).

use glam::{Affine3A, Mat3};
use slotmap::SlotMap;

use crate::errors::{debug_check, Result};
use crate::math::{detect_axis_mapping, rotation_is_trivial, scale_is_trivial, AXIS_NONE};
use crate::scene::handles::NodeHandle;
use crate::scene::node::{ObjectData, TrmFlags};
use crate::scene::relations::{BvnodeOverrideKind, BvnodeOverrides};

/// Tolerance used by the trivial-scale/trivial-rotation checks during
/// hierarchy propagation (distinct from [`crate::config::AXIS_EPS`]'s
/// axis-mapping tolerance, matching the source's separate per-check epsilons).
const TRM_EPS: f32 = 1.0e-5;

/// Walks from each root, running animators and propagating `mtx`/`trnode`/
/// `bvnode`/`map`/`sgn`/`scl` (§4.3.1). `overrides` is the `BOUND_ARRAY`/
/// `BOUND_INDEX` table from [`crate::scene::relations::apply_relations`]
/// (call it first so `is_bv_container` is current before this walk reads
/// it). `time` is forwarded to animators unchanged.
pub fn update_hierarchy(
    nodes: &mut SlotMap<NodeHandle, ObjectData>,
    roots: &[NodeHandle],
    overrides: &BvnodeOverrides,
    time: f64,
) -> Result<()> {
    let mut stack: Vec<(NodeHandle, Affine3A, Option<NodeHandle>, bool, TrmFlags, Option<NodeHandle>)> = Vec::with_capacity(64);
    for &root in roots.iter().rev() {
        stack.push((root, Affine3A::IDENTITY, None, true, TrmFlags::empty(), None));
    }

    while let Some((handle, parent_mtx, parent_trnode, parent_changed, parent_has_trm, parent_bvnode)) = stack.pop() {
        let (world, trnode, changed, has_trm, bvnode_for_children) = {
            let Some(node) = nodes.get_mut(handle) else {
                continue;
            };

            node.run_animator_once(time);
            let local_changed = node.trm.update_local_matrix();

            let scale_trivial = scale_is_trivial(node.trm.scale, TRM_EPS);
            let rotation_trivial = rotation_is_trivial(node.trm.rotation_deg, TRM_EPS);
            node.mtx_has_trm = TrmFlags::empty();
            if !scale_trivial {
                node.mtx_has_trm |= TrmFlags::SCL;
            }
            if !rotation_trivial {
                node.mtx_has_trm |= TrmFlags::ROT;
            }
            node.obj_has_trm = node.mtx_has_trm | parent_has_trm;

            let changed = local_changed || parent_changed;
            if changed {
                node.mtx = parent_mtx * node.trm.local_matrix();
            }
            node.obj_changed = changed;

            let trnode = if rotation_trivial {
                // Step 3: trivial rotation — inherit the ancestor trnode,
                // or self if this is a root with no trnode above it.
                let inherited = parent_trnode.unwrap_or(handle);
                let mapping = detect_axis_mapping(Mat3::from(node.mtx.matrix3));
                if mapping.trivial {
                    node.map = [mapping.map[0], mapping.map[1], mapping.map[2], AXIS_NONE];
                    node.sgn = [mapping.sgn[0], mapping.sgn[1], mapping.sgn[2], 1.0];
                    node.scl = [mapping.scl[0], mapping.scl[1], mapping.scl[2], 1.0];
                } else {
                    node.map = [AXIS_NONE; 4];
                }
                inherited
            } else {
                // Step 4: non-trivial rotation — this object becomes its own trnode.
                node.map = [AXIS_NONE; 4];
                handle
            };
            node.trnode = Some(trnode);
            let mat3 = Mat3::from(node.mtx.matrix3);
            node.inv = mat3.inverse();
            debug_check(
                (mat3 * node.inv).abs_diff_eq(Mat3::IDENTITY, 1.0e-3),
                format!("mtx/inv product isn't the identity for {handle:?}"),
            )?;

            // `bvnode`: an explicit `BOUND_ARRAY`/`BOUND_INDEX` override
            // wins outright; otherwise inherit the nearest ancestor whose
            // `is_bv_container` is set (never self — a container is always
            // an ancestor, per §3.1's `bvnode.bvnode != self` invariant).
            let override_entry = overrides.get(handle).copied();
            node.bvnode = match override_entry {
                Some((target, _)) => Some(target),
                None => parent_bvnode,
            };
            debug_check(
                node.bvnode != Some(handle),
                format!("{handle:?} was assigned itself as its own bvnode"),
            )?;
            let bvnode_for_children = match override_entry {
                Some((target, BvnodeOverrideKind::Subtree)) => Some(target),
                _ if node.is_bv_container => Some(handle),
                _ => parent_bvnode,
            };

            (node.mtx, trnode, changed, node.obj_has_trm, bvnode_for_children)
        };

        if let Some(node) = nodes.get(handle) {
            for &child in node.children.iter().rev() {
                stack.push((child, world, Some(trnode), changed, has_trm, bvnode_for_children));
            }
        }
    }
    Ok(())
}
