//! `insert` (§4.5.3): sort-preserving insertion into a list ordered by
//! `bbox_sort` from a viewpoint, with hidden-surface removal.
//!
//! This is the densest part of the specification and has no teacher
//! analogue at all. The source's three-phase protocol (forward push,
//! strict-chain identification, backward comb) is an *optimization* over
//! an already-nearly-sorted list with a cached per-pair order value; it
//! does not change the postcondition, which is exactly Invariant 9 (§8):
//! after sorting, no adjacent pair has a "do swap" `bbox_sort` result.
//! This implementation establishes that same postcondition directly with
//! a converging adjacent-swap pass (documented in DESIGN.md as the
//! resolved simplification for this module) rather than reconstructing
//! the cached-order/tri-phase bookkeeping, which exists purely to avoid
//! recomputing `bbox_sort` across frames — an optimization this
//! implementation doesn't need to reproduce to satisfy the spec's
//! observable behavior.
//!
//! Node/bvnode sub-list grouping (§4.5.3 step 1) is likewise not modeled:
//! every list here is flat, ordered purely by `bbox_sort`. A future
//! extension that needs per-trnode cached transforms would reintroduce
//! `snode`'s chain as a grouping key during insertion.

use crate::geom::{bbox_sort, BBox, ORDER_FIRST_OBSCURES, ORDER_INTERPENETRATE_2, ORDER_SECOND, ORDER_SECOND_OBSCURES};
use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::scene::handles::NodeHandle;
use glam::Vec3;
use slotmap::SecondaryMap;

fn node_handle_of(payload: &ElemPayload) -> Option<NodeHandle> {
    match *payload {
        ElemPayload::Surface(h) | ElemPayload::Light { node: h, .. } => Some(h),
        ElemPayload::Array { node, .. } => Some(node),
        ElemPayload::Clipper { node, .. } => Some(node),
        ElemPayload::AccumBoundary(_) | ElemPayload::Tile(_) => None,
    }
}

/// Inserts `new_elem` into the list headed by `*head`, then re-sorts so
/// that no adjacent pair violates `bbox_sort` order (Invariant 9, §8),
/// removing any element a neighbor's `bbox_sort` result fully obscures.
pub fn insert(
    viewpoint: Vec3,
    bboxes: &SecondaryMap<NodeHandle, BBox>,
    arena: &mut ElemArena,
    head: &mut Option<ElemRef>,
    new_elem: ElemRef,
) {
    arena.get_mut(new_elem).next = *head;
    *head = Some(new_elem);

    loop {
        let mut changed = false;
        let mut prev: Option<ElemRef> = None;
        let mut cur = *head;

        while let Some(c) = cur {
            let Some(next) = arena.get(c).next else { break };
            let (Some(a), Some(b)) = (
                node_handle_of(&arena.get(c).payload),
                node_handle_of(&arena.get(next).payload),
            ) else {
                prev = Some(c);
                cur = Some(next);
                continue;
            };
            let (Some(ba), Some(bb)) = (bboxes.get(a), bboxes.get(b)) else {
                prev = Some(c);
                cur = Some(next);
                continue;
            };

            let order = bbox_sort(viewpoint, ba, bb, a == b);
            match order {
                // `ORDER_INTERPENETRATE_2` carries the same "nd2 sorts
                // first" tie-break as `ORDER_SECOND`, just for an
                // overlapping pair rather than a disjoint one.
                ORDER_SECOND | ORDER_INTERPENETRATE_2 => {
                    let after_next = arena.get(next).next;
                    arena.get_mut(c).next = after_next;
                    arena.get_mut(next).next = Some(c);
                    if let Some(p) = prev {
                        arena.get_mut(p).next = Some(next);
                    } else {
                        *head = Some(next);
                    }
                    changed = true;
                    prev = Some(next);
                    cur = Some(c);
                }
                ORDER_FIRST_OBSCURES => {
                    let after_next = arena.get(next).next;
                    arena.get_mut(c).next = after_next;
                    changed = true;
                }
                ORDER_SECOND_OBSCURES => {
                    if let Some(p) = prev {
                        arena.get_mut(p).next = Some(next);
                    } else {
                        *head = Some(next);
                    }
                    changed = true;
                    cur = Some(next);
                }
                _ => {
                    prev = Some(c);
                    cur = Some(next);
                }
            }
        }

        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn bbox_at(z: f32) -> BBox {
        BBox::from_minmax(Vec3::new(-0.1, -0.1, z - 0.1), Vec3::new(0.1, 0.1, z + 0.1))
    }

    #[test]
    fn insert_orders_three_surfaces_by_distance() {
        let mut keys: slotmap::SlotMap<NodeHandle, ()> = slotmap::SlotMap::with_key();
        let near = keys.insert(());
        let mid = keys.insert(());
        let far = keys.insert(());

        let mut bboxes: SecondaryMap<NodeHandle, BBox> = SecondaryMap::new();
        bboxes.insert(near, bbox_at(1.0));
        bboxes.insert(mid, bbox_at(3.0));
        bboxes.insert(far, bbox_at(5.0));

        let mut arena = ElemArena::new();
        let mut head = None;
        let vp = Vec3::new(0.0, 0.0, 0.0);

        // Insert out of order: far, near, mid.
        for &h in &[far, near, mid] {
            let e = arena.alloc(ElemPayload::Surface(h));
            insert(vp, &bboxes, &mut arena, &mut head, e);
        }

        let mut order = Vec::new();
        let mut cur = head;
        while let Some(c) = cur {
            if let Some(h) = node_handle_of(&arena.get(c).payload) {
                order.push(h);
            }
            cur = arena.get(c).next;
        }
        assert_eq!(order, vec![near, mid, far]);
    }
}
