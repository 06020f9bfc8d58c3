//! `filter` (§4.5.4): hierarchical sort-order list to flat backend-ready
//! list.
//!
//! Clears the stale stored-order on Surface elements (Invariant 8, §8:
//! "every surface element has `data == 0`" after filtering), recurses
//! into Array sub-lists and records each one's last leaf, and under
//! `OptFlags::TILING` drops bvnode Arrays from the camera's list entirely
//! since tiling supersedes bvnode-based culling.

use crate::config::OptFlags;
use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::scene::handles::NodeHandle;
use crate::scene::node::ObjectData;
use slotmap::SlotMap;

/// Flattens the list headed by `head`, returning the new head (which may
/// differ from `head` if its first element was dropped).
///
/// `drop_bvnodes` should be `true` only when filtering a camera's list
/// under `OptFlags::TILING`; every other list (global `slist`, shadow
/// lists) always keeps its bvnode Arrays.
pub fn filter(
    head: Option<ElemRef>,
    arena: &mut ElemArena,
    nodes: &SlotMap<NodeHandle, ObjectData>,
    drop_bvnodes: bool,
) -> Option<ElemRef> {
    let mut new_head = None;
    let mut tail: Option<ElemRef> = None;
    let mut cur = head;

    while let Some(c) = cur {
        let next = arena.get(c).next;
        let payload = arena.get(c).payload;
        let mut keep = true;

        match payload {
            ElemPayload::Surface(_)
            | ElemPayload::Clipper { .. }
            | ElemPayload::AccumBoundary(_)
            | ElemPayload::Tile(_) => {
                let e = arena.get_mut(c);
                e.order = None;
                e.last_leaf = None;
            }
            ElemPayload::Light { node, shadow } => {
                let filtered_shadow = filter(shadow, arena, nodes, false);
                let e = arena.get_mut(c);
                e.payload = ElemPayload::Light { node, shadow: filtered_shadow };
                e.order = None;
                e.last_leaf = None;
            }
            ElemPayload::Array { node, sub } => {
                if drop_bvnodes && nodes.get(node).is_some_and(|n| n.is_bv_container) {
                    keep = false;
                } else {
                    let filtered_sub = filter(sub, arena, nodes, drop_bvnodes);
                    let leaf = last_ref(arena, filtered_sub);
                    let e = arena.get_mut(c);
                    e.payload = ElemPayload::Array { node, sub: filtered_sub };
                    e.last_leaf = leaf;
                    e.order = None;
                }
            }
        }

        if keep {
            arena.get_mut(c).next = None;
            if let Some(t) = tail {
                arena.get_mut(t).next = Some(c);
            } else {
                new_head = Some(c);
            }
            tail = Some(c);
        }
        cur = next;
    }

    new_head
}

fn last_ref(arena: &ElemArena, mut cur: Option<ElemRef>) -> Option<ElemRef> {
    let mut last = None;
    while let Some(c) = cur {
        last = Some(c);
        cur = arena.get(c).next;
    }
    last
}

/// Whether `filter` should drop bvnode Arrays for this list, per
/// `OptFlags::TILING` (§4.5.4, §4.5.8).
#[inline]
#[must_use]
pub fn drops_bvnodes_for_camera(opts: OptFlags) -> bool {
    opts.contains(OptFlags::TILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::ObjectKind;

    #[test]
    fn surface_elements_end_with_clean_order() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let surf = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let mut arena = ElemArena::new();
        let e = arena.alloc(ElemPayload::Surface(surf));
        arena.get_mut(e).order = Some(4);

        let head = filter(Some(e), &mut arena, &nodes, false);
        let h = head.unwrap();
        assert!(arena.get(h).order.is_none());
        assert!(arena.get(h).last_leaf.is_none());
    }

    #[test]
    fn array_gets_last_leaf_of_flattened_sub_list() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let array_node = nodes.insert(ObjectData::new(ObjectKind::Array));
        let leaf_a = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let leaf_b = nodes.insert(ObjectData::new(ObjectKind::Surface));

        let mut arena = ElemArena::new();
        let ea = arena.alloc(ElemPayload::Surface(leaf_a));
        let eb = arena.alloc(ElemPayload::Surface(leaf_b));
        arena.get_mut(ea).next = Some(eb);
        let array_elem = arena.alloc(ElemPayload::Array {
            node: array_node,
            sub: Some(ea),
        });

        let head = filter(Some(array_elem), &mut arena, &nodes, false).unwrap();
        assert_eq!(arena.get(head).last_leaf, Some(eb));
    }

    #[test]
    fn tiling_drops_bvnode_arrays_from_camera_list() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let mut bvnode_data = ObjectData::new(ObjectKind::Array);
        bvnode_data.is_bv_container = true;
        let bvnode = nodes.insert(bvnode_data);
        let surf = nodes.insert(ObjectData::new(ObjectKind::Surface));

        let mut arena = ElemArena::new();
        let array_elem = arena.alloc(ElemPayload::Array { node: bvnode, sub: None });
        let surf_elem = arena.alloc(ElemPayload::Surface(surf));
        arena.get_mut(array_elem).next = Some(surf_elem);

        let head = filter(Some(array_elem), &mut arena, &nodes, true).unwrap();
        assert!(matches!(arena.get(head).payload, ElemPayload::Surface(s) if s == surf));
        assert!(arena.get(head).next.is_none());
    }
}
