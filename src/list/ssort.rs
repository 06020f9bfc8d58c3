//! `ssort` (§4.5.6): the global hierarchical surface list, and the
//! per-target outer/inner partition built from it for reflection,
//! refraction, and camera lists.
//!
//! The source's global hlist keeps array grouping so downstream cursors
//! can pop back out of a sub-list via a back-pointer. This build flattens
//! straight to a Surface-only list: every relation-driven grouping
//! `insert` would otherwise need (§4.5.3's "node/bvnode sub-list
//! grouping... not modeled" note) is already absent from this crate's
//! `insert`, so keeping `ssort`'s hlist as a tree of Array elements would
//! have nothing for a per-target walk to recurse into. The two-cursor
//! `pto`/`pti` walk (source step 3-4) correspondingly collapses into a
//! single linear scan with an outer/inner partition decided per element.

use crate::config::OptFlags;
use crate::geom::{bbox_side, bbox_sort, BBox, ORDER_SECOND_OBSCURES};
use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::list::insert::insert;
use crate::scene::handles::NodeHandle;
use crate::scene::node::ObjectData;
use crate::scene::surface::Shape;
use glam::Vec3;
use slotmap::{SecondaryMap, SlotMap};

fn node_handle_of(payload: &ElemPayload) -> Option<NodeHandle> {
    match *payload {
        ElemPayload::Surface(h) | ElemPayload::Light { node: h, .. } => Some(h),
        ElemPayload::Array { node, .. } => Some(node),
        ElemPayload::Clipper { node, .. } => Some(node),
        ElemPayload::AccumBoundary(_) | ElemPayload::Tile(_) => None,
    }
}

/// Builds the global sorted surface list (`scene.hlist`, §4.5.6 global
/// mode): every scene surface, in `bbox_sort` order from `viewpoint`.
pub fn ssort_global(
    surfaces: impl IntoIterator<Item = NodeHandle>,
    viewpoint: Vec3,
    bboxes: &SecondaryMap<NodeHandle, BBox>,
    arena: &mut ElemArena,
) -> Option<ElemRef> {
    let mut head = None;
    for h in surfaces {
        let e = arena.alloc(ElemPayload::Surface(h));
        insert(viewpoint, bboxes, arena, &mut head, e);
    }
    head
}

/// Outer/inner partition of the surfaces visible from one target's
/// perspective (a camera, or a surface building its own reflection /
/// refraction list, §4.5.6 per-target mode).
#[derive(Debug, Clone, Default)]
pub struct SidedList {
    pub outer: Option<ElemRef>,
    pub inner: Option<ElemRef>,
}

/// Walks `hlist`, partitioning every surface other than `target` into
/// `outer`/`inner` relative to `target`'s shape.
///
/// Under `OptFlags::REMOVE`, a surface fully obscured by `target`
/// (`bbox_sort` returning `ORDER_SECOND_OBSCURES`, the source's literal
/// `6`) is dropped instead of inserted. Under `OptFlags::TWOSIDED`,
/// `bbox_side` decides which side(s) see it; otherwise every surviving
/// surface goes to `outer`.
#[allow(clippy::too_many_arguments)]
pub fn ssort_target(
    hlist: Option<ElemRef>,
    viewpoint: Vec3,
    opts: OptFlags,
    bboxes: &SecondaryMap<NodeHandle, BBox>,
    nodes: &SlotMap<NodeHandle, ObjectData>,
    shapes: &SecondaryMap<NodeHandle, Shape>,
    target: NodeHandle,
    arena: &mut ElemArena,
) -> SidedList {
    let mut sided = SidedList::default();
    let Some(target_bbox) = bboxes.get(target) else {
        return sided;
    };

    let mut cur = hlist;
    while let Some(c) = cur {
        let next = arena.get(c).next;
        let Some(handle) = node_handle_of(&arena.get(c).payload) else {
            cur = next;
            continue;
        };
        if handle == target {
            cur = next;
            continue;
        }
        let Some(b) = bboxes.get(handle) else {
            cur = next;
            continue;
        };

        if opts.contains(OptFlags::REMOVE) && bbox_sort(viewpoint, b, target_bbox, false) == ORDER_SECOND_OBSCURES {
            cur = next;
            continue;
        }

        let side = if opts.contains(OptFlags::TWOSIDED) {
            match (shapes.get(target), nodes.get(target)) {
                (Some(shape), Some(data)) => {
                    let verts: Vec<Vec3> = b.verts.iter().copied().collect();
                    let to_local = |p: Vec3| data.inv * (p - Vec3::from(data.mtx.translation));
                    bbox_side(
                        false,
                        Vec3::ZERO,
                        &verts,
                        Some(b),
                        target_bbox,
                        shape.kind.is_plane(),
                        shape.kind.is_convex(),
                        false,
                        shape.sci,
                        shape.scj,
                        to_local,
                    )
                }
                _ => 1,
            }
        } else {
            1
        };

        let e = arena.alloc(ElemPayload::Surface(handle));
        if side & 1 != 0 {
            let e_outer = if side & 2 != 0 { arena.alloc(ElemPayload::Surface(handle)) } else { e };
            insert(viewpoint, bboxes, arena, &mut sided.outer, e_outer);
        }
        if side & 2 != 0 {
            let e_inner = if side & 1 != 0 { arena.alloc(ElemPayload::Surface(handle)) } else { e };
            insert(viewpoint, bboxes, arena, &mut sided.inner, e_inner);
        }

        cur = next;
    }

    sided
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::ObjectKind;

    fn bbox_at(z: f32) -> BBox {
        BBox::from_minmax(Vec3::new(-0.1, -0.1, z - 0.1), Vec3::new(0.1, 0.1, z + 0.1))
    }

    #[test]
    fn global_build_orders_by_distance() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let near = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let far = nodes.insert(ObjectData::new(ObjectKind::Surface));

        let mut bboxes: SecondaryMap<NodeHandle, BBox> = SecondaryMap::new();
        bboxes.insert(near, bbox_at(1.0));
        bboxes.insert(far, bbox_at(5.0));

        let mut arena = ElemArena::new();
        let head = ssort_global([far, near], Vec3::ZERO, &bboxes, &mut arena).unwrap();
        assert!(matches!(arena.get(head).payload, ElemPayload::Surface(h) if h == near));
    }

    #[test]
    fn target_excludes_itself() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let target = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let other = nodes.insert(ObjectData::new(ObjectKind::Surface));

        let mut bboxes: SecondaryMap<NodeHandle, BBox> = SecondaryMap::new();
        bboxes.insert(target, bbox_at(0.0));
        bboxes.insert(other, bbox_at(3.0));
        let shapes: SecondaryMap<NodeHandle, Shape> = SecondaryMap::new();

        let mut arena = ElemArena::new();
        let hlist = ssort_global([target, other], Vec3::ZERO, &bboxes, &mut arena);
        let sided = ssort_target(
            hlist,
            Vec3::ZERO,
            OptFlags::empty(),
            &bboxes,
            &nodes,
            &shapes,
            target,
            &mut arena,
        );
        assert!(matches!(arena.get(sided.outer.unwrap()).payload, ElemPayload::Surface(h) if h == other));
        assert!(sided.inner.is_none());
    }
}
