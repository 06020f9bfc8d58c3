//! `lsort` (§4.5.7): builds each target's per-light outer/inner partition
//! and, for every inserted light, its per-light shadow list.
//!
//! Mirrors `ssort`'s flattened hlist-walk shape (no Array recursion,
//! same rationale documented in `ssort`'s module doc).

use crate::config::OptFlags;
use crate::geom::{bbox_shad, bbox_side, BBox};
use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::list::filter::filter;
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

/// Outer/inner per-light lists for one target, each light carrying its
/// own filtered shadow list.
#[derive(Debug, Clone, Default)]
pub struct LightSides {
    pub outer: Option<ElemRef>,
    pub inner: Option<ElemRef>,
}

/// Builds `target`'s light lists from every scene light (§4.5.7 steps 1-3).
#[allow(clippy::too_many_arguments)]
pub fn lsort_target(
    lights: impl IntoIterator<Item = NodeHandle>,
    hlist: Option<ElemRef>,
    opts: OptFlags,
    bboxes: &SecondaryMap<NodeHandle, BBox>,
    nodes: &SlotMap<NodeHandle, ObjectData>,
    shapes: &SecondaryMap<NodeHandle, Shape>,
    target: NodeHandle,
    arena: &mut ElemArena,
) -> LightSides {
    let mut sides = LightSides::default();
    let Some(target_bbox) = bboxes.get(target) else {
        return sides;
    };

    for light in lights {
        let Some(light_bbox) = bboxes.get(light) else { continue };

        let side = if opts.contains(OptFlags::TWOSIDED) {
            match (shapes.get(target), nodes.get(target)) {
                (Some(shape), Some(data)) => {
                    let verts: Vec<Vec3> = light_bbox.verts.iter().copied().collect();
                    let to_local = |p: Vec3| data.inv * (p - Vec3::from(data.mtx.translation));
                    bbox_side(
                        false,
                        Vec3::ZERO,
                        &verts,
                        Some(light_bbox),
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
        if side == 0 {
            continue;
        }

        let shadow = build_shadow_list(light, light_bbox.mid, hlist, target, opts, bboxes, arena);
        let filtered_shadow = filter(shadow, arena, nodes, false);

        if side & 1 != 0 {
            let e = arena.alloc(ElemPayload::Light {
                node: light,
                shadow: filtered_shadow,
            });
            append(arena, &mut sides.outer, e);
        }
        if side & 2 != 0 {
            let e = arena.alloc(ElemPayload::Light {
                node: light,
                shadow: filtered_shadow,
            });
            append(arena, &mut sides.inner, e);
        }
    }

    sides
}

fn append(arena: &mut ElemArena, head: &mut Option<ElemRef>, elem: ElemRef) {
    match *head {
        None => *head = Some(elem),
        Some(mut tail) => {
            while let Some(next) = arena.get(tail).next {
                tail = next;
            }
            arena.get_mut(tail).next = Some(elem);
        }
    }
}

/// Walks `hlist`, inserting every node `bbox_shad` says can shadow
/// `target` from `light`'s position (§4.5.7 step 2).
fn build_shadow_list(
    light: NodeHandle,
    light_mid: Vec3,
    hlist: Option<ElemRef>,
    target: NodeHandle,
    _opts: OptFlags,
    bboxes: &SecondaryMap<NodeHandle, BBox>,
    arena: &mut ElemArena,
) -> Option<ElemRef> {
    let mut head = None;
    let mut cur = hlist;
    while let Some(c) = cur {
        let next = arena.get(c).next;
        if let Some(handle) = node_handle_of(&arena.get(c).payload) {
            if handle != target && handle != light {
                if let (Some(nb), Some(tb)) = (bboxes.get(handle), bboxes.get(target)) {
                    if bbox_shad(light_mid, nb, tb) {
                        let e = arena.alloc(ElemPayload::Surface(handle));
                        append(arena, &mut head, e);
                    }
                }
            }
        }
        cur = next;
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ssort::ssort_global;
    use crate::scene::node::ObjectKind;

    fn bbox_at(z: f32) -> BBox {
        BBox::from_minmax(Vec3::new(-0.1, -0.1, z - 0.1), Vec3::new(0.1, 0.1, z + 0.1))
    }

    #[test]
    fn shadowing_occluder_is_inserted_into_shadow_list() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let light = nodes.insert(ObjectData::new(ObjectKind::Light));
        let target = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let occluder = nodes.insert(ObjectData::new(ObjectKind::Surface));

        let mut bboxes: SecondaryMap<NodeHandle, BBox> = SecondaryMap::new();
        bboxes.insert(light, bbox_at(10.0));
        bboxes.insert(target, bbox_at(0.0));
        bboxes.insert(occluder, bbox_at(5.0));
        let shapes: SecondaryMap<NodeHandle, Shape> = SecondaryMap::new();

        let mut arena = ElemArena::new();
        let hlist = ssort_global([target, occluder], Vec3::ZERO, &bboxes, &mut arena);

        let sides = lsort_target(
            [light],
            hlist,
            OptFlags::empty(),
            &bboxes,
            &nodes,
            &shapes,
            target,
            &mut arena,
        );
        let light_elem = sides.outer.unwrap();
        let ElemPayload::Light { shadow, .. } = arena.get(light_elem).payload else {
            panic!("expected light element");
        };
        assert!(shadow.is_some());
    }
}
