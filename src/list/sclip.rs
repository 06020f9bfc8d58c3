//! `sclip` (§4.5.2): builds a surface's custom-clippers list from the
//! scene's relation template.
//!
//! Inverts `MINUS_INNER`/`MINUS_OUTER` relations targeting this surface
//! into an `ELEM` chain, grouping same-trnode clippers adjacently so the
//! backend can cache one transform per run (§4.5.2). Accumulator-segment
//! boundaries (`MINUS_ACCUM` in the source relation list) are derived
//! automatically from that same trnode grouping rather than read as
//! explicit markers — every trnode-group change brackets a new segment,
//! which is the condition `MINUS_ACCUM` marks in the source protocol.

use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::scene::handles::NodeHandle;
use crate::scene::node::ObjectData;
use crate::scene::relations::{Relation, RelationCode};
use slotmap::SlotMap;

/// Builds `surface`'s clippers chain, returning the list head (or `None`
/// if it has no custom clippers).
pub fn sclip(
    surface: NodeHandle,
    relations: &[Relation],
    nodes: &SlotMap<NodeHandle, ObjectData>,
    arena: &mut ElemArena,
) -> Option<ElemRef> {
    // Group relations targeting this surface by the clipper's trnode so
    // same-trnode clippers land adjacently in the emitted chain.
    let mut grouped: Vec<(Option<NodeHandle>, &Relation)> = relations
        .iter()
        .filter(|r| r.obj1 == surface && matches!(r.code, RelationCode::MinusInner | RelationCode::MinusOuter))
        .map(|r| (nodes.get(r.obj2).and_then(|n| n.trnode), r))
        .collect();
    grouped.sort_by_key(|(trnode, _)| trnode.map(|h| format!("{h:?}")).unwrap_or_default());

    if grouped.is_empty() {
        return None;
    }

    let mut head: Option<ElemRef> = None;
    let mut tail: Option<ElemRef> = None;
    let mut last_trnode: Option<Option<NodeHandle>> = None;
    let mut in_accum = false;

    let mut push = |arena: &mut ElemArena, payload: ElemPayload, head: &mut Option<ElemRef>, tail: &mut Option<ElemRef>| {
        let r = arena.alloc(payload);
        if let Some(t) = *tail {
            arena.get_mut(t).next = Some(r);
        } else {
            *head = Some(r);
        }
        *tail = Some(r);
    };

    for (trnode, rel) in grouped {
        if last_trnode.is_some() && last_trnode != Some(trnode) {
            if in_accum {
                push(arena, ElemPayload::AccumBoundary(false), &mut head, &mut tail);
                in_accum = false;
            }
            push(arena, ElemPayload::AccumBoundary(true), &mut head, &mut tail);
            in_accum = true;
        } else if last_trnode.is_none() {
            push(arena, ElemPayload::AccumBoundary(true), &mut head, &mut tail);
            in_accum = true;
        }
        last_trnode = Some(trnode);
        let inner = rel.code == RelationCode::MinusInner;
        push(
            arena,
            ElemPayload::Clipper { node: rel.obj2, inner },
            &mut head,
            &mut tail,
        );
    }
    if in_accum {
        push(arena, ElemPayload::AccumBoundary(false), &mut head, &mut tail);
    }

    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::ObjectKind;

    #[test]
    fn no_relations_gives_empty_clippers() {
        let nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let mut arena = ElemArena::new();
        let mut keys: SlotMap<NodeHandle, ()> = SlotMap::with_key();
        let surf = keys.insert(());
        let relations = [];
        assert!(sclip(surf, &relations, &nodes, &mut arena).is_none());
    }

    #[test]
    fn single_clipper_produces_bracketed_chain() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let surf = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let clipper = nodes.insert(ObjectData::new(ObjectKind::Surface));
        let mut arena = ElemArena::new();
        let relations = [Relation {
            obj1: surf,
            obj2: clipper,
            code: RelationCode::MinusOuter,
        }];
        let head = sclip(surf, &relations, &nodes, &mut arena).unwrap();
        assert!(matches!(arena.get(head).payload, ElemPayload::AccumBoundary(true)));
    }
}
