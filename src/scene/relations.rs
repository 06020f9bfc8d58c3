//! Relation template (§6.2): the producer-supplied tuples that drive
//! clipper-list construction (`sclip`, §4.5.2) and bvnode assignment
//! (`apply_relations`, consumed by `transform_system::update_hierarchy`).

use crate::scene::handles::NodeHandle;
use crate::scene::node::ObjectData;
use slotmap::{SlotMap, SparseSecondaryMap};

/// Relation code (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationCode {
    /// `obj2` is a child array index of `obj1` (plain hierarchy membership).
    IndexArray,
    /// `obj2` is a custom clipper removing `obj1`'s inner volume.
    MinusInner,
    /// `obj2` is a custom clipper removing `obj1`'s outer volume.
    MinusOuter,
    /// Marks the start/end of an accumulator segment in the clippers list.
    MinusAccum,
    /// `obj2` becomes `obj1`'s bvnode.
    BoundArray,
    /// Removes a previously established bvnode relation.
    UntieArray,
    /// `obj2` becomes the bvnode for a single indexed object, not a whole array.
    BoundIndex,
    /// Removes a previously established per-index bvnode relation.
    UntieIndex,
}

/// One relation tuple `(obj1, obj2, code)` from the scene description.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub obj1: NodeHandle,
    pub obj2: NodeHandle,
    pub code: RelationCode,
}

/// Scope of a `bvnode` override established by `BOUND_ARRAY`/`BOUND_INDEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvnodeOverrideKind {
    /// `BOUND_ARRAY`: propagates to `obj1`'s whole subtree (until a nested
    /// override replaces it again), mirroring how `trnode` propagates.
    Subtree,
    /// `BOUND_INDEX`: applies only to `obj1` itself.
    Index,
}

/// Per-object `bvnode` override, keyed by `obj1`, produced by
/// [`apply_relations`] and consumed by `transform_system::update_hierarchy`.
pub type BvnodeOverrides = SparseSecondaryMap<NodeHandle, (NodeHandle, BvnodeOverrideKind)>;

/// Applies the relation template (§6.2) to `nodes`, marking `BOUND_ARRAY`/
/// `BOUND_INDEX` targets as bv containers (`is_bv_container`), and returns
/// the per-object `bvnode` overrides those relations establish.
///
/// Relations are processed in order, so a later `UNTIE_ARRAY`/`UNTIE_INDEX`
/// naming the same `obj1` removes an earlier `BOUND_ARRAY`/`BOUND_INDEX`
/// override (reverting that object to the default "nearest ancestor with
/// `is_bv_container`" resolution done in `update_hierarchy`). `INDEX_ARRAY`
/// is plain hierarchy membership, already encoded directly by
/// `ObjectData::parent`/`children` when the scene is built, so it has no
/// effect here. `MINUS_INNER`/`MINUS_OUTER` are consumed by `sclip`, not
/// here; `MINUS_ACCUM` boundary markers are derived automatically by
/// `sclip`'s trnode grouping rather than read from the relation list (see
/// its module docs).
pub fn apply_relations(nodes: &mut SlotMap<NodeHandle, ObjectData>, relations: &[Relation]) -> BvnodeOverrides {
    let mut overrides: BvnodeOverrides = SparseSecondaryMap::new();
    for rel in relations {
        match rel.code {
            RelationCode::BoundArray => {
                if let Some(node) = nodes.get_mut(rel.obj2) {
                    node.is_bv_container = true;
                }
                overrides.insert(rel.obj1, (rel.obj2, BvnodeOverrideKind::Subtree));
            }
            RelationCode::BoundIndex => {
                if let Some(node) = nodes.get_mut(rel.obj2) {
                    node.is_bv_container = true;
                }
                overrides.insert(rel.obj1, (rel.obj2, BvnodeOverrideKind::Index));
            }
            RelationCode::UntieArray | RelationCode::UntieIndex => {
                overrides.remove(rel.obj1);
            }
            RelationCode::IndexArray | RelationCode::MinusInner | RelationCode::MinusOuter | RelationCode::MinusAccum => {}
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::ObjectKind;

    #[test]
    fn bound_array_marks_target_as_container_and_records_override() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let subtree_root = nodes.insert(ObjectData::new(ObjectKind::Array));
        let container = nodes.insert(ObjectData::new(ObjectKind::Array));

        let relations = [Relation {
            obj1: subtree_root,
            obj2: container,
            code: RelationCode::BoundArray,
        }];
        let overrides = apply_relations(&mut nodes, &relations);

        assert!(nodes[container].is_bv_container);
        assert_eq!(overrides.get(subtree_root), Some(&(container, BvnodeOverrideKind::Subtree)));
    }

    #[test]
    fn untie_array_removes_a_prior_bound_array_override() {
        let mut nodes: SlotMap<NodeHandle, ObjectData> = SlotMap::with_key();
        let subtree_root = nodes.insert(ObjectData::new(ObjectKind::Array));
        let container = nodes.insert(ObjectData::new(ObjectKind::Array));

        let relations = [
            Relation { obj1: subtree_root, obj2: container, code: RelationCode::BoundArray },
            Relation { obj1: subtree_root, obj2: container, code: RelationCode::UntieArray },
        ];
        let overrides = apply_relations(&mut nodes, &relations);

        assert!(overrides.get(subtree_root).is_none());
        // The container's own flag isn't retracted by an unrelated untie.
        assert!(nodes[container].is_bv_container);
    }
}
