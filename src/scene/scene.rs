//! `Scene` (§3.5): the object arena, relation template, and per-frame
//! output slots the list engine and backend consume.
//!
//! Grounded on the teacher's `scene/scene.rs` ECS storage discipline —
//! `SlotMap` for the hot hierarchy/transform record, `SparseSecondaryMap`
//! for payloads only some objects carry (camera/light/surface params),
//! dense `SecondaryMap` for per-surface output slots every Surface gets —
//! generalized from a mesh-engine's name/mesh/skin components to this
//! object model's camera/light/shape/material/bbox/list-output components.

use crate::geom::BBox;
use crate::list::{ElemRef, SnodeChain};
use crate::scene::camera::Camera;
use crate::scene::handles::NodeHandle;
use crate::scene::light::Light;
use crate::scene::material::Material;
use crate::scene::node::ObjectData;
use crate::scene::relations::Relation;
use crate::scene::surface::Shape;
use slotmap::{SecondaryMap, SlotMap, SparseSecondaryMap};

/// Per-surface output slots (§3.5): the four sided lists plus custom
/// clippers, tile list, and trnode/bvnode chain `snode` built once per
/// frame.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLists {
    /// `lst_p[0]` outer light, `lst_p[2]` inner light, `lst_p[1]` outer
    /// reflection/refraction, `lst_p[3]` inner reflection/refraction.
    pub lst_p: [Option<ElemRef>; 4],
    /// `msc_p[2]`: custom clippers list from `sclip`.
    pub msc_p: Option<ElemRef>,
    /// Screen tile list from `stile`.
    pub tls: Option<ElemRef>,
    /// trnode/bvnode ancestor chain from `snode`.
    pub chain: SnodeChain,
}

/// The scene: object hierarchy, per-kind payloads, the relation
/// template, and per-frame output (§3.1-3.5).
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, ObjectData>,
    pub roots: Vec<NodeHandle>,

    pub cameras: SparseSecondaryMap<NodeHandle, Camera>,
    pub lights: SparseSecondaryMap<NodeHandle, Light>,
    pub shapes: SparseSecondaryMap<NodeHandle, Shape>,
    pub materials_outer: SparseSecondaryMap<NodeHandle, Material>,
    pub materials_inner: SparseSecondaryMap<NodeHandle, Material>,

    /// Every object's current bounding box (bvbox for containers, trbox
    /// for trnode-rooted objects, inbox for clipped surfaces collapse
    /// into this single slot: this crate tracks one working box per
    /// object rather than the source's three named variants, since
    /// every predicate in this crate already takes a plain `&BBox`).
    pub bboxes: SecondaryMap<NodeHandle, BBox>,

    pub relations: Vec<Relation>,

    /// Active camera driving the per-frame render (if any).
    pub active_camera: Option<NodeHandle>,

    pub surface_lists: SecondaryMap<NodeHandle, SurfaceLists>,

    /// Global sorted surface hierarchy (`hlist`, §4.5.6).
    pub hlist: Option<ElemRef>,
    /// Filtered flat surface list (`slist`, §3.5).
    pub slist: Option<ElemRef>,
    /// Filtered flat light list (`llist`, §3.5).
    pub llist: Option<ElemRef>,
    /// Active camera's filtered surface list (`clist`, §3.5).
    pub clist: Option<ElemRef>,

    pub tiles: Vec<Option<ElemRef>>,
    pub tiles_in_row: u32,
    pub tiles_in_col: u32,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, data: ObjectData) -> NodeHandle {
        self.nodes.insert(data)
    }

    /// Attaches `child` to `parent`, registering the backlink both ways.
    /// A `parent` of `None` makes `child` a root.
    pub fn attach(&mut self, child: NodeHandle, parent: Option<NodeHandle>) {
        if let Some(p) = parent {
            if let Some(pnode) = self.nodes.get_mut(p) {
                pnode.push_child(child);
            }
        } else {
            self.roots.push(child);
        }
        if let Some(cnode) = self.nodes.get_mut(child) {
            cnode.set_parent(parent);
        }
    }

    #[must_use]
    pub fn surfaces(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.shapes.keys()
    }

    #[must_use]
    pub fn lights(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.lights.keys()
    }

    /// Releases every per-frame output slot (hierarchical and flat
    /// lists, tiles). Called at frame start before phase 0.5, so a
    /// partially built previous frame never leaks into the next one.
    pub fn clear_frame_outputs(&mut self) {
        self.hlist = None;
        self.slist = None;
        self.llist = None;
        self.clist = None;
        for lists in self.surface_lists.values_mut() {
            *lists = SurfaceLists::default();
        }
        for tile in &mut self.tiles {
            *tile = None;
        }
    }
}
