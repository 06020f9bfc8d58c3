//! `ObjectData` (§3.1): the hot per-object record walked every frame, and
//! `ObjectKind`, the {Camera, Light, Array, Surface} variant tag.
//!
//! Grounded on the teacher's `scene/node.rs` `Node` — "only hot traversal
//! data lives on the node; component-specific state is a separate map in
//! `Scene`" — generalized from a mesh-engine's parent/children/transform
//! shape into the trnode/bvnode/axis-mapping bookkeeping this object model
//! needs.

use crate::math::AXIS_NONE;
use crate::scene::handles::NodeHandle;
use crate::scene::transform::Trm;
use bitflags::bitflags;
use glam::{Affine3A, Mat3};

bitflags! {
    /// `obj_has_trm`/`mtx_has_trm` (§3.1): does this object (or, for
    /// `obj_has_trm`, any ancestor) introduce non-trivial scale/rotation?
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TrmFlags: u8 {
        const SCL = 1 << 0;
        const ROT = 1 << 1;
    }
}

/// Per-object keyframe/procedural hook (§4.3.1 step 1), run at most once
/// per scene-instance during phase 0.5. Not a full animation/clip system —
/// callers that need tracks/blending compose it themselves.
pub trait Animator: std::fmt::Debug + Send + Sync {
    fn animate(&mut self, time: f64, trm: &mut Trm);
}

/// The {Camera, Light, Array, Surface} variant an [`ObjectData`] belongs to.
/// Kind-specific payload (camera params, light params, surface shape,
/// array child/relation lists) lives in `Scene`'s component maps, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Camera,
    Light,
    Array,
    Surface,
}

/// Every object's hot hierarchy/transform record (§3.1).
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub kind: ObjectKind,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    /// Local scale/rotation/translation.
    pub trm: Trm,
    /// World-from-local matrix.
    pub mtx: Affine3A,
    /// Upper-left 3x3 inverse of `mtx`, used by the backend for ray transform.
    pub inv: Mat3,

    pub obj_has_trm: TrmFlags,
    pub mtx_has_trm: TrmFlags,
    /// Dirty bit propagated from animator or ancestor mutation.
    pub obj_changed: bool,

    /// Trivial-transform axis mapping (`I -> X|Y|Z|W`); index 3 is the
    /// engine's reserved "W" slot and stays `AXIS_NONE` in this model,
    /// since the homogeneous-coordinate bookkeeping it served in the
    /// source has no counterpart once `mtx` is a real `Affine3A`.
    pub map: [u8; 4],
    pub sgn: [f32; 4],
    pub scl: [f32; 4],

    /// Nearest ancestor (or self) with non-trivial rotation.
    pub trnode: Option<NodeHandle>,
    /// Nearest ancestor Array acting as a bounding-volume container.
    pub bvnode: Option<NodeHandle>,
    /// Whether this Array was assigned as *someone's* bvnode via a
    /// `BOUND_ARRAY`/`BOUND_INDEX` relation (§6.2). Only meaningful for
    /// `ObjectKind::Array`.
    pub is_bv_container: bool,

    pub visible: bool,

    /// Optional keyframe/procedural hook, run at most once per instance.
    pub animator: Option<Box<dyn Animator>>,
    animator_ran: bool,
}

impl ObjectData {
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            trm: Trm::identity(),
            mtx: Affine3A::IDENTITY,
            inv: Mat3::IDENTITY,
            obj_has_trm: TrmFlags::empty(),
            mtx_has_trm: TrmFlags::empty(),
            obj_changed: true,
            map: [0, 1, 2, AXIS_NONE],
            sgn: [1.0; 4],
            scl: [1.0; 4],
            trnode: None,
            bvnode: None,
            is_bv_container: false,
            visible: true,
            animator: None,
            animator_ran: false,
        }
    }

    /// Runs this object's animator exactly once per scene-instance (§4.3.1
    /// step 1). Takes the animator out for the call so the mutable borrow of
    /// `self.trm` doesn't alias a borrow of `self.animator`.
    pub fn run_animator_once(&mut self, time: f64) {
        if self.animator_ran {
            return;
        }
        if let Some(mut animator) = self.animator.take() {
            animator.animate(time, &mut self.trm);
            self.animator = Some(animator);
        }
        self.animator_ran = true;
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    pub fn set_parent(&mut self, parent: Option<NodeHandle>) {
        self.parent = parent;
    }

    #[inline]
    pub fn push_child(&mut self, child: NodeHandle) {
        self.children.push(child);
    }

    /// `trnode == self` iff this object has non-trivial rotation (§3.1 invariant).
    #[inline]
    #[must_use]
    pub fn is_trnode_root(&self, self_handle: NodeHandle) -> bool {
        self.trnode == Some(self_handle)
    }
}
